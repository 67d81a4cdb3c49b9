//! Wake source selection

use hal_abstractions::{WakeLevel, WakeSource};

use crate::occupancy::OccupancyState;

/// Re-poll interval while presence persists
pub const DEFAULT_OCCUPIED_POLL_SECS: u32 = 20;

/// Chooses the wake source for the next sleep from the current state
///
/// While occupied the device wakes on a short timer to keep sampling; while
/// vacant it sleeps until the sensor pin goes high.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct WakePolicy {
    pub occupied_poll_secs: u32,
    /// Board identifier of the sensor pin
    pub sensor_pin: u8,
}

impl WakePolicy {
    pub const fn new(sensor_pin: u8) -> Self {
        Self {
            occupied_poll_secs: DEFAULT_OCCUPIED_POLL_SECS,
            sensor_pin,
        }
    }

    pub const fn wake_for(&self, state: OccupancyState) -> WakeSource {
        match state {
            OccupancyState::Occupied => WakeSource::Timer {
                secs: self.occupied_poll_secs,
            },
            OccupancyState::Vacant => WakeSource::PinLevel {
                pin: self.sensor_pin,
                level: WakeLevel::High,
            },
        }
    }
}
