//! Last reported state kept in memory that survives deep sleep

use hal_abstractions::{BootKind, RetainedWord};

use crate::occupancy::{LastReported, OccupancyState};

/// [`LastReported`] stored in a [`RetainedWord`]
///
/// Retained memory is only trusted after a wake from deep sleep. Any other
/// boot (cold boot, watchdog restart) resets it to `Unknown`, so the first
/// cycle after such a boot always reports.
pub struct RetainedState<C> {
    cell: C,
}

impl<C: RetainedWord> RetainedState<C> {
    pub fn restore(mut cell: C, boot: BootKind) -> Self {
        if !boot.retains_state() {
            cell.write(LastReported::Unknown.to_word());
        }
        let state = Self { cell };
        debug!("Retained state after {}: {}", boot, state.last());
        state
    }

    pub fn last(&self) -> LastReported {
        LastReported::from_word(self.cell.read())
    }

    /// Record a successfully reported state
    pub fn record(&mut self, state: OccupancyState) {
        self.cell.write(LastReported::Known(state).to_word());
    }
}
