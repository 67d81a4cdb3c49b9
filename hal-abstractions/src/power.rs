//! Power management: wake sources, boot kind and retained memory

/// Pin level that triggers a wake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeLevel {
    Low,
    High,
}

/// The single wake source armed before a deep sleep entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeSource {
    /// Wake after a fixed number of seconds
    Timer { secs: u32 },
    /// Wake when `pin` reaches `level`
    ///
    /// `pin` is the board's identifier for the sensor input.
    PinLevel { pin: u8, level: WakeLevel },
}

/// Why the firmware is running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BootKind {
    /// Power-on, pin reset or any reset the board cannot attribute
    ColdBoot,
    /// Woken from deep sleep by the armed wake source
    SleepWake,
    /// Restarted by the watchdog
    WatchdogRestart,
}

impl BootKind {
    /// Whether memory retained across deep sleep can be trusted
    pub const fn retains_state(self) -> bool {
        matches!(self, BootKind::SleepWake)
    }
}

/// One word of memory that survives deep sleep
///
/// Contents after a cold boot are unspecified; callers must validate what they
/// read.
pub trait RetainedWord {
    fn read(&self) -> u32;
    fn write(&mut self, value: u32);
}

/// Deep sleep entry
pub trait PowerControl {
    /// Arm `wake` and enter the deepest available low-power mode
    ///
    /// Execution resumes as a fresh boot, never after this call.
    fn deep_sleep(&mut self, wake: WakeSource) -> !;
}
