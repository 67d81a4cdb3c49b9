//! Watchdog trait

/// Hardware countdown that restarts the device when it expires
///
/// Expiry is unconditional: in-flight work is abandoned and the device boots
/// as after a reset.
pub trait Watchdog {
    /// Start the countdown, or restart it if already running
    fn arm(&mut self, timeout_ms: u32);

    /// Reset elapsed time to zero without changing the timeout
    fn kick(&mut self);
}
