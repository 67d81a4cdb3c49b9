//! Local presence indicator

/// Shows the sampled state on the device itself
///
/// Only visible while awake; deep sleep turns it off.
pub trait PresenceIndicator {
    fn show(&mut self, occupied: bool);
}
