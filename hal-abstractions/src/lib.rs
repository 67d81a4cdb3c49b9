//! Hardware abstraction traits for the presence sensor firmware
//!
//! This crate defines the seams between the platform-agnostic presence logic
//! in `presence-core` and a concrete board. BSPs implement these traits:
//!
//! - **`indicator`**: local display of the sampled presence state
//! - **`network`**: WiFi session (join, resolve, leave) and the TCP transport
//!   used to deliver a single write request
//! - **`power`**: wake sources, boot kind, deep sleep entry and the retained
//!   word that survives deep sleep
//! - **`watchdog`**: the hardware countdown that restarts a hung device

#![no_std]
#![deny(unsafe_code)]
#![deny(warnings)]

pub mod indicator;
pub mod network;
pub mod power;
pub mod watchdog;

pub use indicator::PresenceIndicator;
pub use network::{NetworkSession, Transport};
pub use power::{BootKind, PowerControl, RetainedWord, WakeLevel, WakeSource};
pub use watchdog::Watchdog;
