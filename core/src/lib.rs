//! Platform-agnostic core logic for the presence sensor firmware
//!
//! This crate holds everything that decides *what* the device does on a wake:
//! sample the occupancy pin, compare with the last reported state, deliver a
//! line-protocol point to InfluxDB with retry-until-success, and pick the next
//! wake source. It has NO hardware dependencies; boards plug in through the
//! traits in `hal-abstractions`.
//!
//! ## Modules
//! - **`config`**: settings document parsing and the immutable `Config`
//! - **`occupancy`**: `OccupancyState` and `LastReported`
//! - **`retained`**: last reported state in retained memory
//! - **`line_protocol`** / **`http`**: wire format of the write request
//! - **`reporter`**: one join/resolve/send/leave delivery
//! - **`wake`**: wake source selection
//! - **`machine`**: the per-wake state machine

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]
#![deny(warnings)]

#[macro_use]
mod fmt;

pub mod config;
pub mod error;
pub mod http;
pub mod line_protocol;
pub mod machine;
pub mod occupancy;
pub mod reporter;
pub mod retained;
pub mod wake;

#[cfg(test)]
mod testing;

pub use config::{Config, ConfigError, SinkTarget};
pub use error::ReportError;
pub use machine::{CycleOutcome, CycleSummary, MachineConfig, PresenceMachine, ReportMode};
pub use occupancy::{LastReported, OccupancyState};
pub use reporter::{Delivery, Reporter};
pub use retained::RetainedState;
pub use wake::WakePolicy;
