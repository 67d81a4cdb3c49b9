#![deny(warnings)]
//! Network module: WiFi session and TCP transport
//!
//! - **`config`**: timeouts and stack seed with `Default` implementations
//! - **`error`**: error enum shared by the session and the transport
//! - **`manager`**: DHCP lease wait and logging
//! - **`radio`**: esp-hosted co-processor bring-up on SPI2
//! - **`socket`**: async TCP socket wrapper and the `Transport` impl
//! - **`wifi`**: `NetworkSession` impl on the esp-hosted control handle
//!
//! The presence logic in `presence-core` only sees the `hal-abstractions`
//! traits; everything embassy-net specific stays here.

pub mod config;
pub mod error;
pub mod manager;
pub mod radio;
pub mod socket;
pub mod wifi;

pub use config::{NetworkConfig, SinkTransportConfig, WifiConfig};
pub use socket::TcpTransport;
pub use wifi::WifiSession;
