#![deny(unsafe_code)]
#![deny(warnings)]
//! Network configuration structures
//!
//! Credentials and the sink address come from the settings document; these
//! are the board-side timeouts and buffer sizes.
//!
//! Every step of a report attempt is bounded, and `budget_ms` is the sum of
//! those bounds. The watchdog is kicked once per attempt, so the combined
//! budget must stay below the watchdog timeout (checked in `main.rs`).

/// WiFi session configuration
#[derive(Debug, Clone)]
pub struct WifiConfig {
    /// Upper bound for bringing up the co-processor on the first join
    pub init_timeout_ms: u64,
    /// Upper bound for association with the access point
    pub join_timeout_ms: u64,
    /// Upper bound for obtaining a DHCP lease after association
    pub dhcp_timeout_ms: u64,
    /// Upper bound for one DNS or mDNS lookup
    pub resolve_timeout_ms: u64,
    /// Upper bound for the disconnect after each attempt
    pub leave_timeout_ms: u64,
}

impl WifiConfig {
    pub const fn new() -> Self {
        Self {
            init_timeout_ms: 2_000,
            join_timeout_ms: 8_000,
            dhcp_timeout_ms: 6_000,
            resolve_timeout_ms: 3_000,
            leave_timeout_ms: 1_000,
        }
    }

    /// Worst-case time one join/resolve/leave sequence can take
    pub const fn budget_ms(&self) -> u64 {
        self.init_timeout_ms
            + self.join_timeout_ms
            + self.dhcp_timeout_ms
            + self.resolve_timeout_ms
            + self.leave_timeout_ms
    }
}

impl Default for WifiConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// TCP transport configuration for the sink write
#[derive(Debug, Clone)]
pub struct SinkTransportConfig {
    /// Upper bound for the TCP handshake
    pub connect_timeout_ms: u64,
    /// Upper bound for sending the request, and again for reading the answer
    pub io_timeout_ms: u64,
}

impl SinkTransportConfig {
    pub const fn new() -> Self {
        Self {
            connect_timeout_ms: 3_000,
            io_timeout_ms: 2_000,
        }
    }

    /// Worst-case time of one connect/send/read exchange
    pub const fn budget_ms(&self) -> u64 {
        self.connect_timeout_ms + 2 * self.io_timeout_ms
    }
}

impl Default for SinkTransportConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Network stack configuration
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    /// Random seed for network stack
    pub seed: u64,
}

impl NetworkConfig {
    /// Seed the stack from the device UID so sensors on one network do not
    /// pick identical ephemeral ports and DHCP transaction ids
    pub fn for_device(uid: &[u8; 12]) -> Self {
        let mut seed = [0u8; 8];
        seed.copy_from_slice(&uid[..8]);
        let high = u32::from_le_bytes([uid[8], uid[9], uid[10], uid[11]]);
        Self {
            seed: u64::from_le_bytes(seed) ^ (u64::from(high) << 32),
        }
    }
}

/// Worst-case duration of one report attempt with the default configs
pub const fn attempt_budget_ms() -> u64 {
    WifiConfig::new().budget_ms() + SinkTransportConfig::new().budget_ms()
}
