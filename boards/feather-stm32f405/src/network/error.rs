#![deny(unsafe_code)]
#![deny(warnings)]
//! Network error types

use defmt::Format;

/// WiFi session and transport errors
#[derive(Debug, Clone, Copy, Format)]
pub enum NetworkError {
    /// esp-hosted co-processor did not come up
    WifiInitFailed,
    /// Association rejected (unknown SSID, wrong passphrase)
    AssociationFailed,
    /// Association did not finish within the join timeout
    JoinTimeout,
    /// No DHCP lease within the DHCP timeout
    DhcpTimeout,
    /// Name resolution (DNS or mDNS) failed
    DnsError,
    /// Socket connect/read/write error
    SocketError,
    /// TCP connect did not finish in time
    Timeout,
}

impl core::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::WifiInitFailed => write!(f, "WiFi co-processor init failed"),
            Self::AssociationFailed => write!(f, "WiFi association failed"),
            Self::JoinTimeout => write!(f, "WiFi join timeout"),
            Self::DhcpTimeout => write!(f, "DHCP timeout"),
            Self::DnsError => write!(f, "Name resolution failed"),
            Self::SocketError => write!(f, "Socket error"),
            Self::Timeout => write!(f, "Connect timeout"),
        }
    }
}

// Implement core::error::Error for no_std compatibility
impl core::error::Error for NetworkError {}

impl embedded_io_async::Error for NetworkError {
    fn kind(&self) -> embedded_io_async::ErrorKind {
        match self {
            Self::SocketError => embedded_io_async::ErrorKind::BrokenPipe,
            Self::Timeout | Self::JoinTimeout | Self::DhcpTimeout => {
                embedded_io_async::ErrorKind::TimedOut
            }
            Self::AssociationFailed => embedded_io_async::ErrorKind::ConnectionRefused,
            _ => embedded_io_async::ErrorKind::Other,
        }
    }
}
