#![deny(unsafe_code)]
#![deny(warnings)]
//! WiFi session over the esp-hosted co-processor
//!
//! The co-processor is initialized lazily on the first join so a device
//! without credentials never powers the radio up.

use core::net::Ipv4Addr;

use defmt::{info, warn, Debug2Format};
use embassy_net::dns::DnsQueryType;
use embassy_net::{IpAddress, Stack};
use embassy_net_esp_hosted::Control;
use embassy_time::{with_timeout, Duration};
use hal_abstractions::NetworkSession;

use super::config::WifiConfig;
use super::error::NetworkError;
use super::manager;

/// mDNS multicast group, needed to receive `.local` answers
const MDNS_GROUP: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);

pub struct WifiSession<'a> {
    control: Control<'a>,
    stack: Stack<'a>,
    config: WifiConfig,
    initialized: bool,
    /// Set once a connect was issued, so a timed-out join is still left
    associated: bool,
}

impl<'a> WifiSession<'a> {
    pub fn new(control: Control<'a>, stack: Stack<'a>, config: WifiConfig) -> Self {
        Self {
            control,
            stack,
            config,
            initialized: false,
            associated: false,
        }
    }

    async fn ensure_initialized(&mut self) -> Result<(), NetworkError> {
        if self.initialized {
            return Ok(());
        }
        with_timeout(
            Duration::from_millis(self.config.init_timeout_ms),
            self.control.init(),
        )
        .await
        .map_err(|_| NetworkError::WifiInitFailed)?
        .map_err(|e| {
            warn!("esp-hosted init failed: {:?}", Debug2Format(&e));
            NetworkError::WifiInitFailed
        })?;
        self.initialized = true;
        Ok(())
    }
}

impl NetworkSession for WifiSession<'_> {
    type Error = NetworkError;

    async fn join(&mut self, ssid: &str, passphrase: &str) -> Result<(), NetworkError> {
        self.ensure_initialized().await?;

        info!("Joining WiFi network {}", ssid);
        self.associated = true;
        with_timeout(
            Duration::from_millis(self.config.join_timeout_ms),
            self.control.connect(ssid, passphrase),
        )
        .await
        .map_err(|_| NetworkError::JoinTimeout)?
        .map_err(|e| {
            warn!("Association failed: {:?}", Debug2Format(&e));
            NetworkError::AssociationFailed
        })?;

        with_timeout(
            Duration::from_millis(self.config.dhcp_timeout_ms),
            manager::wait_for_lease(&self.stack),
        )
        .await
        .map_err(|_| NetworkError::DhcpTimeout)?;

        if let Err(e) = self.stack.join_multicast_group(MDNS_GROUP) {
            warn!("mDNS group join failed: {:?}", Debug2Format(&e));
        }
        Ok(())
    }

    async fn resolve(&mut self, host: &str) -> Result<Ipv4Addr, NetworkError> {
        let addresses = with_timeout(
            Duration::from_millis(self.config.resolve_timeout_ms),
            self.stack.dns_query(host, DnsQueryType::A),
        )
        .await
        .map_err(|_| {
            warn!("Lookup of {} timed out", host);
            NetworkError::DnsError
        })?
        .map_err(|e| {
                warn!("Lookup of {} failed: {:?}", host, e);
                NetworkError::DnsError
            })?;

        match addresses.first() {
            Some(IpAddress::Ipv4(address)) => Ok(*address),
            #[allow(unreachable_patterns)]
            _ => Err(NetworkError::DnsError),
        }
    }

    async fn leave(&mut self) {
        if !self.associated {
            return;
        }
        self.associated = false;
        match with_timeout(
            Duration::from_millis(self.config.leave_timeout_ms),
            self.control.disconnect(),
        )
        .await
        {
            Ok(Ok(())) => info!("WiFi disconnected"),
            Ok(Err(e)) => warn!("WiFi disconnect failed: {:?}", Debug2Format(&e)),
            Err(_) => warn!("WiFi disconnect timed out"),
        }
    }
}
