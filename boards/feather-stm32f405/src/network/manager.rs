#![deny(unsafe_code)]
#![deny(warnings)]
//! Network stack manager
//!
//! Waits for the DHCP lease on the WiFi interface and logs what it got.

use defmt::info;
use embassy_net::Stack;

/// Wait for network configuration (DHCP) and log the lease
pub async fn wait_for_lease(stack: &Stack<'_>) {
    info!("Waiting for DHCP...");
    stack.wait_config_up().await;

    let Some(config) = stack.config_v4() else {
        info!("Network is UP");
        return;
    };

    let ip = config.address.address().octets();
    info!(
        "Network is UP: {}.{}.{}.{}/{}",
        ip[0],
        ip[1],
        ip[2],
        ip[3],
        config.address.prefix_len()
    );

    if let Some(gateway) = config.gateway {
        let gw = gateway.octets();
        info!("Gateway: {}.{}.{}.{}", gw[0], gw[1], gw[2], gw[3]);
    }
    info!("DNS servers from lease: {}", config.dns_servers.len());
}
