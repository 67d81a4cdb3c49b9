//! Network session and transport traits
//!
//! Both traits are async and follow the same shape as the board's protocol
//! clients: the caller drives one operation at a time and the implementor
//! reports failures through its own error type instead of panicking.

use core::future::Future;
use core::net::{Ipv4Addr, SocketAddrV4};

/// Link-level session with the wireless network
///
/// A session is joined before every report and left afterwards, so the radio
/// is only powered for the duration of one delivery.
pub trait NetworkSession {
    /// Failure reported by the session
    type Error: core::fmt::Debug;

    /// Associate with the network and obtain an address
    ///
    /// Returns once the link is usable for resolution and TCP, or fails with
    /// the implementor's own association policy (timeouts, auth errors).
    fn join(
        &mut self,
        ssid: &str,
        passphrase: &str,
    ) -> impl Future<Output = Result<(), Self::Error>>;

    /// Resolve a host name to an IPv4 address
    ///
    /// Names under `.local` are expected to go through mDNS.
    fn resolve(&mut self, host: &str) -> impl Future<Output = Result<Ipv4Addr, Self::Error>>;

    /// Release the association
    ///
    /// Must be safe to call after a failed or partial `join`.
    fn leave(&mut self) -> impl Future<Output = ()>;
}

/// Request/response transport to the sink
pub trait Transport {
    /// Failure reported by the transport
    type Error: core::fmt::Debug;

    /// Connect to `remote`, send `request` in full and read whatever answer
    /// arrives into `response`
    ///
    /// Returns the number of response bytes read. Failing to read an answer
    /// after the request went out is not an error: the write is considered
    /// delivered once the request bytes are sent.
    fn exchange(
        &mut self,
        remote: SocketAddrV4,
        request: &[u8],
        response: &mut [u8],
    ) -> impl Future<Output = Result<usize, Self::Error>>;
}
