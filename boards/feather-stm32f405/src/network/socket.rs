#![deny(unsafe_code)]
#![deny(warnings)]
//! TCP transport for the sink write
//!
//! `AsyncTcpSocket` wraps `embassy_net::tcp::TcpSocket` behind the
//! `embedded-io-async` traits; `TcpTransport` uses it for one
//! connect/send/read/close exchange per report.

use core::net::SocketAddrV4;

use defmt::{debug, warn};
use embassy_net::tcp::TcpSocket;
use embassy_net::{IpAddress, IpEndpoint, Stack};
use embassy_time::{with_timeout, Duration};
use embedded_io_async::{ErrorType, Read, Write};
use hal_abstractions::Transport;

use super::config::SinkTransportConfig;
use super::error::NetworkError;

/// Socket buffers; the request is a few hundred bytes and only the status
/// line of the answer is kept
const RX_BUFFER_SIZE: usize = 512;
const TX_BUFFER_SIZE: usize = 1024;

/// Async TCP socket wrapper implementing embedded-io-async traits
pub struct AsyncTcpSocket<'a> {
    socket: TcpSocket<'a>,
}

impl<'a> AsyncTcpSocket<'a> {
    pub fn new(stack: Stack<'a>, rx_buffer: &'a mut [u8], tx_buffer: &'a mut [u8]) -> Self {
        Self {
            socket: TcpSocket::new(stack, rx_buffer, tx_buffer),
        }
    }

    /// Inactivity timeout applied to every following read and write
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.socket.set_timeout(Some(timeout));
    }

    /// Connect to a remote endpoint
    ///
    /// # Errors
    ///
    /// Returns `NetworkError::Timeout` if the handshake does not finish in
    /// `timeout`, `NetworkError::SocketError` if it is refused
    pub async fn connect(
        &mut self,
        endpoint: IpEndpoint,
        timeout: Duration,
    ) -> Result<(), NetworkError> {
        with_timeout(timeout, self.socket.connect(endpoint))
            .await
            .map_err(|_| NetworkError::Timeout)?
            .map_err(|e| {
                warn!("TCP connect failed: {:?}", e);
                NetworkError::SocketError
            })
    }

    /// Send FIN; the socket is released when dropped
    pub fn close(&mut self) {
        self.socket.close();
    }
}

impl ErrorType for AsyncTcpSocket<'_> {
    type Error = NetworkError;
}

impl Read for AsyncTcpSocket<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        self.socket
            .read(buf)
            .await
            .map_err(|_| NetworkError::SocketError)
    }
}

impl Write for AsyncTcpSocket<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.socket
            .write(buf)
            .await
            .map_err(|_| NetworkError::SocketError)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        self.socket
            .flush()
            .await
            .map_err(|_| NetworkError::SocketError)
    }
}

/// One-shot TCP exchange over the embassy-net stack
pub struct TcpTransport<'a> {
    stack: Stack<'a>,
    config: SinkTransportConfig,
}

impl<'a> TcpTransport<'a> {
    pub fn new(stack: Stack<'a>, config: SinkTransportConfig) -> Self {
        Self { stack, config }
    }
}

impl Transport for TcpTransport<'_> {
    type Error = NetworkError;

    async fn exchange(
        &mut self,
        remote: SocketAddrV4,
        request: &[u8],
        response: &mut [u8],
    ) -> Result<usize, NetworkError> {
        let mut rx_buffer = [0u8; RX_BUFFER_SIZE];
        let mut tx_buffer = [0u8; TX_BUFFER_SIZE];
        let mut socket = AsyncTcpSocket::new(self.stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Duration::from_millis(self.config.io_timeout_ms));

        let endpoint = IpEndpoint::new(IpAddress::Ipv4(*remote.ip()), remote.port());
        socket
            .connect(
                endpoint,
                Duration::from_millis(self.config.connect_timeout_ms),
            )
            .await?;

        let io_timeout = Duration::from_millis(self.config.io_timeout_ms);
        let sent = with_timeout(io_timeout, async {
            socket.write_all(request).await?;
            socket.flush().await
        })
        .await
        .unwrap_or(Err(NetworkError::Timeout));
        if let Err(e) = sent {
            socket.close();
            return Err(e);
        }

        let mut received = 0;
        if with_timeout(io_timeout, read_answer(&mut socket, response, &mut received))
            .await
            .is_err()
        {
            debug!("Answer read timed out after {} bytes", received);
        }
        socket.close();
        Ok(received)
    }
}

/// Read until EOF, a full buffer or a read error
///
/// The write already left the device, so a missing answer is not an error.
/// `filled` stays valid when the caller's timeout drops the future midway.
async fn read_answer(socket: &mut AsyncTcpSocket<'_>, buf: &mut [u8], filled: &mut usize) {
    while *filled < buf.len() {
        match socket.read(&mut buf[*filled..]).await {
            Ok(0) => break,
            Ok(n) => *filled += n,
            Err(e) => {
                debug!("Answer read stopped: {:?}", e);
                break;
            }
        }
    }
}
