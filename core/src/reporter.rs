//! Reporter: delivers one presence point to the sink
//!
//! A report is a full radio session: join, resolve, send, leave. The session
//! is left on every path once a join was attempted so the radio never stays
//! powered into deep sleep.

use core::net::{Ipv4Addr, SocketAddrV4};
use core::str::FromStr;

use hal_abstractions::{NetworkSession, Transport};

use crate::config::{Config, SinkTarget};
use crate::error::ReportError;
use crate::http;
use crate::line_protocol::presence_line;
use crate::occupancy::OccupancyState;

/// Response bytes kept for status parsing; the body is not needed
const RESPONSE_BUF_LEN: usize = 128;

/// Outcome of a delivered write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Delivery {
    /// HTTP status of the sink's answer, when one was read
    pub status: Option<u16>,
}

/// Sends presence points over a [`NetworkSession`] and [`Transport`]
pub struct Reporter<'a, N, T> {
    config: &'a Config,
    device_id: &'a str,
    session: N,
    transport: T,
}

impl<'a, N, T> Reporter<'a, N, T>
where
    N: NetworkSession,
    T: Transport,
{
    /// `device_id` is the stable per-device tag value
    pub fn new(config: &'a Config, device_id: &'a str, session: N, transport: T) -> Self {
        Self {
            config,
            device_id,
            session,
            transport,
        }
    }

    /// Report `state` once
    pub async fn report(&mut self, state: OccupancyState) -> Result<Delivery, ReportError> {
        if !self.config.has_credentials() {
            debug!("No WiFi credentials configured");
            return Err(ReportError::Connectivity);
        }

        let result = self.deliver(state).await;
        self.session.leave().await;
        result
    }

    async fn deliver(&mut self, state: OccupancyState) -> Result<Delivery, ReportError> {
        self.session
            .join(self.config.ssid.as_str(), self.config.psk.as_str())
            .await
            .map_err(|_| ReportError::Connectivity)?;

        let address = self.resolve_sink().await?;
        let remote = SocketAddrV4::new(address, self.config.sink_port);

        let path = http::write_path(self.config.db_name.as_str()).map_err(|_| ReportError::Send)?;
        let body = presence_line(self.config.measurement.as_str(), self.device_id, state)
            .map_err(|_| ReportError::Send)?;
        let request =
            http::post_request(remote, path.as_str(), body.as_str()).map_err(|_| ReportError::Send)?;

        if let Ok(url) = http::sink_url(remote, path.as_str()) {
            info!("POST {} <- {}", url.as_str(), body.as_str());
        }

        let mut response = [0u8; RESPONSE_BUF_LEN];
        let received = self
            .transport
            .exchange(remote, request.as_bytes(), &mut response)
            .await
            .map_err(|_| ReportError::Send)?;

        let status = http::status_code(&response[..received.min(response.len())]);
        match status {
            Some(code) if !http::is_success(code) => {
                warn!("Sink answered {}; write counted as delivered", code)
            }
            Some(code) => debug!("Sink answered {}", code),
            None => debug!("No status line from sink"),
        }

        Ok(Delivery { status })
    }

    async fn resolve_sink(&mut self) -> Result<Ipv4Addr, ReportError> {
        let address = match self.config.sink_target() {
            SinkTarget::Name(host) => self
                .session
                .resolve(host)
                .await
                .map_err(|_| ReportError::Resolution)?,
            SinkTarget::Literal(literal) => {
                Ipv4Addr::from_str(literal).map_err(|_| ReportError::Resolution)?
            }
            SinkTarget::Unset => return Err(ReportError::Resolution),
        };

        if address.is_unspecified() {
            return Err(ReportError::Resolution);
        }
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{config_with, MockSession, MockTransport, SessionEvent};
    use embassy_futures::block_on;

    #[test]
    fn test_successful_report_sends_point_and_leaves() {
        let config = config_with("home", "pw", "", "192.168.1.20");
        let session = MockSession::new();
        let transport = MockTransport::new(b"HTTP/1.1 204 No Content\r\n\r\n");
        let mut reporter =
            Reporter::new(&config, "AA:BB:CC:DD:EE:FF", session.clone(), transport.clone());

        let delivery = block_on(reporter.report(OccupancyState::Occupied)).unwrap();

        assert_eq!(delivery.status, Some(204));
        assert_eq!(
            session.events(),
            vec![SessionEvent::Join, SessionEvent::Leave]
        );
        let sent = transport.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(
            sent[0].remote,
            SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 20), 8086)
        );
        assert!(sent[0].text.starts_with("POST /write?db=sensors HTTP/1.1\r\n"));
        assert!(sent[0].text.ends_with("\r\n\r\nroom,id=AA:BB:CC:DD:EE:FF exist=1"));
    }

    #[test]
    fn test_missing_credentials_fail_without_touching_radio() {
        let config = config_with("", "", "", "192.168.1.20");
        let session = MockSession::new();
        let transport = MockTransport::new(b"");
        let mut reporter = Reporter::new(&config, "dev", session.clone(), transport.clone());

        let result = block_on(reporter.report(OccupancyState::Vacant));

        assert_eq!(result, Err(ReportError::Connectivity));
        assert!(session.events().is_empty());
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_join_failure_still_leaves() {
        let config = config_with("home", "pw", "", "192.168.1.20");
        let session = MockSession::new();
        session.fail_joins(1);
        let mut reporter = Reporter::new(&config, "dev", session.clone(), MockTransport::new(b""));

        let result = block_on(reporter.report(OccupancyState::Occupied));

        assert_eq!(result, Err(ReportError::Connectivity));
        assert_eq!(
            session.events(),
            vec![SessionEvent::Join, SessionEvent::Leave]
        );
    }

    #[test]
    fn test_unset_sink_is_resolution_error() {
        let config = config_with("home", "pw", "", "");
        let session = MockSession::new();
        let transport = MockTransport::new(b"");
        let mut reporter = Reporter::new(&config, "dev", session.clone(), transport.clone());

        let result = block_on(reporter.report(OccupancyState::Occupied));

        assert_eq!(result, Err(ReportError::Resolution));
        assert!(transport.requests().is_empty());
        assert_eq!(session.events().last(), Some(&SessionEvent::Leave));
    }

    #[test]
    fn test_unspecified_address_rejected() {
        let config = config_with("home", "pw", "influx.local", "");
        let session = MockSession::new();
        session.resolve_to(Ipv4Addr::UNSPECIFIED);
        let transport = MockTransport::new(b"");
        let mut reporter = Reporter::new(&config, "dev", session.clone(), transport.clone());

        let result = block_on(reporter.report(OccupancyState::Occupied));

        assert_eq!(result, Err(ReportError::Resolution));
        assert!(transport.requests().is_empty());

        let literal = config_with("home", "pw", "", "0.0.0.0");
        let mut reporter = Reporter::new(&literal, "dev", MockSession::new(), transport.clone());
        assert_eq!(
            block_on(reporter.report(OccupancyState::Occupied)),
            Err(ReportError::Resolution)
        );
    }

    #[test]
    fn test_name_takes_precedence_over_literal() {
        let config = config_with("home", "pw", "influx.local", "10.0.0.9");
        let session = MockSession::new();
        session.resolve_to(Ipv4Addr::new(192, 168, 1, 77));
        let transport = MockTransport::new(b"HTTP/1.1 204 No Content\r\n");
        let mut reporter = Reporter::new(&config, "dev", session.clone(), transport.clone());

        block_on(reporter.report(OccupancyState::Vacant)).unwrap();

        assert_eq!(
            session.events(),
            vec![
                SessionEvent::Join,
                SessionEvent::Resolve("influx.local".into()),
                SessionEvent::Leave
            ]
        );
        assert_eq!(
            transport.requests()[0].remote,
            SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 77), 8086)
        );
    }

    #[test]
    fn test_failed_lookup_is_resolution_error_and_leaves() {
        let config = config_with("home", "pw", "influx.local", "");
        let session = MockSession::new();
        session.fail_resolves(1);
        let transport = MockTransport::new(b"");
        let mut reporter = Reporter::new(&config, "dev", session.clone(), transport.clone());

        let result = block_on(reporter.report(OccupancyState::Occupied));

        assert_eq!(result, Err(ReportError::Resolution));
        assert_eq!(
            session.events(),
            vec![
                SessionEvent::Join,
                SessionEvent::Resolve("influx.local".into()),
                SessionEvent::Leave
            ]
        );
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_unparseable_literal_is_resolution_error() {
        let config = config_with("home", "pw", "", "not-an-ip");
        let mut reporter = Reporter::new(&config, "dev", MockSession::new(), MockTransport::new(b""));
        assert_eq!(
            block_on(reporter.report(OccupancyState::Occupied)),
            Err(ReportError::Resolution)
        );
    }

    #[test]
    fn test_send_failure_leaves_session() {
        let config = config_with("home", "pw", "", "192.168.1.20");
        let session = MockSession::new();
        let transport = MockTransport::new(b"");
        transport.fail_sends(1);
        let mut reporter = Reporter::new(&config, "dev", session.clone(), transport.clone());

        let result = block_on(reporter.report(OccupancyState::Occupied));

        assert_eq!(result, Err(ReportError::Send));
        assert_eq!(session.events().last(), Some(&SessionEvent::Leave));
    }

    #[test]
    fn test_sink_error_status_counts_as_delivered() {
        let config = config_with("home", "pw", "", "192.168.1.20");
        let transport = MockTransport::new(b"HTTP/1.1 404 Not Found\r\n\r\ndatabase not found");
        let mut reporter = Reporter::new(&config, "dev", MockSession::new(), transport);

        let delivery = block_on(reporter.report(OccupancyState::Occupied)).unwrap();

        assert_eq!(delivery.status, Some(404));
    }

    #[test]
    fn test_silent_sink_counts_as_delivered() {
        let config = config_with("home", "pw", "", "192.168.1.20");
        let mut reporter =
            Reporter::new(&config, "dev", MockSession::new(), MockTransport::new(b""));

        let delivery = block_on(reporter.report(OccupancyState::Vacant)).unwrap();

        assert_eq!(delivery.status, None);
    }
}
