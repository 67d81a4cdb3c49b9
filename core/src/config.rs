//! Settings document and the immutable configuration derived from it
//!
//! The document is a flat JSON object read once at boot:
//!
//! ```json
//! {
//!   "SSID": "home",
//!   "PSK": "secret",
//!   "influx_mdns_addr": "influx.local",
//!   "influx_ip_addr": "192.168.1.20",
//!   "influx_port": 8086,
//!   "db_name": "sensors",
//!   "measurement": "hallway"
//! }
//! ```
//!
//! Missing keys take their defaults and unknown keys are ignored. A document
//! that cannot be used at all degrades to [`Config::default`]: every network
//! operation then fails fast and the device keeps retrying until it is
//! re-provisioned.

use heapless::String;
use serde::Deserialize;

/// Default InfluxDB HTTP port
pub const DEFAULT_SINK_PORT: u16 = 8086;

pub const SSID_MAX_LEN: usize = 32;
pub const PSK_MAX_LEN: usize = 64;
pub const HOST_MAX_LEN: usize = 64;
/// Dotted-quad IPv4 literal
pub const ADDR_MAX_LEN: usize = 15;
pub const NAME_MAX_LEN: usize = 64;

/// Configuration load errors
///
/// None of these are fatal: the caller falls back to the empty configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// No document in storage, or an empty one
    Missing,
    /// Document is not a JSON object of the expected shape
    Malformed,
    /// A value does not fit its fixed-capacity field
    FieldTooLong(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Missing => write!(f, "settings document missing"),
            Self::Malformed => write!(f, "settings document malformed"),
            Self::FieldTooLong(key) => write!(f, "settings value too long: {}", key),
        }
    }
}

impl core::error::Error for ConfigError {}

/// Largest raw value accepted before the per-field limits apply
const RAW_VALUE_MAX_LEN: usize = 128;

type RawValue = String<RAW_VALUE_MAX_LEN>;

/// Raw document as stored; every key optional
///
/// Values are owned so JSON escapes (`\"`, `\\`, `\u00e9`) are decoded.
#[derive(Deserialize)]
struct SettingsDocument {
    #[serde(rename = "SSID")]
    ssid: Option<RawValue>,
    #[serde(rename = "PSK")]
    psk: Option<RawValue>,
    influx_mdns_addr: Option<RawValue>,
    influx_ip_addr: Option<RawValue>,
    influx_port: Option<u16>,
    db_name: Option<RawValue>,
    measurement: Option<RawValue>,
}

/// Where the sink lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkTarget<'a> {
    /// Host name to resolve (mDNS for `.local`)
    Name(&'a str),
    /// IPv4 literal
    Literal(&'a str),
    /// Neither configured
    Unset,
}

/// Reporting configuration, immutable after boot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub ssid: String<SSID_MAX_LEN>,
    pub psk: String<PSK_MAX_LEN>,
    pub sink_name: String<HOST_MAX_LEN>,
    pub sink_addr: String<ADDR_MAX_LEN>,
    pub sink_port: u16,
    pub db_name: String<NAME_MAX_LEN>,
    pub measurement: String<NAME_MAX_LEN>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ssid: String::new(),
            psk: String::new(),
            sink_name: String::new(),
            sink_addr: String::new(),
            sink_port: DEFAULT_SINK_PORT,
            db_name: String::new(),
            measurement: String::new(),
        }
    }
}

impl Config {
    /// Parse a settings document
    ///
    /// Only trailing whitespace is accepted after the top-level object; the
    /// caller strips storage padding first.
    pub fn from_json(document: &[u8]) -> Result<Self, ConfigError> {
        if document.iter().all(u8::is_ascii_whitespace) {
            return Err(ConfigError::Missing);
        }

        let mut unescape_scratch = [0u8; RAW_VALUE_MAX_LEN];
        let (doc, _consumed): (SettingsDocument, usize) =
            serde_json_core::from_slice_escaped(document, &mut unescape_scratch)
                .map_err(|_| ConfigError::Malformed)?;

        Ok(Self {
            ssid: copy_field("SSID", doc.ssid.as_deref())?,
            psk: copy_field("PSK", doc.psk.as_deref())?,
            sink_name: copy_field("influx_mdns_addr", doc.influx_mdns_addr.as_deref())?,
            sink_addr: copy_field("influx_ip_addr", doc.influx_ip_addr.as_deref())?,
            sink_port: doc.influx_port.unwrap_or(DEFAULT_SINK_PORT),
            db_name: copy_field("db_name", doc.db_name.as_deref())?,
            measurement: copy_field("measurement", doc.measurement.as_deref())?,
        })
    }

    /// Load configuration from the stored document, degrading to defaults
    ///
    /// `None` means storage held no document at all.
    pub fn load(document: Option<&[u8]>) -> Self {
        let parsed = match document {
            Some(bytes) => Self::from_json(bytes),
            None => Err(ConfigError::Missing),
        };

        match parsed {
            Ok(config) => {
                info!(
                    "Settings loaded: ssid={} sink={}:{} db={} measurement={}",
                    config.ssid.as_str(),
                    config.sink_host(),
                    config.sink_port,
                    config.db_name.as_str(),
                    config.measurement.as_str()
                );
                config
            }
            Err(e) => {
                warn!("Using empty configuration: {}", e);
                Self::default()
            }
        }
    }

    /// Credentials present; association is only attempted when true
    pub fn has_credentials(&self) -> bool {
        !self.ssid.is_empty() && !self.psk.is_empty()
    }

    /// Resolution target, name taking precedence over the literal
    pub fn sink_target(&self) -> SinkTarget<'_> {
        if !self.sink_name.is_empty() {
            SinkTarget::Name(self.sink_name.as_str())
        } else if !self.sink_addr.is_empty() {
            SinkTarget::Literal(self.sink_addr.as_str())
        } else {
            SinkTarget::Unset
        }
    }

    fn sink_host(&self) -> &str {
        match self.sink_target() {
            SinkTarget::Name(host) | SinkTarget::Literal(host) => host,
            SinkTarget::Unset => "<unset>",
        }
    }
}

fn copy_field<const N: usize>(
    key: &'static str,
    value: Option<&str>,
) -> Result<String<N>, ConfigError> {
    let mut field = String::new();
    if let Some(value) = value {
        field
            .push_str(value)
            .map_err(|_| ConfigError::FieldTooLong(key))?;
    }
    Ok(field)
}
