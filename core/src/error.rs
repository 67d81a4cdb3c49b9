//! Reporting error types

/// Why a report attempt failed
///
/// Every variant is retried by the state machine. A sink that answers with an
/// error status after the request went out is not a failure here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportError {
    /// Credentials absent, or the network could not be joined
    Connectivity,
    /// No sink address configured, or it did not resolve to a usable address
    Resolution,
    /// The request could not be built or sent
    Send,
}

impl core::fmt::Display for ReportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Connectivity => write!(f, "Network connectivity failed"),
            Self::Resolution => write!(f, "Sink address resolution failed"),
            Self::Send => write!(f, "Write request send failed"),
        }
    }
}

impl core::error::Error for ReportError {}
