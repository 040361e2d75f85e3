//! Error types for the node.
//!
//! Nothing here is fatal: the supervisor logs every error and keeps
//! servicing the serial channel.  All variants are `Copy` so they pass
//! through the connect paths without allocation.

use core::fmt;

// ---------------------------------------------------------------------------
// Connect outcomes
// ---------------------------------------------------------------------------

/// Terminal outcome of a bounded connect attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The link was not joined within its deadline.
    LinkTimeout,
    /// The broker handshake did not complete within its deadline.
    TransportTimeout,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LinkTimeout => write!(f, "link not joined before deadline"),
            Self::TransportTimeout => write!(f, "transport handshake not completed before deadline"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// A single failed broker attempt.  Codes follow the PubSubClient state
/// numbering that the fleet tooling already understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError {
    /// Broker did not answer in time.
    ConnectionTimeout,
    /// Established session went away.
    ConnectionLost,
    /// Socket-level connect failure.
    ConnectFailed,
    /// Client is not connected.
    Disconnected,
    /// Broker refused: unsupported protocol version.
    BadProtocol,
    /// Broker refused: client id rejected.
    BadClientId,
    /// Broker refused: service unavailable.
    Unavailable,
    /// Broker refused: wrong username or password.
    BadCredentials,
    /// Broker refused: not authorised.
    Unauthorized,
}

impl TransportError {
    /// Numeric state code written to the serial channel.
    pub fn code(self) -> i32 {
        match self {
            Self::ConnectionTimeout => -4,
            Self::ConnectionLost => -3,
            Self::ConnectFailed => -2,
            Self::Disconnected => -1,
            Self::BadProtocol => 1,
            Self::BadClientId => 2,
            Self::Unavailable => 3,
            Self::BadCredentials => 4,
            Self::Unauthorized => 5,
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let what = match self {
            Self::ConnectionTimeout => "connection timeout",
            Self::ConnectionLost => "connection lost",
            Self::ConnectFailed => "connect failed",
            Self::Disconnected => "disconnected",
            Self::BadProtocol => "bad protocol",
            Self::BadClientId => "bad client id",
            Self::Unavailable => "broker unavailable",
            Self::BadCredentials => "bad credentials",
            Self::Unauthorized => "unauthorized",
        };
        write!(f, "{what} (state {})", self.code())
    }
}

impl std::error::Error for TransportError {}

// ---------------------------------------------------------------------------
// Link driver errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDriverError {
    InvalidSsid,
    InvalidPassword,
    /// The platform driver rejected the request.
    Driver,
}

impl fmt::Display for LinkDriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSsid => write!(f, "SSID invalid (must be 1-32 printable ASCII bytes)"),
            Self::InvalidPassword => write!(f, "password invalid (must be 8-64 bytes for WPA2, or empty for open)"),
            Self::Driver => write!(f, "WiFi driver error"),
        }
    }
}

impl std::error::Error for LinkDriverError {}
