//! Outbound serial replies.
//!
//! These are the protocol lines the host tool parses, so their spelling is
//! fixed.  They are written verbatim with [`SerialPort::write_line`], never
//! through the logger.
//!
//! [`SerialPort::write_line`]: super::ports::SerialPort::write_line

use core::fmt;

use super::ports::SerialPort;
use crate::error::TransportError;

/// Fixed-format lines the node writes to serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// Link joined.
    WifiConnected,
    /// Link not joined within its deadline.
    WifiTimeout,
    /// Broker session established.
    MqttConnected,
    /// Broker session not established within its deadline.
    MqttTimeout,
    /// One broker attempt failed; carries the state code.
    MqttError(TransportError),
    /// Answer to `echo`.
    Up,
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WifiConnected => f.write_str("WifiConnected"),
            Self::WifiTimeout => f.write_str("WifiTimeout"),
            Self::MqttConnected => f.write_str("MqttConnected!"),
            Self::MqttTimeout => f.write_str("MqttTimeout"),
            Self::MqttError(e) => write!(f, "MQTT Error code: {}", e.code()),
            Self::Up => f.write_str("UP!"),
        }
    }
}

impl Reply {
    /// Write this reply as one serial line.
    pub fn send<S: SerialPort>(self, serial: &mut S) {
        serial.write_line(&self.to_string());
    }
}
