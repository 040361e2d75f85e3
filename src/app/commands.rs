//! Inbound command frames.
//!
//! Both channels (serial and the MQTT command topic) carry the same text
//! grammar:
//!
//! ```text
//!   <deviceNumber>_<verb>        e.g.  1_getInfo
//! ```
//!
//! The frame is split once, on the first `_`.  The address half is the
//! only thing compared against this node's number; the verb half is the
//! only thing matched against [`Verb`].

use core::fmt::{self, Write};
use core::str::FromStr;

/// Closed set of verbs a node acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Liveness check; answers `UP!`.
    Echo,
    /// Run the link connect sequence.
    ConnectWifi,
    /// Run the transport connect sequence.
    ConnectMqtt,
    /// Write the status record to serial.
    GetInfo,
}

impl Verb {
    pub const ALL: [Verb; 4] = [Verb::Echo, Verb::ConnectWifi, Verb::ConnectMqtt, Verb::GetInfo];

    /// Wire spelling.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Echo => "echo",
            Self::ConnectWifi => "connectWifi",
            Self::ConnectMqtt => "connectMqtt",
            Self::GetInfo => "getInfo",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The verb half of a frame matched nothing in [`Verb`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownVerb;

impl FromStr for Verb {
    type Err = UnknownVerb;

    /// Exact, case-sensitive match.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or(UnknownVerb)
    }
}

/// A frame split into its address and verb halves.  Borrowed from the
/// inbound line; lives for one dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandFrame<'a> {
    pub address: &'a str,
    pub verb: &'a str,
}

impl<'a> CommandFrame<'a> {
    /// Split on the first `_`.  A frame without `_` is all address and an
    /// empty verb.  Returns `None` for blank input.
    pub fn parse(line: &'a str) -> Option<Self> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        let (address, verb) = line.split_once('_').unwrap_or((line, ""));
        Some(Self { address, verb })
    }

    /// The address half equals the decimal form of `device_number`.
    pub fn is_addressed_to(&self, device_number: u16) -> bool {
        let mut expected = heapless::String::<5>::new();
        // u16::MAX is five digits; this cannot overflow the buffer.
        if write!(expected, "{device_number}").is_err() {
            return false;
        }
        self.address == expected.as_str()
    }
}
