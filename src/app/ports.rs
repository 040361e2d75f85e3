//! Port traits: the boundary between the node's logic and its collaborators.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Supervisor / managers (domain)
//! ```
//!
//! The serial line, the Wi-Fi driver, the MQTT client and the clock are
//! consumed only through these traits.  The domain takes them as generics,
//! so every connect loop and dispatch path runs against fakes on the host.

use embedded_hal::delay::DelayNs;

use crate::error::{LinkDriverError, TransportError};

/// Longest topic an inbound message may carry.
pub const TOPIC_CAP: usize = 128;

/// Longest payload an inbound message may carry.  Command frames are short.
pub const PAYLOAD_CAP: usize = 64;

// ───────────────────────────────────────────────────────────────
// Serial channel
// ───────────────────────────────────────────────────────────────

/// Line-delimited text channel to the host.
pub trait SerialPort {
    /// Next complete line with surrounding whitespace removed, or `None`
    /// if nothing is pending.  Never blocks.
    fn read_line(&mut self) -> Option<String>;

    /// Write `line` followed by a newline.
    fn write_line(&mut self, line: &str);
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Monotonic time source.  Delays come from [`DelayNs`].
pub trait Clock: DelayNs {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Link driver
// ───────────────────────────────────────────────────────────────

/// Station-mode wireless driver.
pub trait LinkDriver {
    /// Start associating with `ssid`.  Returns as soon as the request is
    /// accepted; completion is observed through [`is_connected`].
    ///
    /// [`is_connected`]: LinkDriver::is_connected
    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), LinkDriverError>;

    /// Associated and holding an address.
    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// MQTT client
// ───────────────────────────────────────────────────────────────

/// Endpoint and credentials for one connect attempt.
#[derive(Debug, Clone, Copy)]
pub struct ConnectOptions<'a> {
    pub host: &'a str,
    pub port: u16,
    pub client_id: &'a str,
    pub username: &'a str,
    pub password: &'a str,
}

/// A message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: heapless::String<TOPIC_CAP>,
    pub payload: heapless::Vec<u8, PAYLOAD_CAP>,
}

impl InboundMessage {
    /// `None` if either part exceeds its capacity.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        let mut t = heapless::String::new();
        t.push_str(topic).ok()?;
        let p = heapless::Vec::from_slice(payload).ok()?;
        Some(Self {
            topic: t,
            payload: p,
        })
    }
}

/// Publish/subscribe session primitives.
pub trait MqttClient {
    /// One authenticated connect attempt.  Blocks at most for the
    /// client's own handshake timeout.
    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), TransportError>;

    fn is_connected(&self) -> bool;

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError>;

    /// Keep-alive work plus delivery: returns the next pending inbound
    /// message, if any.
    fn poll(&mut self) -> Option<InboundMessage>;
}
