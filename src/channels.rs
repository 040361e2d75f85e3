//! Inter-task channels.
//!
//! Uses `embassy-sync` bounded channels to hand data from the tasks that
//! block on I/O (console reader thread, MQTT event callback) to the
//! synchronous supervisor loop, which only ever calls `try_receive`.
//!
//! ```text
//! ┌────────────────┐  SerialLine    ┌──────────────┐
//! │ Console reader │──────────────▶│              │
//! └────────────────┘                │  Supervisor  │
//! ┌────────────────┐  InboundMessage│    loop      │
//! │ MQTT callback  │──────────────▶│              │
//! └────────────────┘                └──────────────┘
//! ```
//!
//! `CriticalSectionRawMutex` needs a `critical-section` implementation:
//! esp-idf-hal provides it on target, `critical-section/std` in host tests.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;

use crate::app::ports::InboundMessage;

/// Longest serial line accepted from the console.
pub const SERIAL_LINE_CAP: usize = 128;

pub type SerialLine = heapless::String<SERIAL_LINE_CAP>;

const SERIAL_DEPTH: usize = 8;
const MQTT_DEPTH: usize = 8;

/// Console reader thread → supervisor loop.
pub static SERIAL_RX: Channel<CriticalSectionRawMutex, SerialLine, SERIAL_DEPTH> = Channel::new();

/// MQTT event callback → MQTT adapter `poll`.
pub static MQTT_RX: Channel<CriticalSectionRawMutex, InboundMessage, MQTT_DEPTH> = Channel::new();
