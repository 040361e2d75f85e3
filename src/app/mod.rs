//! Node core: connectivity lifecycle and command dispatch, zero I/O.
//!
//! All interaction with the serial line, the Wi-Fi driver, the MQTT client
//! and the clock happens through the **port traits** in [`ports`], keeping
//! this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod link;
pub mod ports;
pub mod router;
pub mod status;
pub mod supervisor;
pub mod transport;
