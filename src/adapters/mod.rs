//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter   | Implements   | Connects to                     |
//! |-----------|--------------|---------------------------------|
//! | `console` | SerialPort   | UART console (stdin / stdout)   |
//! | `mqtt`    | MqttClient   | ESP-IDF MQTT client component   |
//! | `time`    | Clock        | ESP32 system timer              |
//! | `wifi`    | LinkDriver   | ESP-IDF WiFi STA                |

pub mod console;
pub mod mqtt;
pub mod time;
pub mod wifi;
