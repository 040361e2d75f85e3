//! Status registry: the node's single mutable record.
//!
//! Created once at boot from [`NodeConfig`], before any connect attempt,
//! and kept for the life of the process.  Only the two connectivity flags
//! ever change, and only the link and transport managers change them.
//!
//! The flags follow confirmed state: they go `true` after a connect is
//! confirmed and `false` as soon as a loss is detected, never ahead of it.

use serde::Serialize;

use crate::config::NodeConfig;

/// Snapshot served by `getInfo`.  Field names are the wire keys the host
/// tool reads back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusRecord {
    #[serde(rename = "Version")]
    pub version: String,
    #[serde(rename = "BNN")]
    pub bnn: String,
    #[serde(rename = "DeviceNumber")]
    pub device_number: u16,
    #[serde(rename = "NetworkSize")]
    pub network_size: u16,
    #[serde(rename = "WifiSSID")]
    pub wifi_ssid: String,
    #[serde(rename = "WifiPSW")]
    pub wifi_password: String,
    #[serde(rename = "MqttServer")]
    pub mqtt_server: String,
    #[serde(rename = "MqttPort")]
    pub mqtt_port: u16,
    #[serde(rename = "MqttUser")]
    pub mqtt_user: String,
    #[serde(rename = "MqttPSW")]
    pub mqtt_password: String,
    #[serde(rename = "MqttPrefix")]
    pub topic_prefix: String,
    #[serde(rename = "ConnectedWifi")]
    pub connected_wifi: bool,
    #[serde(rename = "ConnectedMqtt")]
    pub connected_mqtt: bool,
}

/// Owner of the [`StatusRecord`].  Passed by `&mut` to whichever manager
/// is transitioning.
#[derive(Debug, Clone)]
pub struct StatusRegistry {
    record: StatusRecord,
}

impl StatusRegistry {
    /// Both connectivity flags start `false`.
    pub fn new(config: &NodeConfig) -> Self {
        Self {
            record: StatusRecord {
                version: config.version.clone(),
                bnn: config.bnn.clone(),
                device_number: config.device_number,
                network_size: config.network_size,
                wifi_ssid: config.wifi_ssid.clone(),
                wifi_password: config.wifi_password.clone(),
                mqtt_server: config.mqtt_server.clone(),
                mqtt_port: config.mqtt_port,
                mqtt_user: config.mqtt_user.clone(),
                mqtt_password: config.mqtt_password.clone(),
                topic_prefix: config.topic_prefix.clone(),
                connected_wifi: false,
                connected_mqtt: false,
            },
        }
    }

    /// Current values.  No side effects.
    pub fn report(&self) -> &StatusRecord {
        &self.record
    }

    /// The record as one line of JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.record)
    }

    pub fn set_link_state(&mut self, connected: bool) {
        self.record.connected_wifi = connected;
    }

    pub fn set_transport_state(&mut self, connected: bool) {
        self.record.connected_mqtt = connected;
    }

    pub fn link_connected(&self) -> bool {
        self.record.connected_wifi
    }

    pub fn transport_connected(&self) -> bool {
        self.record.connected_mqtt
    }
}
