//! Node configuration.
//!
//! Every value is fixed at build time (see `build.rs`); there is no runtime
//! reconfiguration interface.  Timing constants for the connect loops and
//! the boot window live here too.

use core::fmt;

use crate::retry::RetryPolicy;

/// Firmware version reported in the status record.
pub const FIRMWARE_VERSION: &str = "0.1";

/// Topic suffix the node subscribes to for commands.
pub const CMD_TOPIC: &str = "cmd";

// --- Link ---
pub const LINK_TIMEOUT_MS: u64 = 20_000;
pub const LINK_POLL_INTERVAL_MS: u32 = 500;

// --- Transport ---
pub const TRANSPORT_TIMEOUT_MS: u64 = 30_000;
pub const TRANSPORT_RETRY_INTERVAL_MS: u32 = 5_000;

// --- Boot ---
/// How long the serial channel is watched for the managed-mode sentinel.
pub const BOOT_WINDOW_MS: u64 = 20_000;
pub const BOOT_POLL_INTERVAL_MS: u32 = 10;

/// Pause between supervisor cycles in the firmware binary.
pub const LOOP_INTERVAL_MS: u32 = 10;

pub const LINK_RETRY: RetryPolicy = RetryPolicy::new(LINK_POLL_INTERVAL_MS, LINK_TIMEOUT_MS);
pub const TRANSPORT_RETRY: RetryPolicy =
    RetryPolicy::new(TRANSPORT_RETRY_INTERVAL_MS, TRANSPORT_TIMEOUT_MS);
pub const BOOT_WATCH: RetryPolicy = RetryPolicy::new(BOOT_POLL_INTERVAL_MS, BOOT_WINDOW_MS);

/// Identity, credentials and endpoints of this node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub version: String,
    /// Fleet (biosensor network) name.
    pub bnn: String,
    pub device_number: u16,
    pub network_size: u16,

    // --- Link ---
    pub wifi_ssid: String,
    pub wifi_password: String,

    // --- Transport ---
    pub mqtt_server: String,
    pub mqtt_port: u16,
    pub mqtt_user: String,
    pub mqtt_password: String,
    /// Always ends with `/`.
    pub topic_prefix: String,

    pub debug: bool,
}

impl NodeConfig {
    /// Configuration baked in by `build.rs`.
    pub fn from_build_env() -> Result<Self, ConfigError> {
        let config = Self {
            version: FIRMWARE_VERSION.to_string(),
            bnn: env!("BEENODE_BNN").to_string(),
            device_number: parse_u16("BEENODE_DEVICE_NUMBER", env!("BEENODE_DEVICE_NUMBER"))?,
            network_size: parse_u16("BEENODE_NETWORK_SIZE", env!("BEENODE_NETWORK_SIZE"))?,
            wifi_ssid: env!("BEENODE_WIFI_SSID").to_string(),
            wifi_password: env!("BEENODE_WIFI_PSW").to_string(),
            mqtt_server: env!("BEENODE_MQTT_SERVER").to_string(),
            mqtt_port: parse_u16("BEENODE_MQTT_PORT", env!("BEENODE_MQTT_PORT"))?,
            mqtt_user: env!("BEENODE_MQTT_USER").to_string(),
            mqtt_password: env!("BEENODE_MQTT_PSW").to_string(),
            topic_prefix: env!("BEENODE_TOPIC_PREFIX").to_string(),
            debug: env!("BEENODE_DEBUG") == "1",
        };
        config.validate()?;
        Ok(config)
    }

    /// Range and shape checks.  Rejects rather than clamps.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bnn.is_empty() {
            return Err(ConfigError::Invalid("fleet id (BNN) is empty"));
        }
        if self.device_number == 0 {
            return Err(ConfigError::Invalid("device number must be at least 1"));
        }
        if self.device_number > self.network_size {
            return Err(ConfigError::Invalid("device number exceeds network size"));
        }
        if self.mqtt_port == 0 {
            return Err(ConfigError::Invalid("MQTT port must be non-zero"));
        }
        if !self.topic_prefix.ends_with('/') {
            return Err(ConfigError::Invalid("topic prefix must end with '/'"));
        }
        Ok(())
    }

    /// `<BNN>_<deviceNumber>`: unique per fleet member on the broker.
    pub fn client_id(&self) -> String {
        format!("{}_{}", self.bnn, self.device_number)
    }

    /// The single topic this node subscribes to.
    pub fn command_topic(&self) -> String {
        format!("{}{}", self.topic_prefix, CMD_TOPIC)
    }

    /// Prefix shared by every node of the fleet: `<user>/<BNN>/`.
    pub fn derive_topic_prefix(mqtt_user: &str, bnn: &str) -> String {
        format!("{}/{}/", mqtt_user, bnn)
    }
}

fn parse_u16(name: &'static str, raw: &str) -> Result<u16, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::NotANumber(name))
}

/// Errors from [`NodeConfig`] construction and validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// A numeric build variable did not parse.
    NotANumber(&'static str),
    /// A field failed validation.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber(name) => write!(f, "{name} is not a number"),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
pub(crate) fn sample_config() -> NodeConfig {
    NodeConfig {
        version: FIRMWARE_VERSION.to_string(),
        bnn: "hive7".to_string(),
        device_number: 1,
        network_size: 3,
        wifi_ssid: "ApiaryNet".to_string(),
        wifi_password: "honeycomb".to_string(),
        mqtt_server: "maqiatto.com".to_string(),
        mqtt_port: 1883,
        mqtt_user: "keeper@example.com".to_string(),
        mqtt_password: "s3cret".to_string(),
        topic_prefix: NodeConfig::derive_topic_prefix("keeper@example.com", "hive7"),
        debug: false,
    }
}
