//! WiFi station-mode adapter.
//!
//! Implements [`LinkDriver`]: the boundary for link-layer connectivity.
//! The adapter only starts association and reports state; deadlines and
//! retries belong to the link manager.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: real ESP-IDF WiFi driver calls via `esp_idf_svc::wifi`.
//! - **all other targets**: simulation stubs for host-side runs.

use log::{error, info};

#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::LinkDriver;
use crate::error::LinkDriverError;

#[cfg(target_os = "espidf")]
use esp_idf_svc::{
    eventloop::EspSystemEventLoop,
    hal::modem::Modem,
    nvs::EspDefaultNvsPartition,
    sys::EspError,
    wifi::{AuthMethod, ClientConfiguration, Configuration, EspWifi},
};

// ───────────────────────────────────────────────────────────────
// Validation
// ───────────────────────────────────────────────────────────────

fn is_printable_ascii(s: &str) -> bool {
    s.bytes().all(|b| (0x20..=0x7E).contains(&b))
}

pub fn validate_ssid(ssid: &str) -> Result<(), LinkDriverError> {
    if ssid.is_empty() || ssid.len() > 32 {
        return Err(LinkDriverError::InvalidSsid);
    }
    if !is_printable_ascii(ssid) {
        return Err(LinkDriverError::InvalidSsid);
    }
    Ok(())
}

pub fn validate_password(password: &str) -> Result<(), LinkDriverError> {
    if password.is_empty() {
        return Ok(());
    }
    if password.len() < 8 || password.len() > 64 {
        return Err(LinkDriverError::InvalidPassword);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// WiFi adapter
// ───────────────────────────────────────────────────────────────

/// Status polls before a simulated association completes.
#[cfg(not(target_os = "espidf"))]
pub const SIM_ASSOCIATION_POLLS: u32 = 4;

pub struct WifiAdapter {
    #[cfg(target_os = "espidf")]
    wifi: EspWifi<'static>,
    /// Simulation: association requested and not dropped since.
    #[cfg(not(target_os = "espidf"))]
    sim_associating: bool,
    /// Simulation: polls since `begin`, in a `Cell` because polling is `&self`.
    #[cfg(not(target_os = "espidf"))]
    sim_polls: core::cell::Cell<u32>,
}

#[cfg(target_os = "espidf")]
impl WifiAdapter {
    pub fn new(
        modem: Modem,
        sysloop: EspSystemEventLoop,
        nvs: EspDefaultNvsPartition,
    ) -> Result<Self, EspError> {
        let wifi = EspWifi::new(modem, sysloop, Some(nvs))?;
        Ok(Self { wifi })
    }

    fn platform_begin(&mut self, ssid: &str, password: &str) -> Result<(), LinkDriverError> {
        let auth_method = if password.is_empty() {
            AuthMethod::None
        } else {
            AuthMethod::WPA2Personal
        };
        let config = Configuration::Client(ClientConfiguration {
            ssid: ssid.try_into().map_err(|_| LinkDriverError::InvalidSsid)?,
            password: password.try_into().map_err(|_| LinkDriverError::InvalidPassword)?,
            auth_method,
            ..Default::default()
        });

        if self.wifi.is_connected().unwrap_or(false) {
            if let Err(e) = self.wifi.disconnect() {
                warn!("WiFi(espidf): disconnect before reconfigure failed: {}", e);
            }
        }
        self.wifi.set_configuration(&config).map_err(driver_error)?;
        if !self.wifi.is_started().unwrap_or(false) {
            self.wifi.start().map_err(driver_error)?;
        }
        self.wifi.connect().map_err(driver_error)
    }

    fn platform_is_connected(&self) -> bool {
        self.wifi.is_connected().unwrap_or(false) && self.wifi.sta_netif().is_up().unwrap_or(false)
    }
}

#[cfg(target_os = "espidf")]
fn driver_error(e: EspError) -> LinkDriverError {
    error!("WiFi(espidf): {}", e);
    LinkDriverError::Driver
}

#[cfg(not(target_os = "espidf"))]
impl Default for WifiAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl WifiAdapter {
    pub fn new() -> Self {
        Self {
            sim_associating: false,
            sim_polls: core::cell::Cell::new(0),
        }
    }

    /// Simulation: the access point goes away.
    pub fn drop_link(&mut self) {
        info!("WiFi(sim): link dropped");
        self.sim_associating = false;
        self.sim_polls.set(0);
    }

    fn platform_begin(&mut self, ssid: &str, _password: &str) -> Result<(), LinkDriverError> {
        info!("WiFi(sim): associating with '{}'", ssid);
        self.sim_associating = true;
        self.sim_polls.set(0);
        Ok(())
    }

    fn platform_is_connected(&self) -> bool {
        if !self.sim_associating {
            return false;
        }
        let polls = self.sim_polls.get().saturating_add(1);
        self.sim_polls.set(polls);
        polls > SIM_ASSOCIATION_POLLS
    }
}

// ───────────────────────────────────────────────────────────────
// LinkDriver
// ───────────────────────────────────────────────────────────────

impl LinkDriver for WifiAdapter {
    fn begin(&mut self, ssid: &str, password: &str) -> Result<(), LinkDriverError> {
        validate_ssid(ssid)?;
        validate_password(password)?;
        self.platform_begin(ssid, password).inspect_err(|e| {
            error!("WiFi: begin failed: {}", e);
        })
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
