//! BeeNode Firmware: Main Entry Point
//!
//! Hexagonal architecture around a single supervisor loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  UartConsole     WifiAdapter     MqttAdapter     SystemClock   │
//! │  (SerialPort)    (LinkDriver)    (MqttClient)    (Clock)       │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              Supervisor (pure logic)                   │    │
//! │  │  LinkManager · TransportManager · CommandRouter        │    │
//! │  │  StatusRegistry                                        │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use log::{LevelFilter, info};

use beenode::adapters::console::UartConsole;
use beenode::adapters::mqtt::MqttAdapter;
use beenode::adapters::time::SystemClock;
use beenode::adapters::wifi::WifiAdapter;
use beenode::app::supervisor::Supervisor;
use beenode::config::{LOOP_INTERVAL_MS, NodeConfig};

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    // ── 2. Build-time configuration ───────────────────────────
    let config = NodeConfig::from_build_env()?;
    log::set_max_level(if config.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    });

    info!("╔══════════════════════════════════════╗");
    info!("║  BeeNode v{}                        ║", config.version);
    info!("╚══════════════════════════════════════╝");
    info!(
        "Node {} of {} in network '{}'",
        config.device_number, config.network_size, config.bnn
    );

    // ── 3. Construct adapters ─────────────────────────────────
    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let console = UartConsole::start()?;
    let wifi = WifiAdapter::new(peripherals.modem, sysloop, nvs)?;
    let mqtt = MqttAdapter::new();
    let clock = SystemClock::new();

    // ── 4. Supervisor ─────────────────────────────────────────
    let mut supervisor = Supervisor::new(&config, console, clock, wifi, mqtt);

    info!("System ready. Watching console for managed mode.");

    // ── 5. Main loop ──────────────────────────────────────────
    supervisor.run(LOOP_INTERVAL_MS)
}
