//! Supervisor loop: boot-time mode decision and the steady-state cycle.
//!
//! ```text
//!   ModeDecision ──"managedMode" within 20 s──▶ Running(Managed)
//!        │
//!        └──window expires──▶ link.connect ─▶ transport.connect ─▶ Running(Autonomous)
//!
//!   Running, every cycle:
//!     serial line? ─▶ router
//!     Autonomous only:
//!       link down              ─▶ both flags false, skip transport
//!       link up, session down  ─▶ transport.connect
//!       link up, session up    ─▶ transport.service ─▶ queued frames ─▶ router
//! ```
//!
//! In managed mode an external supervisor owns connectivity; the node only
//! answers serial commands (which may still ask it to connect).

use log::{debug, error, info, warn};

use super::events::Reply;
use super::link::LinkManager;
use super::ports::{Clock, LinkDriver, MqttClient, SerialPort};
use super::router::{CommandEffects, CommandRouter};
use super::status::StatusRegistry;
use super::transport::{TransportManager, TransportSettings};
use crate::config::{BOOT_WATCH, NodeConfig};
use crate::error::Error;
use crate::retry::attempt_until;

/// Serial line that selects managed mode during the boot window.
pub const MANAGED_MODE_SENTINEL: &str = "managedMode";

/// Decided once at boot, fixed until power-cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Connectivity is owned externally.
    Managed,
    /// The node connects and reconnects on its own.
    Autonomous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    ModeDecision,
    Running(Mode),
}

// ───────────────────────────────────────────────────────────────
// Node: everything a verb can touch
// ───────────────────────────────────────────────────────────────

/// The collaborators and state that command effects act on.
pub struct Node<S, L, M, C> {
    pub serial: S,
    pub clock: C,
    pub status: StatusRegistry,
    pub link: LinkManager<L>,
    pub transport: TransportManager<M>,
}

impl<S, L, M, C> Node<S, L, M, C>
where
    S: SerialPort,
    L: LinkDriver,
    M: MqttClient,
    C: Clock,
{
    pub fn new(config: &NodeConfig, serial: S, clock: C, link_driver: L, mqtt: M) -> Self {
        Self {
            serial,
            clock,
            status: StatusRegistry::new(config),
            link: LinkManager::new(link_driver, config.wifi_ssid.clone(), config.wifi_password.clone()),
            transport: TransportManager::new(mqtt, TransportSettings::from_config(config)),
        }
    }

    pub fn try_connect_link(&mut self) -> Result<(), Error> {
        self.link.connect(&mut self.status, &mut self.clock, &mut self.serial)
    }

    pub fn try_connect_transport(&mut self) -> Result<(), Error> {
        self.transport.connect(&mut self.status, &mut self.clock, &mut self.serial)
    }
}

impl<S, L, M, C> CommandEffects for Node<S, L, M, C>
where
    S: SerialPort,
    L: LinkDriver,
    M: MqttClient,
    C: Clock,
{
    fn echo(&mut self) {
        Reply::Up.send(&mut self.serial);
    }

    fn connect_link(&mut self) {
        if let Err(e) = self.try_connect_link() {
            debug!("connectWifi: {}", e);
        }
    }

    fn connect_transport(&mut self) {
        if let Err(e) = self.try_connect_transport() {
            debug!("connectMqtt: {}", e);
        }
    }

    fn report_status(&mut self) {
        match self.status.to_json() {
            Ok(json) => self.serial.write_line(&json),
            Err(e) => error!("getInfo: status serialization failed: {}", e),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Supervisor
// ───────────────────────────────────────────────────────────────

pub struct Supervisor<S, L, M, C> {
    router: CommandRouter,
    node: Node<S, L, M, C>,
    phase: Phase,
}

impl<S, L, M, C> Supervisor<S, L, M, C>
where
    S: SerialPort,
    L: LinkDriver,
    M: MqttClient,
    C: Clock,
{
    pub fn new(config: &NodeConfig, serial: S, clock: C, link_driver: L, mqtt: M) -> Self {
        Self::with_node(config, Node::new(config, serial, clock, link_driver, mqtt))
    }

    /// Build around a node whose managers were configured by the caller.
    pub fn with_node(config: &NodeConfig, node: Node<S, L, M, C>) -> Self {
        Self {
            router: CommandRouter::new(config.device_number),
            node,
            phase: Phase::ModeDecision,
        }
    }

    /// Watch serial for the sentinel, then fix the mode.  In autonomous
    /// mode the link and the transport are each connected once, in that
    /// order, whatever the link outcome.  Idempotent after the first call.
    pub fn boot(&mut self) -> Mode {
        if let Phase::Running(mode) = self.phase {
            return mode;
        }

        let Node { serial, clock, .. } = &mut self.node;
        let sentinel_seen = attempt_until(&BOOT_WATCH, clock, |_| {
            let line = serial.read_line()?;
            if line == MANAGED_MODE_SENTINEL {
                Some(())
            } else {
                debug!("boot: ignoring '{}'", line);
                None
            }
        })
        .is_ok();

        let mode = if sentinel_seen {
            info!("Boot: managed mode");
            Mode::Managed
        } else {
            info!("Boot: no sentinel, autonomous mode");
            Mode::Autonomous
        };
        self.phase = Phase::Running(mode);

        if mode == Mode::Autonomous {
            if let Err(e) = self.node.try_connect_link() {
                warn!("Boot: {}", e);
            }
            if let Err(e) = self.node.try_connect_transport() {
                warn!("Boot: {}", e);
            }
        }
        mode
    }

    /// One cycle of the steady state.  Boots first if needed.
    pub fn tick(&mut self) {
        let mode = self.boot();

        if let Some(line) = self.node.serial.read_line() {
            let outcome = self.router.dispatch(&line, &mut self.node);
            debug!("serial: {:?}", outcome);
        }

        if mode == Mode::Managed {
            return;
        }

        if !self.node.link.is_connected() {
            if self.node.status.link_connected() || self.node.status.transport_connected() {
                warn!("WiFi: link lost");
            }
            self.node.status.set_link_state(false);
            self.node.status.set_transport_state(false);
            return;
        }

        if !self.node.status.link_connected() {
            info!("WiFi: link restored");
            self.node.status.set_link_state(true);
        }

        if !self.node.transport.is_connected() || !self.node.status.transport_connected() {
            if let Err(e) = self.node.try_connect_transport() {
                debug!("reconnect: {}", e);
            }
            return;
        }

        self.node.transport.service();
        while let Some(frame) = self.node.transport.next_frame() {
            let outcome = self.router.dispatch(&frame, &mut self.node);
            debug!("mqtt: {:?}", outcome);
        }
    }

    /// Run forever, pausing `interval_ms` between cycles.
    pub fn run(&mut self, interval_ms: u32) -> ! {
        self.boot();
        loop {
            self.tick();
            self.node.clock.delay_ms(interval_ms);
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn mode(&self) -> Option<Mode> {
        match self.phase {
            Phase::ModeDecision => None,
            Phase::Running(mode) => Some(mode),
        }
    }

    pub fn router(&self) -> &CommandRouter {
        &self.router
    }

    pub fn status(&self) -> &StatusRegistry {
        &self.node.status
    }

    pub fn node(&self) -> &Node<S, L, M, C> {
        &self.node
    }

    pub fn node_mut(&mut self) -> &mut Node<S, L, M, C> {
        &mut self.node
    }
}
