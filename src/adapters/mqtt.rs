//! MQTT client adapter.
//!
//! Implements [`MqttClient`] over the ESP-IDF MQTT component.  The
//! component runs its own task and reports through an event callback;
//! the callback records session state in shared atomics and forwards
//! received messages through [`MQTT_RX`], which `poll` drains.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `esp_idf_svc::mqtt::client::EspMqttClient`.
//! - **all other targets**: an in-memory broker session for host-side runs.

use log::debug;

#[cfg(not(target_os = "espidf"))]
use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::{ConnectOptions, InboundMessage, MqttClient};
use crate::error::TransportError;

#[cfg(target_os = "espidf")]
use std::sync::Arc;
#[cfg(target_os = "espidf")]
use std::sync::atomic::{AtomicI8, Ordering};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{
    EspMqttClient, EspMqttEvent, EventPayload, MqttClientConfiguration, QoS,
};

#[cfg(target_os = "espidf")]
use crate::channels::MQTT_RX;

/// How long one connect attempt waits for the broker's CONNACK.
pub const CONNECT_WAIT_MS: u32 = 2_000;

// ───────────────────────────────────────────────────────────────
// Session state shared with the event callback
// ───────────────────────────────────────────────────────────────

#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const STATE_PENDING: i8 = i8::MIN;
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
const STATE_CONNECTED: i8 = 0;

/// Session events reported by the client task.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SessionEvent {
    Connected,
    Disconnected,
}

/// Next session state after `event`.
///
/// Only the CONNACK of a pending attempt counts as connected.  A session
/// that comes back on its own carries no subscription, so it is recorded
/// as lost and the transport manager reconnects and resubscribes.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn next_state(current: i8, event: SessionEvent) -> i8 {
    match (current, event) {
        (STATE_PENDING, SessionEvent::Connected) => STATE_CONNECTED,
        (STATE_PENDING, SessionEvent::Disconnected) => TransportError::ConnectFailed.code() as i8,
        (_, SessionEvent::Connected) | (STATE_CONNECTED, SessionEvent::Disconnected) => {
            TransportError::ConnectionLost.code() as i8
        }
        (other, SessionEvent::Disconnected) => other,
    }
}

/// `None` while an attempt is still waiting for the broker.
#[cfg_attr(not(target_os = "espidf"), allow(dead_code))]
fn decode_state(raw: i8) -> Option<Result<(), TransportError>> {
    match raw {
        STATE_PENDING => None,
        STATE_CONNECTED => Some(Ok(())),
        -3 => Some(Err(TransportError::ConnectionLost)),
        _ => Some(Err(TransportError::ConnectFailed)),
    }
}

#[cfg(target_os = "espidf")]
fn on_event(state: &AtomicI8, event: &EspMqttEvent<'_>) {
    let session = match event.payload() {
        EventPayload::Connected(_) => SessionEvent::Connected,
        EventPayload::Disconnected => SessionEvent::Disconnected,
        EventPayload::Received {
            topic: Some(topic),
            data,
            ..
        } => {
            match InboundMessage::new(topic, data) {
                Some(msg) => {
                    if MQTT_RX.try_send(msg).is_err() {
                        warn!("MQTT: receive queue full, dropping message on '{}'", topic);
                    }
                }
                None => warn!("MQTT: oversized message on '{}' dropped", topic),
            }
            return;
        }
        EventPayload::Error(e) => {
            debug!("MQTT: client error: {}", e);
            return;
        }
        _ => return,
    };
    // The closure never declines, so the update always lands.
    let _ = state.fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
        Some(next_state(current, session))
    });
}

// ───────────────────────────────────────────────────────────────
// MQTT adapter
// ───────────────────────────────────────────────────────────────

pub struct MqttAdapter {
    #[cfg(target_os = "espidf")]
    client: Option<EspMqttClient<'static>>,
    #[cfg(target_os = "espidf")]
    state: Arc<AtomicI8>,

    #[cfg(not(target_os = "espidf"))]
    sim: SimBroker,
}

#[cfg(target_os = "espidf")]
impl Default for MqttAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
impl MqttAdapter {
    pub fn new() -> Self {
        Self {
            client: None,
            state: Arc::new(AtomicI8::new(TransportError::Disconnected.code() as i8)),
        }
    }

    fn platform_connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), TransportError> {
        // A fresh attempt means a fresh client.
        self.client = None;
        self.state.store(STATE_PENDING, Ordering::Release);

        let url = format!("mqtt://{}:{}", options.host, options.port);
        let conf = MqttClientConfiguration {
            client_id: Some(options.client_id),
            username: Some(options.username),
            password: Some(options.password),
            disable_auto_reconnect: true,
            ..Default::default()
        };

        let state = Arc::clone(&self.state);
        let client = EspMqttClient::new_cb(&url, &conf, move |event| on_event(&state, &event))
            .map_err(|e| {
                warn!("MQTT(espidf): client init failed: {}", e);
                TransportError::ConnectFailed
            })?;
        self.client = Some(client);

        let mut waited = 0;
        while waited < CONNECT_WAIT_MS {
            if let Some(outcome) = decode_state(self.state.load(Ordering::Acquire)) {
                if outcome.is_err() {
                    self.client = None;
                }
                return outcome;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
            waited += 50;
        }
        self.client = None;
        Err(TransportError::ConnectionTimeout)
    }

    fn platform_is_connected(&self) -> bool {
        self.client.is_some() && self.state.load(Ordering::Acquire) == STATE_CONNECTED
    }

    fn platform_subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        let client = self.client.as_mut().ok_or(TransportError::Disconnected)?;
        client.subscribe(topic, QoS::AtMostOnce).map(|_| ()).map_err(|e| {
            warn!("MQTT(espidf): subscribe failed: {}", e);
            TransportError::ConnectionLost
        })
    }

    fn platform_poll(&mut self) -> Option<InboundMessage> {
        MQTT_RX.try_receive().ok()
    }
}

// ───────────────────────────────────────────────────────────────
// Host simulation
// ───────────────────────────────────────────────────────────────

#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
struct SimBroker {
    connected: bool,
    refusals: std::collections::VecDeque<TransportError>,
    subscriptions: Vec<String>,
    inbox: heapless::Deque<InboundMessage, 8>,
}

#[cfg(not(target_os = "espidf"))]
impl Default for MqttAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    pub fn new() -> Self {
        Self {
            sim: SimBroker::default(),
        }
    }

    /// Simulation: fail the next connect attempt with `err`.
    pub fn refuse_next(&mut self, err: TransportError) {
        self.sim.refusals.push_back(err);
    }

    /// Simulation: the broker closes the session.
    pub fn drop_session(&mut self) {
        info!("MQTT(sim): session dropped");
        self.sim.connected = false;
        self.sim.subscriptions.clear();
    }

    /// Simulation: deliver a message if its topic is subscribed.
    pub fn inject(&mut self, topic: &str, payload: &[u8]) -> bool {
        if !self.sim.connected || !self.sim.subscriptions.iter().any(|s| s == topic) {
            return false;
        }
        InboundMessage::new(topic, payload)
            .is_some_and(|msg| self.sim.inbox.push_back(msg).is_ok())
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.sim.subscriptions
    }

    fn platform_connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), TransportError> {
        if let Some(err) = self.sim.refusals.pop_front() {
            info!("MQTT(sim): {}:{} refused: {}", options.host, options.port, err);
            return Err(err);
        }
        info!("MQTT(sim): '{}' connected to {}:{}", options.client_id, options.host, options.port);
        self.sim.connected = true;
        Ok(())
    }

    fn platform_is_connected(&self) -> bool {
        self.sim.connected
    }

    fn platform_subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        if !self.sim.connected {
            return Err(TransportError::Disconnected);
        }
        if !self.sim.subscriptions.iter().any(|s| s == topic) {
            self.sim.subscriptions.push(topic.to_string());
        }
        Ok(())
    }

    fn platform_poll(&mut self) -> Option<InboundMessage> {
        self.sim.inbox.pop_front()
    }
}

// ───────────────────────────────────────────────────────────────
// MqttClient
// ───────────────────────────────────────────────────────────────

impl MqttClient for MqttAdapter {
    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), TransportError> {
        debug!("MQTT: connecting to {}:{}", options.host, options.port);
        self.platform_connect(options)
    }

    fn is_connected(&self) -> bool {
        self.platform_is_connected()
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        self.platform_subscribe(topic)
    }

    fn poll(&mut self) -> Option<InboundMessage> {
        self.platform_poll()
    }
}

// ───────────────────────────────────────────────────────────────
// Tests
// ───────────────────────────────────────────────────────────────
