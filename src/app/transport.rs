//! Transport manager: the node's MQTT session.
//!
//! ```text
//!   connect():  mark down ─▶ attempt ──ok──▶ mark up ─▶ subscribe <prefix>cmd
//!                              │ fail
//!                              ▼
//!                       "MQTT Error code: n", wait 5 s, retry until 30 s
//!
//!   service():  client.poll() ─▶ command-topic messages ─▶ inbox
//! ```
//!
//! Inbound messages are queued rather than dispatched in place, so a
//! `connectMqtt` arriving over MQTT is handled after the service call has
//! returned, never re-entrantly.

use heapless::Deque;
use log::{debug, info, warn};

use super::events::Reply;
use super::ports::{Clock, ConnectOptions, InboundMessage, MqttClient, SerialPort};
use super::status::StatusRegistry;
use crate::config::{NodeConfig, TRANSPORT_RETRY};
use crate::error::Error;
use crate::retry::{RetryPolicy, attempt_until};

/// Inbound messages held between a service call and their dispatch.
pub const INBOX_DEPTH: usize = 8;

/// Endpoint, credentials and topic for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    pub host: String,
    pub port: u16,
    pub client_id: String,
    pub username: String,
    pub password: String,
    pub command_topic: String,
}

impl TransportSettings {
    pub fn from_config(config: &NodeConfig) -> Self {
        Self {
            host: config.mqtt_server.clone(),
            port: config.mqtt_port,
            client_id: config.client_id(),
            username: config.mqtt_user.clone(),
            password: config.mqtt_password.clone(),
            command_topic: config.command_topic(),
        }
    }

    fn options(&self) -> ConnectOptions<'_> {
        ConnectOptions {
            host: &self.host,
            port: self.port,
            client_id: &self.client_id,
            username: &self.username,
            password: &self.password,
        }
    }
}

pub struct TransportManager<M> {
    client: M,
    settings: TransportSettings,
    policy: RetryPolicy,
    inbox: Deque<InboundMessage, INBOX_DEPTH>,
}

impl<M: MqttClient> TransportManager<M> {
    pub fn new(client: M, settings: TransportSettings) -> Self {
        Self {
            client,
            settings,
            policy: TRANSPORT_RETRY,
            inbox: Deque::new(),
        }
    }

    /// Replace the default 30 s / 5 s policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// (Re-)establish the session.  The link must already be up; that is
    /// the caller's check.
    pub fn connect<C, S>(
        &mut self,
        status: &mut StatusRegistry,
        clock: &mut C,
        serial: &mut S,
    ) -> Result<(), Error>
    where
        C: Clock,
        S: SerialPort,
    {
        status.set_transport_state(false);
        debug!("Connecting to MQTT as '{}'...", self.settings.client_id);

        let client = &mut self.client;
        let options = self.settings.options();
        let outcome = attempt_until(&self.policy, clock, |attempt| {
            if client.is_connected() {
                return Some(());
            }
            match client.connect(&options) {
                Ok(()) => Some(()),
                Err(e) => {
                    debug!("MQTT: attempt {} failed: {}", attempt, e);
                    Reply::MqttError(e).send(serial);
                    None
                }
            }
        });

        match outcome {
            Ok(()) => {
                status.set_transport_state(true);
                info!("MQTT: connected to {}:{}", self.settings.host, self.settings.port);
                Reply::MqttConnected.send(serial);
                match self.client.subscribe(&self.settings.command_topic) {
                    Ok(()) => debug!("Subscribed to {}", self.settings.command_topic),
                    Err(e) => warn!("MQTT: subscribe to {} failed: {}", self.settings.command_topic, e),
                }
                Ok(())
            }
            Err(t) => {
                warn!("MQTT: timeout after {} ms ({} attempts)", t.elapsed_ms, t.attempts);
                Reply::MqttTimeout.send(serial);
                Err(Error::TransportTimeout)
            }
        }
    }

    /// Live session state.
    pub fn is_connected(&self) -> bool {
        self.client.is_connected()
    }

    /// One keep-alive pass.  Pending messages on the command topic are
    /// moved into the inbox; anything else is dropped.  Polling stops while
    /// the inbox is full, leaving later messages with the client for the
    /// next pass.  Returns the number of messages queued.
    pub fn service(&mut self) -> usize {
        let mut queued = 0;
        while !self.inbox.is_full() {
            let Some(msg) = self.client.poll() else {
                break;
            };
            if msg.topic.as_str() != self.settings.command_topic {
                debug!("MQTT: ignoring message on '{}'", msg.topic);
                continue;
            }
            if self.inbox.push_back(msg).is_ok() {
                queued += 1;
            }
        }
        queued
    }

    /// Oldest queued command frame.  Payloads that are not UTF-8 are
    /// dropped with a warning.
    pub fn next_frame(&mut self) -> Option<String> {
        while let Some(msg) = self.inbox.pop_front() {
            match core::str::from_utf8(&msg.payload) {
                Ok(text) => return Some(text.to_string()),
                Err(_) => warn!("MQTT: dropping non-UTF-8 payload ({} bytes)", msg.payload.len()),
            }
        }
        None
    }

    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }

    pub fn client(&self) -> &M {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut M {
        &mut self.client
    }
}
