//! Fake port implementations for integration tests.
//!
//! All fakes share one simulated timeline: the clock advances it, and the
//! serial script, link and broker read it.  Nothing sleeps; a 30 s connect
//! loop runs in microseconds.  Link and broker calls are recorded in a
//! shared call log so tests can assert on cross-component ordering.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use beenode::app::ports::{
    Clock, ConnectOptions, InboundMessage, LinkDriver, MqttClient, SerialPort,
};
use beenode::app::supervisor::Supervisor;
use beenode::config::NodeConfig;
use beenode::error::{LinkDriverError, TransportError};
use embedded_hal::delay::DelayNs;

// ── Shared timeline and call log ──────────────────────────────

/// Simulated nanoseconds since boot.
#[derive(Clone, Default)]
pub struct Timeline(Rc<Cell<u64>>);

impl Timeline {
    pub fn now_ms(&self) -> u64 {
        self.0.get() / 1_000_000
    }

    pub fn advance_ns(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    LinkBegin { at_ms: u64 },
    MqttConnect { at_ms: u64 },
    MqttSubscribe(String),
}

#[derive(Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<Call>>>);

#[allow(dead_code)]
impl CallLog {
    fn push(&self, call: Call) {
        self.0.borrow_mut().push(call);
    }

    pub fn snapshot(&self) -> Vec<Call> {
        self.0.borrow().clone()
    }

    pub fn clear(&self) {
        self.0.borrow_mut().clear();
    }

    pub fn link_begins(&self) -> usize {
        self.0
            .borrow()
            .iter()
            .filter(|c| matches!(c, Call::LinkBegin { .. }))
            .count()
    }

    pub fn mqtt_connects(&self) -> Vec<u64> {
        self.0
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::MqttConnect { at_ms } => Some(*at_ms),
                _ => None,
            })
            .collect()
    }
}

// ── FakeClock ─────────────────────────────────────────────────

pub struct FakeClock {
    timeline: Timeline,
}

impl FakeClock {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            timeline: timeline.clone(),
        }
    }
}

impl DelayNs for FakeClock {
    fn delay_ns(&mut self, ns: u32) {
        self.timeline.advance_ns(u64::from(ns));
    }

    fn delay_ms(&mut self, ms: u32) {
        self.timeline.advance_ns(u64::from(ms) * 1_000_000);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> u64 {
        self.timeline.now_ms()
    }
}

// ── FakeSerial ────────────────────────────────────────────────

/// Serial line that delivers scripted input once the timeline reaches its
/// timestamp and records every line written.
pub struct FakeSerial {
    timeline: Timeline,
    script: VecDeque<(u64, String)>,
    pub outbox: Vec<String>,
}

#[allow(dead_code)]
impl FakeSerial {
    pub fn new(timeline: &Timeline) -> Self {
        Self {
            timeline: timeline.clone(),
            script: VecDeque::new(),
            outbox: Vec::new(),
        }
    }

    /// Queue `line` to become readable at `at_ms`.  Lines must be pushed in
    /// timestamp order.
    pub fn push_at(&mut self, at_ms: u64, line: &str) {
        self.script.push_back((at_ms, line.to_string()));
    }

    /// Queue `line` to become readable immediately.
    pub fn push(&mut self, line: &str) {
        let now = self.timeline.now_ms();
        self.push_at(now, line);
    }

    pub fn take_output(&mut self) -> Vec<String> {
        std::mem::take(&mut self.outbox)
    }
}

impl SerialPort for FakeSerial {
    fn read_line(&mut self) -> Option<String> {
        let (at_ms, _) = self.script.front()?;
        if *at_ms > self.timeline.now_ms() {
            return None;
        }
        self.script.pop_front().map(|(_, line)| line.trim().to_string())
    }

    fn write_line(&mut self, line: &str) {
        self.outbox.push(line.to_string());
    }
}

// ── FakeLink ──────────────────────────────────────────────────

/// Wireless driver that joins a fixed delay after `begin`, or never.
pub struct FakeLink {
    timeline: Timeline,
    log: CallLog,
    join_delay_ms: Option<u64>,
    joined_at_ms: Option<u64>,
    dropped: bool,
}

#[allow(dead_code)]
impl FakeLink {
    pub fn joining_after(timeline: &Timeline, log: &CallLog, delay_ms: u64) -> Self {
        Self {
            timeline: timeline.clone(),
            log: log.clone(),
            join_delay_ms: Some(delay_ms),
            joined_at_ms: None,
            dropped: false,
        }
    }

    pub fn never_joining(timeline: &Timeline, log: &CallLog) -> Self {
        Self {
            join_delay_ms: None,
            ..Self::joining_after(timeline, log, 0)
        }
    }

    /// The access point disappears.
    pub fn drop_link(&mut self) {
        self.dropped = true;
    }

    /// The access point comes back and the driver re-associates on its own.
    pub fn restore(&mut self) {
        self.dropped = false;
        self.joined_at_ms = Some(self.timeline.now_ms());
    }
}

impl LinkDriver for FakeLink {
    fn begin(&mut self, _ssid: &str, _password: &str) -> Result<(), LinkDriverError> {
        let now = self.timeline.now_ms();
        self.log.push(Call::LinkBegin { at_ms: now });
        self.dropped = false;
        self.joined_at_ms = self.join_delay_ms.map(|d| now + d);
        Ok(())
    }

    fn is_connected(&self) -> bool {
        !self.dropped
            && self
                .joined_at_ms
                .is_some_and(|at| self.timeline.now_ms() >= at)
    }
}

// ── FakeMqtt ──────────────────────────────────────────────────

/// Broker session with scripted refusals.
pub struct FakeMqtt {
    timeline: Timeline,
    log: CallLog,
    refusals: VecDeque<TransportError>,
    refuse_always: Option<TransportError>,
    connected: bool,
    pub last_options: Option<(String, u16, String, String, String)>,
    pub subscriptions: Vec<String>,
    inbox: VecDeque<InboundMessage>,
}

#[allow(dead_code)]
impl FakeMqtt {
    pub fn new(timeline: &Timeline, log: &CallLog) -> Self {
        Self {
            timeline: timeline.clone(),
            log: log.clone(),
            refusals: VecDeque::new(),
            refuse_always: None,
            connected: false,
            last_options: None,
            subscriptions: Vec::new(),
            inbox: VecDeque::new(),
        }
    }

    /// Refuse the next attempt with `err`.
    pub fn refuse_next(&mut self, err: TransportError) {
        self.refusals.push_back(err);
    }

    /// Refuse every attempt with `err`.
    pub fn refuse_always(&mut self, err: TransportError) {
        self.refuse_always = Some(err);
    }

    pub fn accept(&mut self) {
        self.refuse_always = None;
    }

    pub fn drop_session(&mut self) {
        self.connected = false;
        self.subscriptions.clear();
    }

    /// Deliver a message on `topic`, subscribed or not.
    pub fn inject(&mut self, topic: &str, payload: &[u8]) {
        let msg = InboundMessage::new(topic, payload).expect("message within capacity");
        self.inbox.push_back(msg);
    }
}

impl MqttClient for FakeMqtt {
    fn connect(&mut self, options: &ConnectOptions<'_>) -> Result<(), TransportError> {
        self.log.push(Call::MqttConnect {
            at_ms: self.timeline.now_ms(),
        });
        self.last_options = Some((
            options.host.to_string(),
            options.port,
            options.client_id.to_string(),
            options.username.to_string(),
            options.password.to_string(),
        ));
        if let Some(err) = self.refusals.pop_front() {
            return Err(err);
        }
        if let Some(err) = self.refuse_always {
            return Err(err);
        }
        self.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::Disconnected);
        }
        self.log.push(Call::MqttSubscribe(topic.to_string()));
        self.subscriptions.push(topic.to_string());
        Ok(())
    }

    fn poll(&mut self) -> Option<InboundMessage> {
        self.inbox.pop_front()
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub fn test_config() -> NodeConfig {
    NodeConfig {
        version: "0.1".into(),
        bnn: "hive7".into(),
        device_number: 1,
        network_size: 3,
        wifi_ssid: "ApiaryNet".into(),
        wifi_password: "honeycomb".into(),
        mqtt_server: "broker.local".into(),
        mqtt_port: 1883,
        mqtt_user: "keeper@example.com".into(),
        mqtt_password: "s3cret".into(),
        topic_prefix: "keeper@example.com/hive7/".into(),
        debug: true,
    }
}

pub const COMMAND_TOPIC: &str = "keeper@example.com/hive7/cmd";

pub type TestSupervisor = Supervisor<FakeSerial, FakeLink, FakeMqtt, FakeClock>;

/// A supervisor over fakes, before boot.
pub struct Rig {
    pub timeline: Timeline,
    pub log: CallLog,
    pub supervisor: TestSupervisor,
}

#[allow(dead_code)]
impl Rig {
    /// The link joins 1 s after each `begin`; the broker accepts.
    pub fn new() -> Self {
        Self::build(|t, l| FakeLink::joining_after(t, l, 1_000))
    }

    pub fn with_link(make_link: impl FnOnce(&Timeline, &CallLog) -> FakeLink) -> Self {
        Self::build(make_link)
    }

    fn build(make_link: impl FnOnce(&Timeline, &CallLog) -> FakeLink) -> Self {
        let timeline = Timeline::default();
        let log = CallLog::default();
        let config = test_config();
        let supervisor = Supervisor::new(
            &config,
            FakeSerial::new(&timeline),
            FakeClock::new(&timeline),
            make_link(&timeline, &log),
            FakeMqtt::new(&timeline, &log),
        );
        Self {
            timeline,
            log,
            supervisor,
        }
    }

    pub fn serial(&mut self) -> &mut FakeSerial {
        &mut self.supervisor.node_mut().serial
    }

    pub fn link(&mut self) -> &mut FakeLink {
        self.supervisor.node_mut().link.driver_mut()
    }

    pub fn mqtt(&mut self) -> &mut FakeMqtt {
        self.supervisor.node_mut().transport.client_mut()
    }

    pub fn output(&mut self) -> Vec<String> {
        self.serial().take_output()
    }

    /// Run `n` cycles, advancing the timeline 10 ms after each.
    pub fn ticks(&mut self, n: usize) {
        for _ in 0..n {
            self.supervisor.tick();
            self.timeline.advance_ns(10_000_000);
        }
    }
}
