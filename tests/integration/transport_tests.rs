//! Transport manager: broker retry loop, subscription and inbound queue.

use beenode::app::status::StatusRegistry;
use beenode::app::transport::{INBOX_DEPTH, TransportManager, TransportSettings};
use beenode::error::{Error, TransportError};

use crate::mock_ports::{
    COMMAND_TOPIC, Call, CallLog, FakeClock, FakeMqtt, FakeSerial, Timeline, test_config,
};

struct Bench {
    timeline: Timeline,
    log: CallLog,
    status: StatusRegistry,
    clock: FakeClock,
    serial: FakeSerial,
    transport: TransportManager<FakeMqtt>,
}

impl Bench {
    fn new() -> Self {
        let timeline = Timeline::default();
        let log = CallLog::default();
        let config = test_config();
        Self {
            status: StatusRegistry::new(&config),
            clock: FakeClock::new(&timeline),
            serial: FakeSerial::new(&timeline),
            transport: TransportManager::new(
                FakeMqtt::new(&timeline, &log),
                TransportSettings::from_config(&config),
            ),
            timeline,
            log,
        }
    }

    fn connect(&mut self) -> Result<(), Error> {
        self.transport
            .connect(&mut self.status, &mut self.clock, &mut self.serial)
    }
}

#[test]
fn first_attempt_success_subscribes_once() {
    let mut b = Bench::new();

    assert_eq!(b.connect(), Ok(()));
    assert!(b.status.transport_connected());
    assert_eq!(b.serial.outbox, ["MqttConnected!"]);
    assert_eq!(b.transport.client().subscriptions, [COMMAND_TOPIC]);
    assert_eq!(
        b.log.snapshot(),
        [
            Call::MqttConnect { at_ms: 0 },
            Call::MqttSubscribe(COMMAND_TOPIC.to_string())
        ]
    );
}

#[test]
fn connects_with_configured_identity() {
    let mut b = Bench::new();
    b.connect().unwrap();

    let (host, port, client_id, user, password) = b.transport.client().last_options.clone().unwrap();
    assert_eq!(host, "broker.local");
    assert_eq!(port, 1883);
    assert_eq!(client_id, "hive7_1");
    assert_eq!(user, "keeper@example.com");
    assert_eq!(password, "s3cret");
}

#[test]
fn retries_every_five_seconds_and_reports_each_failure() {
    let mut b = Bench::new();
    b.transport.client_mut().refuse_next(TransportError::BadCredentials);
    b.transport.client_mut().refuse_next(TransportError::ConnectFailed);

    assert_eq!(b.connect(), Ok(()));
    assert_eq!(b.log.mqtt_connects(), [0, 5_000, 10_000]);
    assert_eq!(
        b.serial.outbox,
        ["MQTT Error code: 4", "MQTT Error code: -2", "MqttConnected!"]
    );
    assert_eq!(b.transport.client().subscriptions, [COMMAND_TOPIC]);
}

#[test]
fn times_out_within_one_interval_of_thirty_seconds() {
    let mut b = Bench::new();
    b.transport.client_mut().refuse_always(TransportError::Unavailable);

    assert_eq!(b.connect(), Err(Error::TransportTimeout));
    let elapsed = b.timeline.now_ms();
    assert!((30_000..=35_000).contains(&elapsed), "elapsed {elapsed} ms");
    assert_eq!(b.log.mqtt_connects(), [0, 5_000, 10_000, 15_000, 20_000, 25_000]);
    assert!(!b.status.transport_connected());
    assert!(b.transport.client().subscriptions.is_empty());
    assert_eq!(b.serial.outbox.last().map(String::as_str), Some("MqttTimeout"));
    assert_eq!(
        b.serial.outbox.iter().filter(|l| *l == "MQTT Error code: 3").count(),
        6
    );
}

#[test]
fn connect_marks_transport_down_before_trying() {
    let mut b = Bench::new();
    b.status.set_transport_state(true);
    b.transport.client_mut().refuse_always(TransportError::ConnectionTimeout);

    assert_eq!(b.connect(), Err(Error::TransportTimeout));
    assert!(!b.status.transport_connected());
}

#[test]
fn service_queues_command_topic_in_order() {
    let mut b = Bench::new();
    b.connect().unwrap();
    b.transport.client_mut().inject(COMMAND_TOPIC, b"1_echo");
    b.transport.client_mut().inject("keeper@example.com/hive7/telemetry", b"1_echo");
    b.transport.client_mut().inject(COMMAND_TOPIC, b"2_getInfo");

    assert_eq!(b.transport.service(), 2);
    assert_eq!(b.transport.next_frame().as_deref(), Some("1_echo"));
    assert_eq!(b.transport.next_frame().as_deref(), Some("2_getInfo"));
    assert_eq!(b.transport.next_frame(), None);
}

#[test]
fn service_drops_non_utf8_payloads() {
    let mut b = Bench::new();
    b.connect().unwrap();
    b.transport.client_mut().inject(COMMAND_TOPIC, &[0xff, 0xfe, b'_']);
    b.transport.client_mut().inject(COMMAND_TOPIC, b"1_getInfo");

    assert_eq!(b.transport.service(), 2);
    assert_eq!(b.transport.next_frame().as_deref(), Some("1_getInfo"));
    assert_eq!(b.transport.next_frame(), None);
}

#[test]
fn full_inbox_leaves_rest_with_client() {
    let mut b = Bench::new();
    b.connect().unwrap();
    let sent: Vec<String> = (0..INBOX_DEPTH + 3).map(|i| format!("1_echo{i}")).collect();
    for frame in &sent {
        b.transport.client_mut().inject(COMMAND_TOPIC, frame.as_bytes());
    }

    assert_eq!(b.transport.service(), INBOX_DEPTH);
    // Nothing more fits until the loop drains.
    assert_eq!(b.transport.service(), 0);

    let mut delivered = Vec::new();
    for _ in 0..4 {
        b.transport.service();
        while let Some(frame) = b.transport.next_frame() {
            delivered.push(frame);
        }
    }
    assert_eq!(delivered, sent);
}
