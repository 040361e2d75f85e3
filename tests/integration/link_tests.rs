//! Link manager: bounded association against the fake driver.

use beenode::app::link::LinkManager;
use beenode::app::status::StatusRegistry;
use beenode::error::Error;

use crate::mock_ports::{CallLog, FakeClock, FakeLink, FakeSerial, Timeline, test_config};

struct Bench {
    timeline: Timeline,
    status: StatusRegistry,
    clock: FakeClock,
    serial: FakeSerial,
}

impl Bench {
    fn new() -> Self {
        let timeline = Timeline::default();
        Self {
            status: StatusRegistry::new(&test_config()),
            clock: FakeClock::new(&timeline),
            serial: FakeSerial::new(&timeline),
            timeline,
        }
    }

    fn manager(&self, link: FakeLink) -> LinkManager<FakeLink> {
        let config = test_config();
        LinkManager::new(link, config.wifi_ssid, config.wifi_password)
    }
}

#[test]
fn joins_and_marks_link_up() {
    let mut b = Bench::new();
    let log = CallLog::default();
    let mut link = b.manager(FakeLink::joining_after(&b.timeline, &log, 1_200));

    let result = link.connect(&mut b.status, &mut b.clock, &mut b.serial);

    assert_eq!(result, Ok(()));
    assert!(b.status.link_connected());
    assert_eq!(b.serial.outbox, ["WifiConnected"]);
    // Observed on the first poll at or after the join.
    assert_eq!(b.timeline.now_ms(), 1_500);
    assert_eq!(log.link_begins(), 1);
}

#[test]
fn already_joined_returns_without_waiting() {
    let mut b = Bench::new();
    let log = CallLog::default();
    let mut link = b.manager(FakeLink::joining_after(&b.timeline, &log, 0));

    assert_eq!(link.connect(&mut b.status, &mut b.clock, &mut b.serial), Ok(()));
    assert_eq!(b.timeline.now_ms(), 0);
}

#[test]
fn times_out_after_twenty_seconds() {
    let mut b = Bench::new();
    let log = CallLog::default();
    let mut link = b.manager(FakeLink::never_joining(&b.timeline, &log));

    let result = link.connect(&mut b.status, &mut b.clock, &mut b.serial);

    assert_eq!(result, Err(Error::LinkTimeout));
    assert!(!b.status.link_connected());
    assert_eq!(b.serial.outbox, ["WifiTimeout"]);
    let elapsed = b.timeline.now_ms();
    assert!((20_000..=20_500).contains(&elapsed), "elapsed {elapsed} ms");
}

#[test]
fn timeout_leaves_previous_link_state_unchanged() {
    let mut b = Bench::new();
    let log = CallLog::default();
    b.status.set_link_state(true);
    let mut link = b.manager(FakeLink::never_joining(&b.timeline, &log));

    assert_eq!(
        link.connect(&mut b.status, &mut b.clock, &mut b.serial),
        Err(Error::LinkTimeout)
    );
    assert!(b.status.link_connected());
}

#[test]
fn each_call_is_one_bounded_attempt() {
    let mut b = Bench::new();
    let log = CallLog::default();
    let mut link = b.manager(FakeLink::never_joining(&b.timeline, &log));

    let _ = link.connect(&mut b.status, &mut b.clock, &mut b.serial);
    let _ = link.connect(&mut b.status, &mut b.clock, &mut b.serial);

    assert_eq!(log.link_begins(), 2);
    assert_eq!(b.serial.outbox, ["WifiTimeout", "WifiTimeout"]);
}
