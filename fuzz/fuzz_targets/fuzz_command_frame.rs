//! Fuzz target: `CommandFrame::parse` + `CommandRouter::dispatch`
//!
//! Drives arbitrary text through the frame parser and the router and
//! asserts that parsing never panics, the address half never contains the
//! separator, and only frames carrying this node's exact address reach an
//! effect.
//!
//! cargo fuzz run fuzz_command_frame

#![no_main]

use beenode::app::commands::CommandFrame;
use beenode::app::router::{CommandEffects, CommandRouter, Dispatch};
use libfuzzer_sys::fuzz_target;

const DEVICE: u16 = 42;

#[derive(Default)]
struct Count(u32);

impl CommandEffects for Count {
    fn echo(&mut self) {
        self.0 += 1;
    }
    fn connect_link(&mut self) {
        self.0 += 1;
    }
    fn connect_transport(&mut self) {
        self.0 += 1;
    }
    fn report_status(&mut self) {
        self.0 += 1;
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };

    let frame = CommandFrame::parse(line);
    if let Some(f) = frame {
        assert!(!f.address.contains('_'), "address must stop at the first separator");
    }

    let mut effects = Count::default();
    match CommandRouter::new(DEVICE).dispatch(line, &mut effects) {
        Dispatch::Handled(_) => {
            assert_eq!(effects.0, 1);
            assert_eq!(frame.map(|f| f.address), Some("42"));
        }
        _ => assert_eq!(effects.0, 0),
    }
});
