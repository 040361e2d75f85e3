//! Fuzz target: `InboundMessage::new`
//!
//! Arbitrary topic/payload pairs must either fit the fixed capacities
//! exactly or be rejected; nothing is truncated.
//!
//! cargo fuzz run fuzz_inbound_message

#![no_main]

use beenode::app::ports::{InboundMessage, PAYLOAD_CAP, TOPIC_CAP};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let split = data.first().map_or(0, |b| usize::from(*b)).min(data.len());
    let (head, payload) = data.split_at(split);
    let Ok(topic) = core::str::from_utf8(head) else {
        return;
    };

    match InboundMessage::new(topic, payload) {
        Some(msg) => {
            assert_eq!(msg.topic.as_str(), topic);
            assert_eq!(msg.payload.as_slice(), payload);
        }
        None => assert!(topic.len() > TOPIC_CAP || payload.len() > PAYLOAD_CAP),
    }
});
