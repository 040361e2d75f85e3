//! Command router: address filter and verb dispatch.
//!
//! Every node in a fleet receives every frame on the shared command topic,
//! so a frame addressed elsewhere is the normal case and is dropped without
//! a trace.  Unknown verbs are likewise silent apart from a debug log.
//!
//! The router holds no state between frames.  Effects run through the
//! [`CommandEffects`] seam, which the supervisor implements over its link
//! and transport managers.

use log::debug;

use super::commands::{CommandFrame, Verb};

/// What a dispatched verb does.
pub trait CommandEffects {
    /// Write the fixed acknowledgement line.
    fn echo(&mut self);
    /// Run the link connect sequence.
    fn connect_link(&mut self);
    /// Run the transport connect sequence.
    fn connect_transport(&mut self);
    /// Write the current status record.
    fn report_status(&mut self);
}

/// How a frame was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dispatch {
    /// Blank input.
    Empty,
    /// Addressed to another node.
    Unaddressed,
    /// Addressed here, verb not recognised.
    UnknownVerb,
    /// Verb executed.
    Handled(Verb),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRouter {
    device_number: u16,
}

impl CommandRouter {
    pub fn new(device_number: u16) -> Self {
        Self { device_number }
    }

    pub fn device_number(&self) -> u16 {
        self.device_number
    }

    /// Parse and filter without running anything.
    pub fn route(&self, line: &str) -> Result<Verb, Dispatch> {
        let frame = CommandFrame::parse(line).ok_or(Dispatch::Empty)?;
        if !frame.is_addressed_to(self.device_number) {
            return Err(Dispatch::Unaddressed);
        }
        frame.verb.parse().map_err(|_| {
            debug!("Unknown command: {}", frame.verb);
            Dispatch::UnknownVerb
        })
    }

    /// Route `line` and run its verb against `effects`.
    pub fn dispatch<E: CommandEffects>(&self, line: &str, effects: &mut E) -> Dispatch {
        let verb = match self.route(line) {
            Ok(verb) => verb,
            Err(outcome) => return outcome,
        };
        debug!("Running '{}'", verb);
        match verb {
            Verb::Echo => effects.echo(),
            Verb::ConnectWifi => effects.connect_link(),
            Verb::ConnectMqtt => effects.connect_transport(),
            Verb::GetInfo => effects.report_status(),
        }
        Dispatch::Handled(verb)
    }
}
