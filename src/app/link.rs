//! Link manager: joins the configured wireless network.

use log::{debug, info, warn};

use super::events::Reply;
use super::ports::{Clock, LinkDriver, SerialPort};
use super::status::StatusRegistry;
use crate::config::LINK_RETRY;
use crate::error::Error;
use crate::retry::{RetryPolicy, attempt_until};

/// Drives a [`LinkDriver`] through one bounded association attempt at a
/// time.  There is no background retry; a timed-out attempt stays failed
/// until `connect` is called again.
pub struct LinkManager<L> {
    driver: L,
    ssid: String,
    password: String,
    policy: RetryPolicy,
}

impl<L: LinkDriver> LinkManager<L> {
    pub fn new(driver: L, ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            driver,
            ssid: ssid.into(),
            password: password.into(),
            policy: LINK_RETRY,
        }
    }

    /// Replace the default 20 s / 500 ms policy.
    #[must_use]
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Start association and poll until joined or the deadline passes.
    ///
    /// On success marks the link connected and replies `WifiConnected`.
    /// On timeout replies `WifiTimeout` and leaves the status untouched.
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
        debug!("Connecting to WiFi '{}'...", self.ssid);

        if let Err(e) = self.driver.begin(&self.ssid, &self.password) {
            // The driver may still be associated from an earlier attempt,
            // so keep polling until the deadline.
            warn!("WiFi: begin rejected ({}), polling anyway", e);
        }

        let driver = &self.driver;
        match attempt_until(&self.policy, clock, |_| driver.is_connected().then_some(())) {
            Ok(()) => {
                status.set_link_state(true);
                info!("WiFi: connected to '{}'", self.ssid);
                Reply::WifiConnected.send(serial);
                Ok(())
            }
            Err(t) => {
                warn!("WiFi: timeout after {} ms ({} polls)", t.elapsed_ms, t.attempts);
                Reply::WifiTimeout.send(serial);
                Err(Error::LinkTimeout)
            }
        }
    }

    /// Live driver state, independent of the status record.
    pub fn is_connected(&self) -> bool {
        self.driver.is_connected()
    }

    pub fn driver(&self) -> &L {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut L {
        &mut self.driver
    }
}
