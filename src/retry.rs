//! Bounded polling waits.
//!
//! Every blocking wait in the node (link association, broker handshake,
//! boot sentinel watch) is an instance of the same loop:
//!
//! ```text
//!   attempt ──ok──▶ return value
//!      │
//!     fail
//!      ▼
//!   sleep(interval) ──elapsed < deadline──▶ attempt
//!      │
//!   elapsed ≥ deadline ──▶ Timeout
//! ```
//!
//! The clock is injected so the waits run instantly under a fake clock in
//! tests.

use crate::app::ports::Clock;

/// Interval between attempts and the overall deadline, both measured from
/// the moment the wait begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub interval_ms: u32,
    pub deadline_ms: u64,
}

impl RetryPolicy {
    pub const fn new(interval_ms: u32, deadline_ms: u64) -> Self {
        Self {
            interval_ms,
            deadline_ms,
        }
    }
}

/// The deadline passed without a successful attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeout {
    pub attempts: u32,
    pub elapsed_ms: u64,
}

/// Run `attempt` until it yields `Some`, sleeping `policy.interval_ms`
/// after every failure.  The deadline is checked after each sleep, so the
/// call returns no later than `deadline + interval`.
///
/// `attempt` receives the 1-based attempt number.
pub fn attempt_until<C, T, F>(policy: &RetryPolicy, clock: &mut C, mut attempt: F) -> Result<T, Timeout>
where
    C: Clock,
    F: FnMut(u32) -> Option<T>,
{
    let started = clock.now_ms();
    let mut attempts: u32 = 0;

    loop {
        attempts = attempts.saturating_add(1);
        if let Some(value) = attempt(attempts) {
            return Ok(value);
        }

        clock.delay_ms(policy.interval_ms);

        let elapsed_ms = clock.now_ms().saturating_sub(started);
        if elapsed_ms >= policy.deadline_ms {
            return Err(Timeout {
                attempts,
                elapsed_ms,
            });
        }
    }
}
