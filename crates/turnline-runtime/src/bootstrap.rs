#![forbid(unsafe_code)]

//! Bounded discovery retry at startup.
//!
//! Hosts often attach the timeline before the conversation has rendered.
//! [`Bootstrap`] polls a [`DiscoveryChain`] at a fixed interval until it
//! yields at least one turn, giving up after a fixed number of attempts.
//! Giving up is not an error: the timeline just stays inactive.
//!
//! The delay is a fixed interval with no jitter, so tests can reproduce the
//! exact attempt schedule.

use std::time::Duration;

use turnline_core::discovery::{DiscoveryChain, DiscoveryMatch};
use web_time::Instant;

/// Where a bootstrap stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootstrapState {
    /// No attempt made yet.
    Idle,
    /// At least one attempt failed; more remain.
    Polling,
    /// Discovery succeeded.
    Ready,
    /// Every attempt failed.
    Exhausted,
}

/// Outcome of one bootstrap attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapStep {
    /// Discovery found turns.
    Found(DiscoveryMatch),
    /// Nothing yet; try again at the given instant.
    RetryAt(Instant),
    /// The last attempt failed; stop polling.
    Exhausted,
    /// Bootstrap already finished; nothing was attempted.
    Finished,
}

/// Fixed-interval, bounded discovery retry.
#[derive(Debug, Clone)]
pub struct Bootstrap {
    max_attempts: u32,
    interval: Duration,
    attempts: u32,
    state: BootstrapState,
}

impl Bootstrap {
    /// `max_attempts` is floored to 1.
    #[must_use]
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            interval,
            attempts: 0,
            state: BootstrapState::Idle,
        }
    }

    #[must_use]
    pub fn state(&self) -> BootstrapState {
        self.state
    }

    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    #[must_use]
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// True once discovery succeeded or every attempt was used.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        matches!(self.state, BootstrapState::Ready | BootstrapState::Exhausted)
    }

    /// Run one discovery attempt.
    ///
    /// A strategy that recognises the document but reports zero turns counts
    /// as a miss: the conversation may still be loading.
    pub fn attempt(&mut self, chain: &DiscoveryChain, now: Instant) -> BootstrapStep {
        if self.is_finished() {
            return BootstrapStep::Finished;
        }
        self.attempts += 1;

        if let Some(found) = chain.first_match().filter(|m| !m.turns.is_empty()) {
            self.state = BootstrapState::Ready;
            tracing::debug!(
                target: "turnline.bootstrap",
                attempt = self.attempts,
                strategy = found.strategy.as_str(),
                turns = found.turns.len(),
                "discovery succeeded"
            );
            return BootstrapStep::Found(found);
        }

        if self.attempts >= self.max_attempts {
            self.state = BootstrapState::Exhausted;
            tracing::warn!(
                target: "turnline.bootstrap",
                attempts = self.attempts,
                strategies = chain.len(),
                "no turns discovered; timeline stays inactive"
            );
            return BootstrapStep::Exhausted;
        }

        self.state = BootstrapState::Polling;
        tracing::trace!(
            target: "turnline.bootstrap",
            attempt = self.attempts,
            remaining = self.max_attempts - self.attempts,
            "discovery found nothing; retrying"
        );
        BootstrapStep::RetryAt(now + self.interval)
    }
}
