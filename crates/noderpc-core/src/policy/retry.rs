//! Failover retry policy: linear back-off past a threshold, hard ceiling.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the failover retry loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Failed attempts tolerated before back-off sleeps begin.
    #[serde(default = "default_threshold")]
    pub threshold: u32,
    /// Failed attempts after which the error is surfaced.
    #[serde(default = "default_ceiling")]
    pub ceiling: u32,
    /// Back-off multiplier, in units per failed attempt.
    #[serde(default = "default_factor")]
    pub factor: u32,
    /// Length of one back-off unit in milliseconds.
    #[serde(default = "default_unit_ms")]
    pub unit_ms: u64,
}

fn default_threshold() -> u32 { 2 }
fn default_ceiling() -> u32 { 10 }
fn default_factor() -> u32 { 5 }
fn default_unit_ms() -> u64 { 1_000 }

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            ceiling: default_ceiling(),
            factor: default_factor(),
            unit_ms: default_unit_ms(),
        }
    }
}

/// Stateless policy — computes the decision for a given attempt count.
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    pub config: RetryConfig,
}

/// What to do after a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Retry immediately.
    Retry,
    /// Sleep, then retry.
    Backoff(Duration),
    /// Surface the error.
    GiveUp,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    /// Back-off before retrying after `attempt` failures: `factor × attempt`
    /// units once `attempt` exceeds the threshold, nothing before.
    pub fn backoff(&self, attempt: u32) -> Option<Duration> {
        if attempt <= self.config.threshold {
            return None;
        }
        let units = u64::from(self.config.factor) * u64::from(attempt);
        Some(Duration::from_millis(units.saturating_mul(self.config.unit_ms)))
    }

    /// The ceiling is checked first, so a call never sleeps only to give up.
    pub fn decide(&self, attempt: u32) -> RetryDecision {
        if attempt >= self.config.ceiling {
            return RetryDecision::GiveUp;
        }
        match self.backoff(attempt) {
            Some(delay) => RetryDecision::Backoff(delay),
            None => RetryDecision::Retry,
        }
    }
}

/// Per-call retry state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryContext {
    attempt: u32,
}

impl RetryContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Record one failed attempt and return the new count.
    pub fn record_failure(&mut self) -> u32 {
        self.attempt += 1;
        self.attempt
    }
}
