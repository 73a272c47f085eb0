//! Poll pacing for rollout monitoring.
//!
//! The monitor asks a [`PollPolicy`] how long to sleep between status
//! polls and how long to keep watching overall. The default cadence is
//! a fixed 30-second interval; exponential backoff with jitter is
//! available as a strategy for long-running fleets.

use rollout_common::defaults::{DEFAULT_POLL_INTERVAL_SECS, DEFAULT_ROLLOUT_TIMEOUT_SECS};
use std::time::Duration;

/// Delay growth strategy between polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backoff {
    /// Same delay before every poll
    Fixed,
    /// Delay doubles after each poll, capped at `max_delay`
    Exponential,
}

/// Pacing and budget for a polling loop.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Delay before the second and later polls (initial delay under
    /// exponential backoff)
    pub interval: Duration,
    /// Cap for exponential growth
    pub max_delay: Duration,
    /// Wall-clock budget for the whole loop
    pub timeout: Duration,
    /// Jitter factor (0.0 - 1.0) applied on top of the computed delay
    pub jitter: f64,
    /// Growth strategy
    pub backoff: Backoff,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            max_delay: Duration::from_secs(120),
            timeout: Duration::from_secs(DEFAULT_ROLLOUT_TIMEOUT_SECS),
            jitter: 0.0,
            backoff: Backoff::Fixed,
        }
    }
}

impl PollPolicy {
    /// Fixed-interval policy with the given budget.
    pub fn fixed(interval: Duration, timeout: Duration) -> Self {
        Self {
            interval,
            timeout,
            backoff: Backoff::Fixed,
            ..Default::default()
        }
    }

    /// Exponential backoff policy with jitter.
    pub fn exponential(
        initial: Duration,
        max_delay: Duration,
        timeout: Duration,
        jitter: f64,
    ) -> Self {
        Self {
            interval: initial,
            max_delay,
            timeout,
            jitter,
            backoff: Backoff::Exponential,
        }
    }

    /// Delay to sleep after poll number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base = match self.backoff {
            Backoff::Fixed => self.interval,
            Backoff::Exponential => {
                let factor = 1u32 << attempt.min(16);
                self.interval
                    .checked_mul(factor)
                    .unwrap_or(self.max_delay)
                    .min(self.max_delay)
            }
        };
        jittered_delay(base, self.jitter)
    }
}

/// Add jitter to a delay to avoid synchronized polling.
fn jittered_delay(base: Duration, jitter_factor: f64) -> Duration {
    if jitter_factor <= 0.0 {
        return base;
    }
    use rand::Rng;
    let jitter = rand::thread_rng().gen_range(0.0..jitter_factor);
    Duration::from_secs_f64(base.as_secs_f64() * (1.0 + jitter))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_policy_delay_is_constant() {
        let policy = PollPolicy::fixed(Duration::from_secs(30), Duration::from_secs(1800));
        for attempt in 0..10 {
            assert_eq!(policy.delay_for(attempt), Duration::from_secs(30));
        }
    }

    #[test]
    fn exponential_policy_doubles_and_caps() {
        let policy = PollPolicy::exponential(
            Duration::from_secs(5),
            Duration::from_secs(60),
            Duration::from_secs(1800),
            0.0,
        );
        assert_eq!(policy.delay_for(0), Duration::from_secs(5));
        assert_eq!(policy.delay_for(1), Duration::from_secs(10));
        assert_eq!(policy.delay_for(2), Duration::from_secs(20));
        assert_eq!(policy.delay_for(3), Duration::from_secs(40));
        assert_eq!(policy.delay_for(4), Duration::from_secs(60));
        assert_eq!(policy.delay_for(30), Duration::from_secs(60));
    }

    #[test]
    fn jitter_stays_within_bounds() {
        let base = Duration::from_secs(10);
        for _ in 0..100 {
            let jittered = jittered_delay(base, 0.25);
            assert!(jittered >= base);
            assert!(jittered <= Duration::from_secs_f64(12.5));
        }
    }

    #[test]
    fn zero_jitter_is_identity() {
        let base = Duration::from_secs(30);
        assert_eq!(jittered_delay(base, 0.0), base);
    }

    #[test]
    fn default_matches_rollout_defaults() {
        let policy = PollPolicy::default();
        assert_eq!(policy.interval, Duration::from_secs(30));
        assert_eq!(policy.timeout, Duration::from_secs(1800));
        assert_eq!(policy.backoff, Backoff::Fixed);
    }
}
