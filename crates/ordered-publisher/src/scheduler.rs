//! Cooldown gate for recovery attempts.

use chrono::{DateTime, Utc};
use std::time::Duration;

/// Minimum spacing between two recovery attempts.
pub const RETRY_COOLDOWN: Duration = Duration::from_secs(30);

/// Tracks when recovery was last attempted.
///
/// Callers pass the current time in, so the gate is deterministic in tests.
#[derive(Debug, Clone)]
pub struct RetryScheduler {
    cooldown: chrono::Duration,
    last_attempt: Option<DateTime<Utc>>,
}

impl Default for RetryScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl RetryScheduler {
    pub fn new() -> Self {
        Self {
            cooldown: chrono::Duration::seconds(RETRY_COOLDOWN.as_secs() as i64),
            last_attempt: None,
        }
    }

    /// True with no prior attempt, or once the cooldown has fully elapsed.
    pub fn should_attempt(&self, now: DateTime<Utc>) -> bool {
        let Some(last) = self.last_attempt else {
            return true;
        };
        now >= last + self.cooldown
    }

    pub fn record_attempt(&mut self, now: DateTime<Utc>) {
        self.last_attempt = Some(now);
    }

    /// Time left before the next attempt is allowed; zero when allowed now.
    pub fn remaining(&self, now: DateTime<Utc>) -> Duration {
        let Some(last) = self.last_attempt else {
            return Duration::ZERO;
        };
        (last + self.cooldown - now).to_std().unwrap_or(Duration::ZERO)
    }

    pub fn last_attempt(&self) -> Option<DateTime<Utc>> {
        self.last_attempt
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_attempt_is_always_allowed() {
        let scheduler = RetryScheduler::new();
        assert!(scheduler.should_attempt(Utc::now()));
        assert_eq!(scheduler.remaining(Utc::now()), Duration::ZERO);
        assert!(scheduler.last_attempt().is_none());
    }

    #[test]
    fn cooldown_boundary_is_inclusive() {
        let mut scheduler = RetryScheduler::new();
        let start = Utc::now();
        scheduler.record_attempt(start);

        assert!(!scheduler.should_attempt(start));
        assert!(!scheduler.should_attempt(start + chrono::Duration::seconds(29)));
        assert!(!scheduler.should_attempt(start + chrono::Duration::milliseconds(29_999)));
        assert!(scheduler.should_attempt(start + chrono::Duration::seconds(30)));
        assert!(scheduler.should_attempt(start + chrono::Duration::seconds(31)));
    }

    #[test]
    fn remaining_counts_down() {
        let mut scheduler = RetryScheduler::new();
        let start = Utc::now();
        scheduler.record_attempt(start);

        assert_eq!(scheduler.remaining(start), RETRY_COOLDOWN);
        assert_eq!(
            scheduler.remaining(start + chrono::Duration::seconds(12)),
            Duration::from_secs(18)
        );
        assert_eq!(
            scheduler.remaining(start + chrono::Duration::seconds(45)),
            Duration::ZERO
        );
    }

    #[test]
    fn record_attempt_restarts_cooldown() {
        let mut scheduler = RetryScheduler::new();
        let start = Utc::now();
        scheduler.record_attempt(start);
        let later = start + chrono::Duration::seconds(30);
        scheduler.record_attempt(later);

        assert_eq!(scheduler.last_attempt(), Some(later));
        assert!(!scheduler.should_attempt(later + chrono::Duration::seconds(10)));
    }
}
