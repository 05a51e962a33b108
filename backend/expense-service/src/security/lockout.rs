//! Brute-force lockout tracking.
//!
//! The machine itself is stateless: everything it decides on lives in the two
//! persisted account fields `loginAttempts` and `lockUntil`, read-modify-write
//! per attempt. The threshold-crossing increment must go through the store's
//! atomic increment so it cannot be lost under concurrent attempts.

use chrono::{DateTime, Duration, Utc};

/// Lockout policy knobs. Reference policy: 5 attempts, 15 minute lock.
#[derive(Debug, Clone, Copy)]
pub struct LockoutPolicy {
    pub max_attempts: i32,
    pub lock_duration: Duration,
}

impl LockoutPolicy {
    pub fn new(max_attempts: i32, lock_duration: Duration) -> Self {
        Self {
            max_attempts,
            lock_duration,
        }
    }

    /// When a lock entered at `now` expires.
    pub fn lock_until(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now + self.lock_duration
    }

    /// True when the post-increment attempt count crosses the threshold.
    pub fn should_lock(&self, attempts_after_increment: i32) -> bool {
        attempts_after_increment >= self.max_attempts
    }
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self::new(5, Duration::minutes(15))
    }
}

/// Lock state derived from the persisted `lockUntil` field at `now`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    /// No lock on record; evaluate the attempt normally.
    Open,
    /// A lock is on record but its window has passed. The triggering attempt
    /// clears the stale fields before being evaluated as open, so a failed
    /// unlocking attempt leaves the counter at 1 rather than 0.
    Lapsed,
    /// Lock window still running; deny without touching any field.
    Locked(DateTime<Utc>),
}

pub fn evaluate(lock_until: Option<DateTime<Utc>>, now: DateTime<Utc>) -> LockState {
    match lock_until {
        Some(until) if until > now => LockState::Locked(until),
        Some(_) => LockState::Lapsed,
        None => LockState::Open,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_lock_is_open() {
        assert_eq!(evaluate(None, Utc::now()), LockState::Open);
    }

    #[test]
    fn future_lock_is_locked() {
        let now = Utc::now();
        let until = now + Duration::minutes(10);
        assert_eq!(evaluate(Some(until), now), LockState::Locked(until));
    }

    #[test]
    fn past_lock_is_lapsed_not_locked() {
        let now = Utc::now();
        assert_eq!(
            evaluate(Some(now - Duration::seconds(1)), now),
            LockState::Lapsed
        );
    }

    #[test]
    fn lock_expiring_exactly_now_is_lapsed() {
        let now = Utc::now();
        assert_eq!(evaluate(Some(now), now), LockState::Lapsed);
    }

    #[test]
    fn threshold_is_reached_at_max_attempts() {
        let policy = LockoutPolicy::default();
        assert!(!policy.should_lock(4));
        assert!(policy.should_lock(5));
        assert!(policy.should_lock(6));
    }

    #[test]
    fn lock_window_matches_policy_duration() {
        let policy = LockoutPolicy::new(5, Duration::minutes(15));
        let now = Utc::now();
        assert_eq!(policy.lock_until(now), now + Duration::minutes(15));
    }
}
