//! Lockout Policy
//!
//! Decides whether an identifier is temporarily denied authentication based on
//! its recent login attempts.

use chrono::{DateTime, Duration, Utc};

use crate::domain::entity::login_attempt::LoginAttempt;

/// Default consecutive failures before lockout
pub const DEFAULT_MAX_FAILURES: u32 = 5;
/// Default window in which failures are counted (minutes)
pub const DEFAULT_WINDOW_MINUTES: i64 = 15;
/// Default lockout duration after the latest failure (minutes)
pub const DEFAULT_LOCKOUT_MINUTES: i64 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockoutPolicy {
    pub max_failures: u32,
    pub window: Duration,
    pub lockout: Duration,
}

impl Default for LockoutPolicy {
    fn default() -> Self {
        Self {
            max_failures: DEFAULT_MAX_FAILURES,
            window: Duration::minutes(DEFAULT_WINDOW_MINUTES),
            lockout: Duration::minutes(DEFAULT_LOCKOUT_MINUTES),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockoutDecision {
    Allowed,
    Locked { until: DateTime<Utc> },
}

impl LockoutDecision {
    #[inline]
    pub fn is_locked(&self) -> bool {
        matches!(self, LockoutDecision::Locked { .. })
    }
}

impl LockoutPolicy {
    /// A policy that never locks
    pub fn disabled() -> Self {
        Self {
            max_failures: 0,
            ..Default::default()
        }
    }

    /// Evaluate attempts ordered newest first.
    ///
    /// Failures are counted until the first success or the first attempt
    /// older than `window`. Reaching `max_failures` locks the identifier until
    /// `lockout` after the most recent failure.
    pub fn evaluate(
        &self,
        recent_attempts: &[LoginAttempt],
        now: DateTime<Utc>,
    ) -> LockoutDecision {
        if self.max_failures == 0 {
            return LockoutDecision::Allowed;
        }

        let window_start = now - self.window;
        let failures = recent_attempts
            .iter()
            .take_while(|a| !a.success && a.attempted_at >= window_start)
            .count();

        if failures < self.max_failures as usize {
            return LockoutDecision::Allowed;
        }

        // Newest-first ordering puts the latest failure at the head
        let Some(latest) = recent_attempts.first() else {
            return LockoutDecision::Allowed;
        };

        let until = latest.attempted_at + self.lockout;
        if now < until {
            LockoutDecision::Locked { until }
        } else {
            LockoutDecision::Allowed
        }
    }
}
