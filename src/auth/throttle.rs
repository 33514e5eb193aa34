use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::store::Store;
use crate::types::AttemptOutcome;

/// Sliding-window brute-force guard keyed by client IP.
///
/// Failures age out of the window naturally; a success does not clear
/// them, so probing with decoy successes reveals nothing about lockout
/// state. Attempts rejected while locked are recorded as `Throttled` and
/// excluded from the count, keeping lockout duration bounded.
pub struct LoginThrottle {
    store: Arc<dyn Store>,
    max_attempts: u32,
    window: Duration,
}

impl LoginThrottle {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, max_attempts: u32, window_minutes: u32) -> Self {
        Self {
            store,
            max_attempts,
            window: Duration::minutes(i64::from(window_minutes)),
        }
    }

    /// True iff the IP has reached the failure cap within the window.
    pub fn is_locked(&self, ip: &str, now: DateTime<Utc>) -> Result<bool> {
        let failed = self
            .store
            .count_failed_logins_since(ip, now - self.window)?;
        Ok(failed >= self.max_attempts)
    }

    /// Appends one durable audit row for this attempt.
    pub fn record_attempt(
        &self,
        ip: &str,
        outcome: AttemptOutcome,
        user_agent: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<()> {
        self.store.append_login_attempt(ip, outcome, user_agent, now)
    }
}
