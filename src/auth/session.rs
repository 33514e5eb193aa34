use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use rand::RngCore;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;

use super::throttle::LoginThrottle;
use crate::config::AuthConfig;
use crate::error;
use crate::store::Store;
use crate::types::{AttemptOutcome, Session};

const TOKEN_PREFIX: &str = "sbx";
const TOKEN_BYTES: usize = 32;
const SESSION_TTL_DAYS: i64 = 7;

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("too many attempts, try again later")]
    RateLimited,

    #[error("invalid password")]
    InvalidCredentials,

    #[error(transparent)]
    Store(#[from] error::Error),
}

/// A freshly issued session together with the raw cookie token. The raw
/// token exists only here; the store keeps its digest.
#[derive(Debug)]
pub struct SessionGrant {
    pub token: String,
    pub session: Session,
}

/// Issues, validates, and revokes admin sessions.
///
/// Secrets are injected at construction; nothing is read from ambient
/// state, so the manager can be tested with throwaway credentials.
pub struct SessionManager {
    store: Arc<dyn Store>,
    admin_password: String,
    bypass_token: Option<String>,
    throttle: LoginThrottle,
}

impl SessionManager {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: &AuthConfig) -> Self {
        let throttle =
            LoginThrottle::new(store.clone(), config.max_attempts, config.window_minutes);
        Self {
            store,
            admin_password: config.admin_password.clone(),
            bypass_token: config.bypass_token.clone(),
            throttle,
        }
    }

    /// Authenticates the administrator and mints a session.
    ///
    /// A matching bypass token short-circuits both the throttle and the
    /// password check; it exists to recover from lockouts. Every call
    /// appends exactly one audit row whatever the outcome.
    pub fn login(
        &self,
        password: &str,
        bypass_token: Option<&str>,
        ip: &str,
        user_agent: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SessionGrant, LoginError> {
        let bypass_ok = match (bypass_token, &self.bypass_token) {
            (Some(supplied), Some(expected)) => secrets_match(supplied, expected),
            _ => false,
        };

        if bypass_ok {
            self.throttle
                .record_attempt(ip, AttemptOutcome::Success, user_agent, now)?;
            tracing::info!(%ip, "admin login via bypass token");
            return Ok(self.issue(now)?);
        }

        if self.throttle.is_locked(ip, now)? {
            self.throttle
                .record_attempt(ip, AttemptOutcome::Throttled, user_agent, now)?;
            tracing::warn!(%ip, "admin login rejected: attempt window exhausted");
            return Err(LoginError::RateLimited);
        }

        if !secrets_match(password, &self.admin_password) {
            self.throttle
                .record_attempt(ip, AttemptOutcome::Failed, user_agent, now)?;
            tracing::warn!(%ip, "admin login failed");
            return Err(LoginError::InvalidCredentials);
        }

        self.throttle
            .record_attempt(ip, AttemptOutcome::Success, user_agent, now)?;
        tracing::info!(%ip, "admin login succeeded");
        Ok(self.issue(now)?)
    }

    /// Looks up the session for a raw cookie token. Absent or expired
    /// sessions yield `None`; expired rows are left in place.
    pub fn validate(&self, token: &str, now: DateTime<Utc>) -> error::Result<Option<Session>> {
        let Some(session) = self.store.get_session(&digest(token))? else {
            return Ok(None);
        };
        if now >= session.expires_at {
            return Ok(None);
        }
        Ok(Some(session))
    }

    /// Logs out. Revoking an unknown token is not an error.
    pub fn revoke(&self, token: &str) -> error::Result<()> {
        self.store.delete_session(&digest(token))?;
        Ok(())
    }

    fn issue(&self, now: DateTime<Utc>) -> error::Result<SessionGrant> {
        let mut bytes = [0u8; TOKEN_BYTES];
        OsRng.fill_bytes(&mut bytes);
        let token = format!("{TOKEN_PREFIX}_{}", URL_SAFE_NO_PAD.encode(bytes));

        let session = Session {
            token_digest: digest(&token),
            created_at: now,
            expires_at: now + Duration::days(SESSION_TTL_DAYS),
        };
        self.store.create_session(&session)?;

        Ok(SessionGrant { token, session })
    }
}

fn digest(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn secrets_match(supplied: &str, expected: &str) -> bool {
    supplied.as_bytes().ct_eq(expected.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;

    fn manager(bypass: Option<&str>) -> SessionManager {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store.initialize().unwrap();
        let config = AuthConfig {
            admin_password: "correct horse".to_string(),
            bypass_token: bypass.map(str::to_string),
            max_attempts: 3,
            window_minutes: 15,
        };
        SessionManager::new(store as Arc<dyn Store>, &config)
    }

    #[test]
    fn test_login_issues_validatable_session() {
        let manager = manager(None);
        let now = Utc::now();

        let grant = manager
            .login("correct horse", None, "1.2.3.4", Some("Mozilla"), now)
            .unwrap();
        assert!(grant.token.starts_with("sbx_"));

        let session = manager.validate(&grant.token, now).unwrap().unwrap();
        assert_eq!(session.expires_at, now + Duration::days(7));
    }

    #[test]
    fn test_session_lifetime_boundaries() {
        let manager = manager(None);
        let now = Utc::now();
        let grant = manager
            .login("correct horse", None, "1.2.3.4", None, now)
            .unwrap();

        let almost = now + Duration::days(7) - Duration::hours(1);
        assert!(manager.validate(&grant.token, almost).unwrap().is_some());

        let past = now + Duration::days(7) + Duration::hours(1);
        assert!(manager.validate(&grant.token, past).unwrap().is_none());
    }

    #[test]
    fn test_wrong_password_is_rejected() {
        let manager = manager(None);
        let err = manager
            .login("wrong", None, "1.2.3.4", None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, LoginError::InvalidCredentials));
    }

    #[test]
    fn test_lockout_rejects_even_correct_password() {
        let manager = manager(None);
        let now = Utc::now();

        for _ in 0..3 {
            let _ = manager.login("wrong", None, "1.2.3.4", None, now);
        }

        let err = manager
            .login("correct horse", None, "1.2.3.4", None, now)
            .unwrap_err();
        assert!(matches!(err, LoginError::RateLimited));

        // a different IP still gets through
        assert!(manager
            .login("correct horse", None, "5.6.7.8", None, now)
            .is_ok());
    }

    #[test]
    fn test_bypass_token_ignores_lockout() {
        let manager = manager(Some("rescue-me"));
        let now = Utc::now();

        for _ in 0..3 {
            let _ = manager.login("wrong", None, "1.2.3.4", None, now);
        }
        assert!(matches!(
            manager.login("correct horse", None, "1.2.3.4", None, now),
            Err(LoginError::RateLimited)
        ));

        let grant = manager
            .login("", Some("rescue-me"), "1.2.3.4", None, now)
            .unwrap();
        assert!(manager.validate(&grant.token, now).unwrap().is_some());
    }

    #[test]
    fn test_wrong_bypass_token_falls_through_to_password() {
        let manager = manager(Some("rescue-me"));
        let now = Utc::now();

        let err = manager
            .login("wrong", Some("not-the-token"), "1.2.3.4", None, now)
            .unwrap_err();
        assert!(matches!(err, LoginError::InvalidCredentials));

        assert!(manager
            .login("correct horse", Some("not-the-token"), "1.2.3.4", None, now)
            .is_ok());
    }

    #[test]
    fn test_bypass_ignored_when_not_configured() {
        let manager = manager(None);
        let err = manager
            .login("wrong", Some("anything"), "1.2.3.4", None, Utc::now())
            .unwrap_err();
        assert!(matches!(err, LoginError::InvalidCredentials));
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let manager = manager(None);
        let now = Utc::now();
        let grant = manager
            .login("correct horse", None, "1.2.3.4", None, now)
            .unwrap();

        manager.revoke(&grant.token).unwrap();
        assert!(manager.validate(&grant.token, now).unwrap().is_none());

        // revoking again is fine
        manager.revoke(&grant.token).unwrap();
        manager.revoke("sbx_never-issued").unwrap();
    }

    #[test]
    fn test_garbage_token_does_not_validate() {
        let manager = manager(None);
        assert!(manager
            .validate("sbx_bogus", Utc::now())
            .unwrap()
            .is_none());
    }
}
