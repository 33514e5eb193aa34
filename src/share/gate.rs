use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::password::verify_password;
use crate::error::Result;
use crate::store::Store;
use crate::types::{SettingsScope, SharePolicy, SharedFile};

/// Terminal outcome of one download request.
///
/// Unknown, expired, and disabled links are all `NotFound`; callers must
/// not be able to tell them apart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    Allowed { url: String },
    NotFound,
    /// A password is required and none was supplied.
    PasswordRequired,
    /// Wrong password, or a required password record is missing.
    Forbidden,
    RateLimited,
}

/// Decides, for every anonymous download request, whether it may proceed.
pub struct ShareAccessGate {
    store: Arc<dyn Store>,
}

impl ShareAccessGate {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Runs the full authorization pipeline for one request.
    ///
    /// A granted request appends a download-log row and bumps the file
    /// counter as one unit before `Allowed` is returned. Denied requests
    /// never consume a download slot.
    pub fn check(
        &self,
        public_id: &str,
        supplied_password: Option<&str>,
        ip: &str,
        user_agent: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<AccessDecision> {
        let Some(file) = self.store.get_file_by_public_id(public_id)? else {
            return Ok(AccessDecision::NotFound);
        };

        if let Some(expires_at) = file.expires_at {
            if now >= expires_at {
                return Ok(AccessDecision::NotFound);
            }
        }

        let policy = self.effective_policy(&file)?;

        if !policy.enabled {
            return Ok(AccessDecision::NotFound);
        }

        if policy.password_required {
            let Some(record) = self.store.get_share_password(&file.id)? else {
                tracing::error!(
                    file_id = %file.id,
                    "share password required but none is stored; denying access"
                );
                return Ok(AccessDecision::Forbidden);
            };

            let Some(supplied) = supplied_password else {
                return Ok(AccessDecision::PasswordRequired);
            };
            if !verify_password(supplied, &record.hash, &record.salt) {
                return Ok(AccessDecision::Forbidden);
            }
        }

        if let Some(limit) = policy.download_limit_per_ip {
            let cutoff = now - Duration::minutes(i64::from(policy.download_limit_window_minutes));
            let recent = self.store.count_downloads_since(&file.id, ip, cutoff)?;
            if recent >= limit {
                return Ok(AccessDecision::RateLimited);
            }
        }

        self.store.record_download(&file.id, ip, user_agent, now)?;

        Ok(AccessDecision::Allowed { url: file.blob_url })
    }

    /// Effective policy for an existing file: its own overrides, then its
    /// project's, floored at the global tier.
    pub fn effective_policy(&self, file: &SharedFile) -> Result<SharePolicy> {
        let global = self.store.get_global_policy()?.unwrap_or_default();
        let project = match &file.project_id {
            Some(project_id) => self.store.get_overrides(SettingsScope::Project, project_id)?,
            None => None,
        };
        let file_tier = self.store.get_overrides(SettingsScope::File, &file.id)?;

        Ok(global.resolve(project.as_ref(), file_tier.as_ref()))
    }

    /// Policy seen by a file registered right now, before any file-level
    /// overrides exist. Used to stamp `expires_at` at upload time.
    pub fn policy_for_project(&self, project_id: Option<&str>) -> Result<SharePolicy> {
        let global = self.store.get_global_policy()?.unwrap_or_default();
        let project = match project_id {
            Some(project_id) => self.store.get_overrides(SettingsScope::Project, project_id)?,
            None => None,
        };

        Ok(global.resolve(project.as_ref(), None))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::share::password::hash_password;
    use crate::store::SqliteStore;
    use crate::types::{Inheritable, Project, ShareOverrides, SharePasswordRecord};

    struct Fixture {
        store: Arc<SqliteStore>,
        gate: ShareAccessGate,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        store.initialize().unwrap();
        let gate = ShareAccessGate::new(store.clone() as Arc<dyn Store>);
        Fixture { store, gate }
    }

    fn add_file(store: &SqliteStore, id: &str, expires_at: Option<DateTime<Utc>>) -> SharedFile {
        let file = SharedFile {
            id: id.to_string(),
            project_id: None,
            name: format!("{id}.bin"),
            public_id: format!("pub-{id}"),
            blob_url: format!("https://blobs.example/{id}"),
            expires_at,
            download_count: 0,
            created_at: Utc::now(),
        };
        store.create_file(&file).unwrap();
        file
    }

    #[test]
    fn test_unknown_link_is_not_found() {
        let f = fixture();
        let decision = f
            .gate
            .check("nope", None, "10.0.0.1", None, Utc::now())
            .unwrap();
        assert_eq!(decision, AccessDecision::NotFound);
    }

    #[test]
    fn test_expired_link_is_not_found_even_with_password() {
        let f = fixture();
        let now = Utc::now();
        add_file(&f.store, "f1", Some(now - Duration::hours(1)));

        let decision = f
            .gate
            .check("pub-f1", Some("whatever"), "10.0.0.1", None, now)
            .unwrap();
        assert_eq!(decision, AccessDecision::NotFound);

        // no slot consumed on a denied request
        assert_eq!(f.store.get_file("f1").unwrap().unwrap().download_count, 0);
    }

    #[test]
    fn test_disabled_link_is_not_found() {
        let f = fixture();
        add_file(&f.store, "f1", None);
        f.store
            .put_overrides(
                SettingsScope::File,
                "f1",
                &ShareOverrides {
                    enabled: Inheritable::Set(false),
                    ..ShareOverrides::default()
                },
            )
            .unwrap();

        let decision = f
            .gate
            .check("pub-f1", None, "10.0.0.1", None, Utc::now())
            .unwrap();
        assert_eq!(decision, AccessDecision::NotFound);
    }

    #[test]
    fn test_open_link_is_allowed_and_counted() {
        let f = fixture();
        add_file(&f.store, "f1", None);

        let decision = f
            .gate
            .check("pub-f1", None, "10.0.0.1", Some("curl"), Utc::now())
            .unwrap();
        assert_eq!(
            decision,
            AccessDecision::Allowed {
                url: "https://blobs.example/f1".to_string()
            }
        );

        let file = f.store.get_file("f1").unwrap().unwrap();
        assert_eq!(file.download_count, 1);
        assert_eq!(f.store.list_downloads("f1", 10).unwrap().len(), 1);
    }

    #[test]
    fn test_password_challenge_and_verification() {
        let f = fixture();
        add_file(&f.store, "f1", None);
        f.store
            .put_overrides(
                SettingsScope::File,
                "f1",
                &ShareOverrides {
                    password_required: Inheritable::Set(true),
                    ..ShareOverrides::default()
                },
            )
            .unwrap();
        let derived = hash_password("open sesame");
        f.store
            .put_share_password(&SharePasswordRecord {
                file_id: "f1".to_string(),
                hash: derived.hash,
                salt: derived.salt,
                created_at: Utc::now(),
            })
            .unwrap();

        let now = Utc::now();
        let missing = f.gate.check("pub-f1", None, "10.0.0.1", None, now).unwrap();
        assert_eq!(missing, AccessDecision::PasswordRequired);

        let wrong = f
            .gate
            .check("pub-f1", Some("let me in"), "10.0.0.1", None, now)
            .unwrap();
        assert_eq!(wrong, AccessDecision::Forbidden);

        // challenges and mismatches never consume a slot
        assert_eq!(f.store.get_file("f1").unwrap().unwrap().download_count, 0);

        let right = f
            .gate
            .check("pub-f1", Some("open sesame"), "10.0.0.1", None, now)
            .unwrap();
        assert!(matches!(right, AccessDecision::Allowed { .. }));
        assert_eq!(f.store.get_file("f1").unwrap().unwrap().download_count, 1);
    }

    #[test]
    fn test_password_required_without_record_is_forbidden() {
        let f = fixture();
        add_file(&f.store, "f1", None);
        f.store
            .put_overrides(
                SettingsScope::File,
                "f1",
                &ShareOverrides {
                    password_required: Inheritable::Set(true),
                    ..ShareOverrides::default()
                },
            )
            .unwrap();

        let decision = f
            .gate
            .check("pub-f1", Some("anything"), "10.0.0.1", None, Utc::now())
            .unwrap();
        assert_eq!(decision, AccessDecision::Forbidden);
    }

    #[test]
    fn test_rate_window_caps_per_ip() {
        let f = fixture();
        add_file(&f.store, "f1", None);
        f.store
            .put_overrides(
                SettingsScope::File,
                "f1",
                &ShareOverrides {
                    download_limit_per_ip: Inheritable::Set(Some(3)),
                    download_limit_window_minutes: Inheritable::Set(60),
                    ..ShareOverrides::default()
                },
            )
            .unwrap();

        let now = Utc::now();
        for _ in 0..3 {
            let decision = f.gate.check("pub-f1", None, "10.0.0.1", None, now).unwrap();
            assert!(matches!(decision, AccessDecision::Allowed { .. }));
        }

        let fourth = f.gate.check("pub-f1", None, "10.0.0.1", None, now).unwrap();
        assert_eq!(fourth, AccessDecision::RateLimited);

        // another IP is unaffected in the same window
        let other = f.gate.check("pub-f1", None, "10.0.0.2", None, now).unwrap();
        assert!(matches!(other, AccessDecision::Allowed { .. }));

        // the limited request left no trace
        assert_eq!(f.store.get_file("f1").unwrap().unwrap().download_count, 4);

        // outside the window the same IP is admitted again
        let later = now + Duration::minutes(61);
        let decision = f.gate.check("pub-f1", None, "10.0.0.1", None, later).unwrap();
        assert!(matches!(decision, AccessDecision::Allowed { .. }));
    }

    #[test]
    fn test_project_tier_applies_to_member_files() {
        let f = fixture();
        f.store
            .create_project(&Project {
                id: "p1".to_string(),
                name: "launch".to_string(),
                created_at: Utc::now(),
            })
            .unwrap();
        let file = SharedFile {
            id: "f1".to_string(),
            project_id: Some("p1".to_string()),
            name: "f1.bin".to_string(),
            public_id: "pub-f1".to_string(),
            blob_url: "https://blobs.example/f1".to_string(),
            expires_at: None,
            download_count: 0,
            created_at: Utc::now(),
        };
        f.store.create_file(&file).unwrap();

        f.store
            .put_overrides(
                SettingsScope::Project,
                "p1",
                &ShareOverrides {
                    enabled: Inheritable::Set(false),
                    ..ShareOverrides::default()
                },
            )
            .unwrap();

        let decision = f
            .gate
            .check("pub-f1", None, "10.0.0.1", None, Utc::now())
            .unwrap();
        assert_eq!(decision, AccessDecision::NotFound);

        // the file tier can re-enable sharing underneath the project tier
        f.store
            .put_overrides(
                SettingsScope::File,
                "f1",
                &ShareOverrides {
                    enabled: Inheritable::Set(true),
                    ..ShareOverrides::default()
                },
            )
            .unwrap();
        let decision = f
            .gate
            .check("pub-f1", None, "10.0.0.1", None, Utc::now())
            .unwrap();
        assert!(matches!(decision, AccessDecision::Allowed { .. }));
    }

    #[test]
    fn test_stored_password_is_ignored_when_not_required() {
        let f = fixture();
        add_file(&f.store, "f1", None);
        let derived = hash_password("secret");
        f.store
            .put_share_password(&SharePasswordRecord {
                file_id: "f1".to_string(),
                hash: derived.hash,
                salt: derived.salt,
                created_at: Utc::now(),
            })
            .unwrap();

        // effective policy does not demand a password, so none is asked for
        let decision = f
            .gate
            .check("pub-f1", None, "10.0.0.1", None, Utc::now())
            .unwrap();
        assert!(matches!(decision, AccessDecision::Allowed { .. }));
    }

    #[test]
    fn test_policy_for_project_ignores_file_tier() {
        let f = fixture();
        f.store
            .put_global_policy(&SharePolicy {
                expiry_days: Some(30),
                ..SharePolicy::default()
            })
            .unwrap();

        let policy = f.gate.policy_for_project(None).unwrap();
        assert_eq!(policy.expiry_days, Some(30));
    }
}
