mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Project operations
    fn create_project(&self, project: &Project) -> Result<()>;
    fn get_project(&self, id: &str) -> Result<Option<Project>>;
    fn list_projects(&self) -> Result<Vec<Project>>;
    fn delete_project(&self, id: &str) -> Result<bool>;

    // File operations
    fn create_file(&self, file: &SharedFile) -> Result<()>;
    fn get_file(&self, id: &str) -> Result<Option<SharedFile>>;
    fn get_file_by_public_id(&self, public_id: &str) -> Result<Option<SharedFile>>;
    fn list_files(&self, project_id: Option<&str>) -> Result<Vec<SharedFile>>;
    fn delete_file(&self, id: &str) -> Result<bool>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session(&self, token_digest: &str) -> Result<Option<Session>>;
    fn delete_session(&self, token_digest: &str) -> Result<bool>;

    // Login audit trail
    fn append_login_attempt(
        &self,
        ip: &str,
        outcome: AttemptOutcome,
        user_agent: Option<&str>,
        attempted_at: DateTime<Utc>,
    ) -> Result<()>;
    fn count_failed_logins_since(&self, ip: &str, cutoff: DateTime<Utc>) -> Result<u32>;
    fn list_login_attempts(&self, limit: u32) -> Result<Vec<LoginAttempt>>;

    // Share settings tiers
    fn get_global_policy(&self) -> Result<Option<SharePolicy>>;
    fn put_global_policy(&self, policy: &SharePolicy) -> Result<()>;
    fn get_overrides(&self, scope: SettingsScope, scope_id: &str)
    -> Result<Option<ShareOverrides>>;
    fn put_overrides(
        &self,
        scope: SettingsScope,
        scope_id: &str,
        overrides: &ShareOverrides,
    ) -> Result<()>;

    // Share passwords
    fn put_share_password(&self, record: &SharePasswordRecord) -> Result<()>;
    fn get_share_password(&self, file_id: &str) -> Result<Option<SharePasswordRecord>>;
    fn delete_share_password(&self, file_id: &str) -> Result<bool>;

    // Download log
    fn count_downloads_since(
        &self,
        file_id: &str,
        ip: &str,
        cutoff: DateTime<Utc>,
    ) -> Result<u32>;
    /// Appends a log row and bumps the file counter in one transaction.
    fn record_download(
        &self,
        file_id: &str,
        ip: &str,
        user_agent: Option<&str>,
        downloaded_at: DateTime<Utc>,
    ) -> Result<()>;
    fn list_downloads(&self, file_id: &str, limit: u32) -> Result<Vec<DownloadLogEntry>>;

    fn close(&self) -> Result<()>;
}
