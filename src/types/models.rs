use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Metadata for one shared file. The bytes themselves live in the blob
/// store; `blob_url` is where the gate redirects once access is granted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedFile {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub name: String,
    /// Unguessable key embedded in the public share link.
    pub public_id: String,
    pub blob_url: String,
    /// Absolute cutoff computed once at registration time. Later settings
    /// edits do not move it.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    pub download_count: i64,
    pub created_at: DateTime<Utc>,
}

/// An admin session row. Only the SHA-256 digest of the cookie token is
/// stored; the raw token never touches the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(skip)]
    pub token_digest: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptOutcome {
    Success,
    Failed,
    /// Rejected while the IP was locked out. Kept in the audit trail but
    /// excluded from the lockout window count.
    Throttled,
}

impl AttemptOutcome {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AttemptOutcome::Success => "success",
            AttemptOutcome::Failed => "failed",
            AttemptOutcome::Throttled => "throttled",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(AttemptOutcome::Success),
            "failed" => Some(AttemptOutcome::Failed),
            "throttled" => Some(AttemptOutcome::Throttled),
            _ => None,
        }
    }
}

/// One row of the login audit trail. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginAttempt {
    pub id: i64,
    pub ip: String,
    pub outcome: AttemptOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub attempted_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharePasswordRecord {
    pub file_id: String,
    #[serde(skip)]
    pub hash: String,
    #[serde(skip)]
    pub salt: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadLogEntry {
    pub id: i64,
    pub file_id: String,
    pub ip: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    pub downloaded_at: DateTime<Utc>,
}
