use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub password: String,
    pub bypass_token: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateProjectRequest {
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateFileRequest {
    pub name: String,
    pub project_id: Option<String>,
    pub blob_url: String,
}

#[derive(Debug, Deserialize)]
pub struct SetFilePasswordRequest {
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ListFilesParams {
    pub project_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AuditParams {
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DownloadParams {
    pub password: Option<String>,
}
