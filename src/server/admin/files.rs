use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::RequireSession;
use crate::server::AppState;
use crate::server::dto::{CreateFileRequest, ListFilesParams, SetFilePasswordRequest};
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::share::hash_password;
use crate::types::{SharePasswordRecord, SharedFile};

pub async fn list_files(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListFilesParams>,
) -> impl IntoResponse {
    let files = state
        .store
        .list_files(params.project_id.as_deref())
        .api_err("Failed to list files")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(files)))
}

/// Registers file metadata after the bytes landed in the blob store.
/// `expires_at` is stamped here from the effective `expiry_days` and is
/// not revisited when settings change later.
pub async fn create_file(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateFileRequest>,
) -> impl IntoResponse {
    if req.name.trim().is_empty() {
        return Err(ApiError::bad_request("File name cannot be empty"));
    }
    if req.blob_url.trim().is_empty() {
        return Err(ApiError::bad_request("Blob URL cannot be empty"));
    }

    if let Some(ref project_id) = req.project_id {
        state
            .store
            .get_project(project_id)
            .api_err("Failed to check project")?
            .or_not_found("Project not found")?;
    }

    let policy = state
        .gate
        .policy_for_project(req.project_id.as_deref())
        .api_err("Failed to resolve share policy")?;

    let now = Utc::now();
    let expires_at = policy
        .expiry_days
        .map(|days| now + Duration::days(i64::from(days)));

    let file = SharedFile {
        id: Uuid::new_v4().to_string(),
        project_id: req.project_id,
        name: req.name.trim().to_string(),
        public_id: Uuid::new_v4().to_string(),
        blob_url: req.blob_url,
        expires_at,
        download_count: 0,
        created_at: now,
    };

    state
        .store
        .create_file(&file)
        .api_err("Failed to create file")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(file))))
}

pub async fn get_file(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let file = state
        .store
        .get_file(&id)
        .api_err("Failed to get file")?
        .or_not_found("File not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(file)))
}

pub async fn delete_file(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_file(&id)
        .api_err("Failed to delete file")?;

    if !deleted {
        return Err(ApiError::not_found("File not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}

pub async fn list_file_downloads(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .store
        .get_file(&id)
        .api_err("Failed to get file")?
        .or_not_found("File not found")?;

    let downloads = state
        .store
        .list_downloads(&id, 200)
        .api_err("Failed to list downloads")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(downloads)))
}

pub async fn set_file_password(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<SetFilePasswordRequest>,
) -> impl IntoResponse {
    if req.password.is_empty() {
        return Err(ApiError::bad_request("Password cannot be empty"));
    }

    state
        .store
        .get_file(&id)
        .api_err("Failed to get file")?
        .or_not_found("File not found")?;

    let derived = hash_password(&req.password);
    let record = SharePasswordRecord {
        file_id: id,
        hash: derived.hash,
        salt: derived.salt,
        created_at: Utc::now(),
    };

    state
        .store
        .put_share_password(&record)
        .api_err("Failed to store share password")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(())))
}

pub async fn clear_file_password(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .store
        .delete_share_password(&id)
        .api_err("Failed to clear share password")?;

    // Clearing an absent password is not an error.
    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
