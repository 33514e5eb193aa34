use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::auth::RequireSession;
use crate::server::AppState;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::types::{SettingsScope, ShareOverrides, SharePolicy};

pub async fn get_global_settings(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let policy = state
        .store
        .get_global_policy()
        .api_err("Failed to read global settings")?
        .unwrap_or_default();

    Ok::<_, ApiError>(Json(ApiResponse::success(policy)))
}

pub async fn put_global_settings(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Json(policy): Json<SharePolicy>,
) -> impl IntoResponse {
    if policy.download_limit_window_minutes == 0 {
        return Err(ApiError::bad_request(
            "download_limit_window_minutes must be at least 1",
        ));
    }

    state
        .store
        .put_global_policy(&policy)
        .api_err("Failed to store global settings")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(policy)))
}

pub async fn get_project_settings(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .store
        .get_project(&id)
        .api_err("Failed to get project")?
        .or_not_found("Project not found")?;

    let overrides = state
        .store
        .get_overrides(SettingsScope::Project, &id)
        .api_err("Failed to read project settings")?
        .unwrap_or_default();

    Ok::<_, ApiError>(Json(ApiResponse::success(overrides)))
}

pub async fn put_project_settings(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(overrides): Json<ShareOverrides>,
) -> impl IntoResponse {
    state
        .store
        .get_project(&id)
        .api_err("Failed to get project")?
        .or_not_found("Project not found")?;

    state
        .store
        .put_overrides(SettingsScope::Project, &id, &overrides)
        .api_err("Failed to store project settings")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(overrides)))
}

pub async fn get_file_settings(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    state
        .store
        .get_file(&id)
        .api_err("Failed to get file")?
        .or_not_found("File not found")?;

    let overrides = state
        .store
        .get_overrides(SettingsScope::File, &id)
        .api_err("Failed to read file settings")?
        .unwrap_or_default();

    Ok::<_, ApiError>(Json(ApiResponse::success(overrides)))
}

pub async fn put_file_settings(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(overrides): Json<ShareOverrides>,
) -> impl IntoResponse {
    state
        .store
        .get_file(&id)
        .api_err("Failed to get file")?
        .or_not_found("File not found")?;

    state
        .store
        .put_overrides(SettingsScope::File, &id, &overrides)
        .api_err("Failed to store file settings")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(overrides)))
}
