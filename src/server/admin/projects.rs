use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::RequireSession;
use crate::server::AppState;
use crate::server::dto::CreateProjectRequest;
use crate::server::response::{ApiError, ApiResponse, StoreOptionExt, StoreResultExt};
use crate::types::Project;

pub async fn list_projects(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let projects = state
        .store
        .list_projects()
        .api_err("Failed to list projects")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(projects)))
}

pub async fn create_project(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateProjectRequest>,
) -> impl IntoResponse {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(ApiError::bad_request("Project name cannot be empty"));
    }

    if state
        .store
        .list_projects()
        .api_err("Failed to check projects")?
        .iter()
        .any(|p| p.name == name)
    {
        return Err(ApiError::conflict("Project already exists"));
    }

    let project = Project {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        created_at: Utc::now(),
    };

    state
        .store
        .create_project(&project)
        .api_err("Failed to create project")?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(ApiResponse::success(project))))
}

pub async fn get_project(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let project = state
        .store
        .get_project(&id)
        .api_err("Failed to get project")?
        .or_not_found("Project not found")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(project)))
}

pub async fn delete_project(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let deleted = state
        .store
        .delete_project(&id)
        .api_err("Failed to delete project")?;

    if !deleted {
        return Err(ApiError::not_found("Project not found"));
    }

    Ok::<_, ApiError>(StatusCode::NO_CONTENT)
}
