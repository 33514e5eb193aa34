use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};

use crate::auth::RequireSession;
use crate::server::AppState;
use crate::server::dto::AuditParams;
use crate::server::response::{ApiError, ApiResponse, StoreResultExt};

const DEFAULT_AUDIT_LIMIT: u32 = 100;
const MAX_AUDIT_LIMIT: u32 = 1000;

pub async fn list_login_attempts(
    _auth: RequireSession,
    State(state): State<Arc<AppState>>,
    Query(params): Query<AuditParams>,
) -> impl IntoResponse {
    let limit = params
        .limit
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .min(MAX_AUDIT_LIMIT);

    let attempts = state
        .store
        .list_login_attempts(limit)
        .api_err("Failed to list login attempts")?;

    Ok::<_, ApiError>(Json(ApiResponse::success(attempts)))
}
