use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use super::dto::DownloadParams;
use crate::auth::ClientMeta;
use crate::server::AppState;
use crate::share::AccessDecision;

/// Backs the public download endpoint. Outcomes collapse to generic
/// responses: a reader cannot distinguish unknown, expired, and disabled
/// links, nor which check rejected them.
pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(public_id): Path<String>,
    Query(params): Query<DownloadParams>,
    client: ClientMeta,
) -> Response {
    let decision = state.gate.check(
        &public_id,
        params.password.as_deref(),
        &client.ip,
        client.user_agent.as_deref(),
        Utc::now(),
    );

    match decision {
        Ok(AccessDecision::Allowed { url }) => Redirect::temporary(&url).into_response(),
        Ok(AccessDecision::NotFound) => (StatusCode::NOT_FOUND, "Not found").into_response(),
        Ok(AccessDecision::PasswordRequired) | Ok(AccessDecision::Forbidden) => {
            (StatusCode::FORBIDDEN, "Forbidden").into_response()
        }
        Ok(AccessDecision::RateLimited) => {
            (StatusCode::TOO_MANY_REQUESTS, "Try again later").into_response()
        }
        Err(e) => {
            // Fail closed: a store error denies the request.
            tracing::error!(%public_id, "share access check failed: {e}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}
