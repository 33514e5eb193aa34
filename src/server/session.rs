use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde_json::json;

use super::dto::{LoginRequest, SessionResponse};
use super::response::ApiResponse;
use crate::auth::{ClientMeta, LoginError, SESSION_COOKIE, session_token_from_headers};
use crate::server::AppState;

const COOKIE_MAX_AGE_SECONDS: i64 = 7 * 24 * 60 * 60;

fn session_cookie(token: &str, max_age: i64) -> String {
    format!(
        "{SESSION_COOKIE}={token}; HttpOnly; Secure; SameSite=Strict; Path=/; Max-Age={max_age}"
    )
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    client: ClientMeta,
    Json(req): Json<LoginRequest>,
) -> Response {
    let result = state.sessions.login(
        &req.password,
        req.bypass_token.as_deref(),
        &client.ip,
        client.user_agent.as_deref(),
        Utc::now(),
    );

    match result {
        Ok(grant) => {
            let cookie = session_cookie(&grant.token, COOKIE_MAX_AGE_SECONDS);
            (
                StatusCode::OK,
                [(header::SET_COOKIE, cookie)],
                Json(ApiResponse::success(SessionResponse {
                    expires_at: grant.session.expires_at,
                })),
            )
                .into_response()
        }
        Err(LoginError::RateLimited) => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "data": null, "error": "Too many attempts, try again later" })),
        )
            .into_response(),
        Err(LoginError::InvalidCredentials) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "data": null, "error": "Invalid password" })),
        )
            .into_response(),
        Err(LoginError::Store(e)) => {
            tracing::error!("login failed on store access: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "data": null, "error": "Internal server error" })),
            )
                .into_response()
        }
    }
}

pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token_from_headers(&headers) {
        if let Err(e) = state.sessions.revoke(&token) {
            tracing::error!("failed to revoke session: {e}");
        }
    }

    // Always clear the cookie, even if no session was presented.
    (
        StatusCode::OK,
        [(header::SET_COOKIE, session_cookie("", 0))],
        Json(ApiResponse::success(())),
    )
        .into_response()
}
