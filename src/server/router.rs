use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;

use super::admin::admin_router;
use super::session;
use super::share_link;
use crate::auth::SessionManager;
use crate::config::AuthConfig;
use crate::share::ShareAccessGate;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub sessions: SessionManager,
    pub gate: ShareAccessGate,
}

impl AppState {
    #[must_use]
    pub fn new(store: Arc<dyn Store>, auth: &AuthConfig) -> Self {
        let sessions = SessionManager::new(store.clone(), auth);
        let gate = ShareAccessGate::new(store.clone());
        Self {
            store,
            sessions,
            gate,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/s/{public_id}", get(share_link::download))
        .route(
            "/api/v1/session",
            post(session::login).delete(session::logout),
        )
        .nest("/api/v1/admin", admin_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
