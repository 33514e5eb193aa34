mod audit;
mod files;
mod projects;
mod settings;

use std::sync::Arc;

use axum::{
    Router,
    routing::{delete, get, put},
};

use crate::server::AppState;

pub fn admin_router() -> Router<Arc<AppState>> {
    Router::new()
        // Project routes
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/projects/{id}", get(projects::get_project))
        .route("/projects/{id}", delete(projects::delete_project))
        // File routes
        .route("/files", get(files::list_files).post(files::create_file))
        .route("/files/{id}", get(files::get_file))
        .route("/files/{id}", delete(files::delete_file))
        .route("/files/{id}/downloads", get(files::list_file_downloads))
        .route(
            "/files/{id}/password",
            put(files::set_file_password).delete(files::clear_file_password),
        )
        // Settings tiers
        .route(
            "/settings/share",
            get(settings::get_global_settings).put(settings::put_global_settings),
        )
        .route(
            "/projects/{id}/settings/share",
            get(settings::get_project_settings).put(settings::put_project_settings),
        )
        .route(
            "/files/{id}/settings/share",
            get(settings::get_file_settings).put(settings::put_file_settings),
        )
        // Audit trail
        .route("/audit/logins", get(audit::list_login_attempts))
}
