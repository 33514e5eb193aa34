//! # Sharebox
//!
//! A file-sharing server, usable both as a standalone binary and as a library.
//! Administrators authenticate into a dashboard session and hand out public
//! share links; every anonymous download passes through the access gate
//! (expiry, enablement, share password, per-IP rate window) before being
//! redirected to the blob store.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! sharebox = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sharebox::config::AuthConfig;
//! use sharebox::server::{AppState, create_router};
//! use sharebox::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/sharebox.db").unwrap();
//! store.initialize().unwrap();
//!
//! let auth = AuthConfig {
//!     admin_password: "change-me".into(),
//!     bypass_token: None,
//!     max_attempts: 5,
//!     window_minutes: 15,
//! };
//! let state = Arc::new(AppState::new(Arc::new(store), &auth));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the server binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod server;
pub mod share;
pub mod store;
pub mod types;
