mod admin;
pub mod dto;
pub mod response;
mod router;
mod session;
mod share_link;

pub use admin::admin_router;
pub use router::{AppState, create_router};
