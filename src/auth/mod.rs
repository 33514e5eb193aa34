mod middleware;
mod session;
mod throttle;

pub use middleware::{AuthError, ClientMeta, RequireSession, SESSION_COOKIE, session_token_from_headers};
pub use session::{LoginError, SessionGrant, SessionManager};
pub use throttle::LoginThrottle;
