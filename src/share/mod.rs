mod gate;
mod password;

pub use gate::{AccessDecision, ShareAccessGate};
pub use password::{PasswordHash, hash_password, verify_password};
