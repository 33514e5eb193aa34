mod models;
mod settings;

pub use models::*;
pub use settings::{Inheritable, SettingsScope, ShareOverrides, SharePolicy};
