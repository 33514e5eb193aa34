use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("corrupt share settings: {0}")]
    CorruptSettings(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
