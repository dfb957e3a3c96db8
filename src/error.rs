use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("malformed document: {0}")]
    Malformed(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    AlreadyExists(String),

    /// A write was skipped because the stored data is at least as new.
    #[error("{0}")]
    NoChange(String),

    /// A mutation affected nothing right after existence was confirmed.
    #[error("{0}")]
    Inconsistency(String),
}

pub type Result<T> = std::result::Result<T, Error>;
