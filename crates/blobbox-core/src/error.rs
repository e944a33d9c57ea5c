use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid document name: {0}")]
    InvalidName(String),

    #[error("Unknown operation: {0}")]
    UnknownOperation(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CoreError>;
