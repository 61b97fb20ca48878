use thiserror::Error;

/// Custom error types for tunemill
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid path: {0}")]
    PathError(String),

    #[error("Scheduler bookkeeping error: {0}")]
    Bookkeeping(String),

    #[error("Unexpected error: {0}")]
    Other(String),
}

/// Result type for tunemill operations
pub type CoreResult<T> = std::result::Result<T, CoreError>;
