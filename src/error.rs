use thiserror::Error;

/// Errors from the few fallible edges of the crate (config and replay I/O).
/// Motion sampling itself never fails; bad input degrades to silence.
#[derive(Debug, Error)]
pub enum MotionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Unknown behavior preset: {0}")]
    UnknownPreset(String),
}

pub type Result<T> = std::result::Result<T, MotionError>;
