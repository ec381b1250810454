use thiserror::Error;

/// Errors surfaced by profile parsing and tree construction.
///
/// The JSON entry points in [`crate::api`] never propagate these across the
/// boundary; they are rendered into `{"success": false, "error": ...}`
/// responses there.
#[derive(Error, Debug)]
pub enum TreeError {
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("missing-value handler code out of range: {0}")]
    InvalidMissingHandler(i32),

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
