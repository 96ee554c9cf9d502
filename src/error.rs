use thiserror::Error;

/// Errors that can occur while building a mask, validating a
/// configuration or tracing.
///
/// Degenerate contours are not errors: they come back as trivial
/// paths (see [`crate::Path`]).
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TraceError {
    #[error("invalid input mask: {0}")]
    InvalidInput(String),

    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("failed to load image: {0}")]
    ImageLoad(String),

    #[error("failed to render preview: {0}")]
    Render(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
