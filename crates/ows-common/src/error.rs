//! Error types shared across the OWS Context crates.

use thiserror::Error;

/// Result type alias using OwsError.
pub type OwsResult<T> = Result<T, OwsError>;

/// Errors raised at the boundary between the context engine and the
/// services it talks to.
#[derive(Debug, Error)]
pub enum OwsError {
    // === Request Errors ===
    #[error("Invalid parameter value for '{param}': {message}")]
    InvalidParameter { param: String, message: String },

    #[error("Layer not found: {0}")]
    LayerNotFound(String),

    // === Document Errors ===
    #[error("Invalid capabilities document: {0}")]
    InvalidCapabilities(String),

    #[error("Invalid context document: {0}")]
    InvalidContext(String),

    // === Infrastructure Errors ===
    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl OwsError {
    /// Get the OGC exception code for this error.
    pub fn exception_code(&self) -> &'static str {
        match self {
            OwsError::InvalidParameter { .. } => "InvalidParameterValue",
            OwsError::LayerNotFound(_) => "LayerNotDefined",
            _ => "NoApplicableCode",
        }
    }

    /// Whether retrying the same request later could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, OwsError::ServiceUnavailable(_))
    }
}

impl From<std::io::Error> for OwsError {
    fn from(err: std::io::Error) -> Self {
        OwsError::InternalError(err.to_string())
    }
}

impl From<serde_json::Error> for OwsError {
    fn from(err: serde_json::Error) -> Self {
        OwsError::InvalidContext(format!("JSON error: {}", err))
    }
}
