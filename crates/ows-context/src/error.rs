//! Error types for context operations.

use ows_common::OwsError;
use thiserror::Error;

use crate::path::FolderPathError;
use crate::resource::ResourceId;

/// Result type alias using OwsContextError.
pub type ContextResult<T> = Result<T, OwsContextError>;

#[derive(Debug, Error)]
pub enum OwsContextError {
    #[error("Invalid folder path: {0}")]
    FolderPath(#[from] FolderPathError),

    /// The flat resource order does not describe a valid tree.
    #[error("Invalid folder structure at index {index} ({folder}): {reason}")]
    InvalidFolderStructure {
        index: usize,
        folder: String,
        reason: String,
    },

    /// A resource references a parent folder that has not been seen yet.
    #[error("Parent {parent} of {folder} (index {index}) not found")]
    ParentNotFound {
        index: usize,
        folder: String,
        parent: String,
    },

    #[error("Invalid subtree at offset {offset}: {reason}")]
    InvalidSubtree { offset: usize, reason: String },

    #[error("Resource not found: {0}")]
    ResourceNotFound(ResourceId),

    #[error("Duplicate resource id: {0}")]
    DuplicateId(ResourceId),

    #[error("Cannot move {moved} below {target}: target is inside the moved subtree")]
    MoveIntoOwnSubtree { moved: ResourceId, target: ResourceId },

    #[error("Invalid URL '{href}': {source}")]
    InvalidUrl {
        href: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid context document: {0}")]
    InvalidDocument(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<OwsContextError> for OwsError {
    fn from(err: OwsContextError) -> Self {
        match err {
            OwsContextError::ResourceNotFound(id) => OwsError::LayerNotFound(id.to_string()),
            OwsContextError::InvalidUrl { href, source } => OwsError::InvalidParameter {
                param: "href".to_string(),
                message: format!("{}: {}", href, source),
            },
            other => OwsError::InvalidContext(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OwsContextError::InvalidFolderStructure {
            index: 3,
            folder: "/0/2".to_string(),
            reason: "sibling index gap after /0/0".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("index 3"));
        assert!(display.contains("/0/2"));
    }

    #[test]
    fn test_into_ows_error() {
        let err: OwsError = OwsContextError::ResourceNotFound(ResourceId::new("wald")).into();
        assert_eq!(err.exception_code(), "LayerNotDefined");

        let err: OwsError = OwsContextError::InvalidDocument("no features".into()).into();
        assert!(matches!(err, OwsError::InvalidContext(_)));
    }
}
