//! Document store error types.

use thiserror::Error;

/// Errors surfaced by [`DocumentStore`](super::DocumentStore) implementations.
///
/// Backend-specific failures (I/O, Automerge) are flattened into strings so
/// the error can be cloned and shared between waiters.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The path is malformed or names the wrong kind of node.
    #[error("Invalid document path '{path}': {reason}")]
    InvalidPath { path: String, reason: &'static str },

    /// The backend could not be reached or failed mid-operation. Retrying may succeed.
    #[error("Document store unavailable: {0}")]
    Unavailable(String),

    /// A stored document could not be decoded.
    #[error("Failed to decode document {path}: {reason}")]
    Codec { path: String, reason: String },
}

impl StoreError {
    pub(crate) fn invalid_path(path: impl Into<String>, reason: &'static str) -> Self {
        StoreError::InvalidPath {
            path: path.into(),
            reason,
        }
    }

    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_))
    }
}
