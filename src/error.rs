//! Error types
//!
//! Wrong-phase player actions are not errors; they are rejected with `false`
//! by the engine. Only conditions the host has to react to live here.

use thiserror::Error;

/// Failures surfaced by the round engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    /// The catalog is empty or none of its dishes has an image
    #[error("no dish with at least one image is available")]
    NoContentAvailable,
}

/// Failures of a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("could not serialize stored value: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Backend exists but refused the operation (quota, private mode, ...)
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// Failures while reading a dish catalog
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("could not read catalog: {0}")]
    Io(#[from] std::io::Error),
}
