//! Error types for PrefStore
//!
//! Internal components return these; the caller-facing surface folds them
//! into a `bool` (commit) or a default value (reads).

use thiserror::Error;

/// Result type alias using PrefError
pub type Result<T> = std::result::Result<T, PrefError>;

/// Unified error type for PrefStore operations
#[derive(Debug, Error)]
pub enum PrefError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Snapshot decode failed: {0}")]
    Decode(String),

    #[error("Snapshot encode failed: {0}")]
    Encode(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}
