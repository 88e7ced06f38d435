//! Error types shared by both facades

use thiserror::Error;

/// Failure reported by a storage backend
#[derive(Debug, Error)]
pub enum StorageError {
    /// Backend-specific failure, carried as a message
    #[error("storage backend failed: {0}")]
    Backend(String),
    /// I/O failure underneath a backend
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors surfaced by `Kevast` and `KevastSync`
#[derive(Debug, Error)]
pub enum KevastError {
    /// A continuation was invoked more than once, or out of sequence
    #[error("next() called multiple times")]
    InvalidContinuation,
    /// `KevastSync` was given a storage that can defer
    #[error("type mismatch: {0}")]
    TypeMismatch(String),
    /// An interceptor rejected the operation
    #[error("interceptor failed: {0}")]
    Interceptor(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

pub type Result<T, E = KevastError> = std::result::Result<T, E>;
