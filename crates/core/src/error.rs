//! Domain error model.

use serde::Serialize;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Stable error kind exposed to callers (API layer, reporting, tests).
///
/// The kind never changes for a given failure mode, even when the message does.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Authorization,
    StateConflict,
    NotFound,
    Consistency,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation_error",
            ErrorKind::Authorization => "authorization_error",
            ErrorKind::StateConflict => "state_conflict",
            ErrorKind::NotFound => "resource_not_found",
            ErrorKind::Consistency => "consistency_error",
            ErrorKind::Storage => "storage_error",
        }
    }
}

impl core::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain-level error.
///
/// Every public entry point reports failures through this type. Storage details
/// never travel inside it; adapters log them and hand back a generic message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (bad shape or range).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The actor lacks the capability or crossed a tenant boundary.
    #[error("unauthorized: {0}")]
    Authorization(String),

    /// An invalid state transition was requested.
    #[error("state conflict: {0}")]
    StateConflict(String),

    /// A referenced resource does not exist (within the caller's tenant).
    #[error("{0} not found")]
    NotFound(String),

    /// Data required by the operation is missing or inconsistent across tenants.
    #[error("consistency error: {0}")]
    Consistency(String),

    /// The backing store failed.
    #[error("storage error: {0}")]
    Storage(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Authorization(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::StateConflict(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn consistency(msg: impl Into<String>) -> Self {
        Self::Consistency(msg.into())
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DomainError::Validation(_) => ErrorKind::Validation,
            DomainError::Authorization(_) => ErrorKind::Authorization,
            DomainError::StateConflict(_) => ErrorKind::StateConflict,
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::Consistency(_) => ErrorKind::Consistency,
            DomainError::Storage(_) => ErrorKind::Storage,
        }
    }
}
