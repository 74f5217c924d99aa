//! Error types for AppShelf.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Not found: {0}")]
    RecordNotFound(String),

    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Network failure: {0}")]
    NetworkFailure(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Cancelled: {0}")]
    Cancelled(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Coarse classification used when turning an error into an inert UI state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    StorageUnavailable,
    RecordNotFound,
    QuotaExceeded,
    NetworkFailure,
    InvalidInput,
    Cancelled,
    Internal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
            Error::RecordNotFound(_) => ErrorKind::RecordNotFound,
            Error::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            Error::NetworkFailure(_) => ErrorKind::NetworkFailure,
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Cancelled(_) => ErrorKind::Cancelled,
            Error::Database(_)
            | Error::Io(_)
            | Error::Json(_)
            | Error::Config(_)
            | Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Short text shown in place of the content that failed to load.
    pub fn user_message(&self) -> &'static str {
        match self.kind() {
            ErrorKind::StorageUnavailable => "Local storage is unavailable.",
            ErrorKind::RecordNotFound => "That item no longer exists.",
            ErrorKind::QuotaExceeded => "Not enough local storage space.",
            ErrorKind::NetworkFailure => "Network request failed. Check your connection and try again.",
            ErrorKind::InvalidInput => "Please check the input and try again.",
            ErrorKind::Cancelled => "Request cancelled.",
            ErrorKind::Internal => "Something went wrong.",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_groups_internal_variants() {
        assert_eq!(Error::Database("x".into()).kind(), ErrorKind::Internal);
        assert_eq!(Error::Config("x".into()).kind(), ErrorKind::Internal);
        assert_eq!(
            Error::RecordNotFound("document 1".into()).kind(),
            ErrorKind::RecordNotFound
        );
    }

    #[test]
    fn test_user_message_never_leaks_detail() {
        let err = Error::NetworkFailure("dns error: api.openalex.org".into());
        assert!(!err.user_message().contains("openalex"));
        assert!(err.to_string().contains("openalex"));
    }
}
