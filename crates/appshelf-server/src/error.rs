//! Mapping of library errors onto HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tracing::{error, warn};

use appshelf_core::{Error, ErrorKind};

/// Handler error: wraps [`Error`] and renders `{ "error", "kind" }`.
#[derive(Debug)]
pub struct ApiError(pub Error);

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self(Error::InvalidInput(msg.into()))
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self(Error::RecordNotFound(what.into()))
    }

    pub fn status(&self) -> StatusCode {
        match self.0.kind() {
            ErrorKind::RecordNotFound => StatusCode::NOT_FOUND,
            ErrorKind::InvalidInput => StatusCode::BAD_REQUEST,
            ErrorKind::QuotaExceeded => StatusCode::PAYLOAD_TOO_LARGE,
            ErrorKind::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::NetworkFailure => StatusCode::BAD_GATEWAY,
            ErrorKind::Cancelled => StatusCode::REQUEST_TIMEOUT,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let kind = self.0.kind();
        // internal details stay in the log
        let message = if kind == ErrorKind::Internal {
            error!("Request failed: {}", self.0);
            self.0.user_message().to_string()
        } else {
            warn!("Request failed ({}): {}", status, self.0);
            self.0.to_string()
        };
        (status, Json(json!({ "error": message, "kind": kind }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (Error::RecordNotFound("x".into()), StatusCode::NOT_FOUND),
            (Error::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (Error::QuotaExceeded("x".into()), StatusCode::PAYLOAD_TOO_LARGE),
            (Error::StorageUnavailable("x".into()), StatusCode::SERVICE_UNAVAILABLE),
            (Error::NetworkFailure("x".into()), StatusCode::BAD_GATEWAY),
            (Error::Cancelled("x".into()), StatusCode::REQUEST_TIMEOUT),
            (Error::Database("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, status) in cases {
            assert_eq!(ApiError(err).status(), status);
        }
    }

    #[test]
    fn test_internal_detail_hidden() {
        let resp = ApiError(Error::Database("disk I/O at /secret/path".into())).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
