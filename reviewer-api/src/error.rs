//! Mapping of service errors onto HTTP responses

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use reviewer_core::{Error, ErrorKind};
use serde::Serialize;

/// Error returned by every handler
#[derive(Debug)]
pub enum ApiError {
    /// Failure reported by a use case
    Service(Error),
    /// Body or query string that could not be decoded
    BadRequest(String),
    /// Request ran past the configured timeout
    Timeout,
    /// Request cut off because the server is shutting down
    Unavailable,
}

#[derive(Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl ApiError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", msg.clone()),
            ApiError::Timeout => (
                StatusCode::REQUEST_TIMEOUT,
                "TIMEOUT",
                "request timed out".to_string(),
            ),
            ApiError::Unavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "UNAVAILABLE",
                "server is shutting down".to_string(),
            ),
            ApiError::Service(err) => match err.kind() {
                ErrorKind::NotFound => (
                    StatusCode::NOT_FOUND,
                    "NOTFOUND",
                    "resource not found".to_string(),
                ),
                ErrorKind::TeamExists => (
                    StatusCode::BAD_REQUEST,
                    "TEAMEXISTS",
                    "team_name already exists".to_string(),
                ),
                ErrorKind::PrExists => (
                    StatusCode::CONFLICT,
                    "PREXISTS",
                    "PR id already exists".to_string(),
                ),
                ErrorKind::PrMerged => (
                    StatusCode::CONFLICT,
                    "PRMERGED",
                    "cannot reassign on merged PR".to_string(),
                ),
                ErrorKind::NotAssigned => (
                    StatusCode::CONFLICT,
                    "NOTASSIGNED",
                    "reviewer is not assigned to this PR".to_string(),
                ),
                ErrorKind::NoCandidate => (
                    StatusCode::CONFLICT,
                    "NOCANDIDATE",
                    "no active replacement candidate in team".to_string(),
                ),
                ErrorKind::Internal => (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "internal error".to_string(),
                ),
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        match &self {
            ApiError::Service(err) if status.is_server_error() => {
                tracing::error!(error = %err, "Request failed");
            }
            ApiError::Service(err) => {
                tracing::debug!(code, error = %err, "Request rejected");
            }
            ApiError::BadRequest(msg) => {
                tracing::debug!(error = %msg, "Malformed request");
            }
            ApiError::Timeout | ApiError::Unavailable => {
                tracing::warn!(code, "Request abandoned");
            }
        }

        (
            status,
            Json(ErrorBody {
                error: ErrorDetail { code, message },
            }),
        )
            .into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self::Service(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        let cases = [
            (Error::NotFound("x".into()), StatusCode::NOT_FOUND, "NOTFOUND"),
            (Error::TeamExists("x".into()), StatusCode::BAD_REQUEST, "TEAMEXISTS"),
            (Error::PrExists("x".into()), StatusCode::CONFLICT, "PREXISTS"),
            (Error::PrMerged("x".into()), StatusCode::CONFLICT, "PRMERGED"),
            (
                Error::NotAssigned {
                    pr_id: "p".into(),
                    user_id: "u".into(),
                },
                StatusCode::CONFLICT,
                "NOTASSIGNED",
            ),
            (Error::NoCandidate("x".into()), StatusCode::CONFLICT, "NOCANDIDATE"),
            (
                Error::Storage("disk full".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL",
            ),
        ];

        for (err, status, code) in cases {
            let (got_status, got_code, _) = ApiError::from(err).parts();
            assert_eq!(got_status, status);
            assert_eq!(got_code, code);
        }
    }

    #[test]
    fn test_abandoned_request_codes() {
        let (status, code, _) = ApiError::Timeout.parts();
        assert_eq!(status, StatusCode::REQUEST_TIMEOUT);
        assert_eq!(code, "TIMEOUT");

        let (status, code, _) = ApiError::Unavailable.parts();
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(code, "UNAVAILABLE");
    }

    #[test]
    fn test_internal_detail_not_exposed() {
        let (_, _, message) = ApiError::from(Error::Storage("secret dsn".into())).parts();
        assert_eq!(message, "internal error");
    }
}
