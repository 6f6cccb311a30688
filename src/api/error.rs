//! HTTP error envelope.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::VitalWatchError;

/// Error returned by every handler; rendered as `{"status":"error","message":...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<VitalWatchError> for ApiError {
    fn from(err: VitalWatchError) -> Self {
        let status = match &err {
            VitalWatchError::Validation(_) => StatusCode::BAD_REQUEST,
            VitalWatchError::Storage(_) | VitalWatchError::Config(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, error = %self.message, "Request failed");
        } else {
            tracing::debug!(status = %self.status, error = %self.message, "Request rejected");
        }
        let body = Json(json!({ "status": "error", "message": self.message }));
        (self.status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::StorageError;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (
                VitalWatchError::Validation("bad".into()),
                StatusCode::BAD_REQUEST,
            ),
            (
                VitalWatchError::Storage(StorageError::LockPoisoned),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (
                VitalWatchError::Config("bind".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }

    #[test]
    fn test_message_carries_error_text() {
        let err = ApiError::from(VitalWatchError::Validation("heart_rate missing".into()));
        assert!(err.message.contains("heart_rate missing"));
    }
}
