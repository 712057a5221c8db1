//! HTTP error type
//!
//! Every handler returns [`ApiResult`]; the JSON body is
//! `{"message": .., "code": .., "field"?: ..}`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Invalid value for a named field (400)
    #[error("Invalid value for '{field}': {message}")]
    Validation { field: String, message: String },

    /// Missing or wrong agent key (403)
    #[error("{0}")]
    Forbidden(String),

    /// leadboard-common error
    #[error(transparent)]
    Common(#[from] leadboard_common::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Common(err) => match err {
                leadboard_common::Error::NotFound(_) => StatusCode::NOT_FOUND,
                leadboard_common::Error::Validation { .. } => StatusCode::BAD_REQUEST,
                leadboard_common::Error::Conflict(_) => StatusCode::CONFLICT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        use leadboard_common::Error as CommonError;

        let status = self.status();
        let (code, message, field) = match self {
            ApiError::BadRequest(msg) => ("BAD_REQUEST", msg, None),
            ApiError::Validation { field, message } => ("VALIDATION_ERROR", message, Some(field)),
            ApiError::Forbidden(msg) => ("FORBIDDEN", msg, None),
            ApiError::Common(err) => match err {
                CommonError::NotFound(msg) => ("NOT_FOUND", msg, None),
                CommonError::Validation { field, message } => {
                    ("VALIDATION_ERROR", message, Some(field))
                }
                CommonError::Conflict(msg) => ("CONFLICT", msg, None),
                other => {
                    // Storage details stay in the log
                    error!("Request failed: {}", other);
                    ("INTERNAL_ERROR", "Internal server error".to_string(), None)
                }
            },
        };

        let mut body = json!({
            "message": message,
            "code": code,
        });
        if let Some(field) = field {
            body["field"] = json!(field);
        }

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
