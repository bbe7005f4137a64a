use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

/// JSON body of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Outcome of a request that did not succeed. Each handler picks the variant,
/// and with it the status code, that a store failure turns into.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    InvalidRequest(String),

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{message}")]
    NotFound {
        message: &'static str,
        source: StoreError,
    },

    #[error("{message}")]
    Internal {
        message: &'static str,
        source: StoreError,
    },
}

impl ApiError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        ApiError::InvalidRequest(message.into())
    }

    pub fn not_found(message: &'static str, source: StoreError) -> Self {
        ApiError::NotFound { message, source }
    }

    pub fn internal(message: &'static str, source: StoreError) -> Self {
        ApiError::Internal { message, source }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ApiError::NotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();

        let body = match self {
            ApiError::InvalidRequest(error) => {
                tracing::info!(status = status.as_u16(), error = %error, "rejected request");
                ErrorBody { error, message: None }
            }
            ApiError::InvalidCredentials => {
                tracing::info!(status = status.as_u16(), "sign in rejected");
                ErrorBody {
                    error: "invalid credentials".to_string(),
                    message: None,
                }
            }
            ApiError::NotFound { message, source } => {
                tracing::warn!(status = status.as_u16(), error = %source, "{}", message);
                ErrorBody {
                    error: source.to_string(),
                    message: Some(message.to_string()),
                }
            }
            ApiError::Internal { message, source } => {
                tracing::error!(status = status.as_u16(), error = %source, "{}", message);
                ErrorBody {
                    error: source.to_string(),
                    message: Some(message.to_string()),
                }
            }
        };

        (status, Json(body)).into_response()
    }
}
