//! Wire types for the JSON API and the validation that turns raw payloads
//! into store inputs.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::error::ApiError;
use crate::model::{BookChanges, Credentials, NewBook, NewUser, User};

pub const INVALID_REQUEST: &str = "Invalid request";

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: &str) -> Self {
        MessageResponse {
            message: message.to_owned(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub email: Option<String>,
    pub name: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignInRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

/// Body of both `POST /books` and `PATCH /books/:id`.
#[derive(Debug, Deserialize)]
pub struct BookRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub user_id: Option<i64>,
}

fn required_str(field: &str, value: Option<String>) -> Result<String, ApiError> {
    match value {
        Some(v) if !v.is_empty() => Ok(v),
        _ => {
            tracing::debug!(field, "required string field missing or empty");
            Err(ApiError::invalid_request(INVALID_REQUEST))
        }
    }
}

/// A zero integer counts as missing, the same as an absent field.
fn required_int(field: &str, value: Option<i64>) -> Result<i64, ApiError> {
    match value {
        Some(v) if v != 0 => Ok(v),
        _ => {
            tracing::debug!(field, "required integer field missing or zero");
            Err(ApiError::invalid_request(INVALID_REQUEST))
        }
    }
}

/// Decodes a JSON request body whatever its `Content-Type`. Every failure is a 400.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(reason = %e, "failed to decode request body");
        ApiError::invalid_request(INVALID_REQUEST)
    })
}

impl SignUpRequest {
    pub fn validate(self) -> Result<NewUser, ApiError> {
        Ok(NewUser {
            email: required_str("email", self.email)?,
            name: required_str("name", self.name)?,
            password: required_str("password", self.password)?,
        })
    }
}

impl SignInRequest {
    pub fn validate(self) -> Result<Credentials, ApiError> {
        Ok(Credentials {
            email: required_str("email", self.email)?,
            password: required_str("password", self.password)?,
        })
    }
}

impl BookRequest {
    pub fn into_new_book(self) -> Result<NewBook, ApiError> {
        Ok(NewBook {
            title: required_str("title", self.title)?,
            body: required_str("body", self.body)?,
            user_id: required_int("user_id", self.user_id)?,
        })
    }

    /// `user_id` must be present but is not applied: ownership never changes.
    pub fn into_changes(self) -> Result<BookChanges, ApiError> {
        let title = required_str("title", self.title)?;
        let body = required_str("body", self.body)?;
        required_int("user_id", self.user_id)?;
        Ok(BookChanges { title, body })
    }
}

/// Parses a `/books/:id` segment: optional sign, base 10.
pub fn parse_id(raw: &str) -> Option<i64> {
    raw.parse::<i64>().ok()
}
