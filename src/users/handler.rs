use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::{SignInRequest, SignUpRequest, UserResponse, decode};
use crate::error::ApiError;
use crate::handler::AppState;

pub async fn sign_up(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let new_user = decode::<SignUpRequest>(&body)?.validate()?;

    let user = state
        .store
        .create_user(new_user)
        .await
        .map_err(|e| ApiError::internal("sign up failed", e))?;

    tracing::info!(user_id = user.id, "user signed up");
    Ok((StatusCode::CREATED, Json(UserResponse { user })).into_response())
}

/// A missing match and a failing store both answer 401.
pub async fn sign_in(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let credentials = decode::<SignInRequest>(&body)?.validate()?;

    match state.store.find_user(credentials).await {
        Ok(user) => {
            tracing::info!(user_id = user.id, "user signed in");
            Ok((StatusCode::OK, Json(UserResponse { user })).into_response())
        }
        Err(e) if e.is_not_found() => Err(ApiError::InvalidCredentials),
        Err(e) => {
            tracing::warn!(error = %e, "sign in lookup failed");
            Err(ApiError::InvalidCredentials)
        }
    }
}
