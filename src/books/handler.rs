use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::api::{BookRequest, MessageResponse, decode, parse_id};
use crate::error::ApiError;
use crate::handler::AppState;

const INVALID_BOOK_ID: &str = "Invalid Book ID";
const BOOK_NOT_FOUND: &str = "Book with specified id not found";

fn book_id(raw: &str, message: &str) -> Result<i64, ApiError> {
    parse_id(raw).ok_or_else(|| ApiError::invalid_request(message))
}

pub async fn create_book(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let new_book = decode::<BookRequest>(&body)?.into_new_book()?;

    let book = state
        .store
        .create_book(new_book)
        .await
        .map_err(|e| ApiError::internal("create book failed", e))?;

    tracing::info!(book_id = book.id, user_id = book.user_id, "book created");
    Ok((StatusCode::CREATED, Json(book)).into_response())
}

pub async fn list_books(State(state): State<AppState>) -> Result<Response, ApiError> {
    let books = state
        .store
        .list_books()
        .await
        .map_err(|e| ApiError::internal("Could not get the book list.", e))?;

    tracing::info!(count = books.len(), "got books");
    Ok((StatusCode::OK, Json(books)).into_response())
}

pub async fn get_book(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = book_id(&raw_id, INVALID_BOOK_ID)?;

    let book = state
        .store
        .get_book(id)
        .await
        .map_err(|e| ApiError::not_found(BOOK_NOT_FOUND, e))?;

    Ok((StatusCode::OK, Json(book)).into_response())
}

/// The body is validated before the path id, so a request that is wrong in
/// both ways reports the body.
pub async fn update_book(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    body: Bytes,
) -> Result<Response, ApiError> {
    let changes = decode::<BookRequest>(&body)?.into_changes()?;
    let id = book_id(&raw_id, "could not convert book id to integer")?;

    let book = state
        .store
        .update_book(id, changes)
        .await
        .map_err(|e| ApiError::not_found("Couldn't update", e))?;

    tracing::info!(book_id = book.id, "book updated");
    Ok((StatusCode::OK, Json(book)).into_response())
}

pub async fn delete_book(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = book_id(&raw_id, INVALID_BOOK_ID)?;

    state
        .store
        .delete_book(id)
        .await
        .map_err(|e| ApiError::not_found("Failed to delete", e))?;

    tracing::info!(book_id = id, "book deleted");
    Ok((StatusCode::OK, Json(MessageResponse::new("Delete completed"))).into_response())
}
