use async_trait::async_trait;
use thiserror::Error;

use crate::model::{Book, BookChanges, Credentials, NewBook, NewUser, User};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Failure reported by an [`EntityStore`]. Handlers decide which HTTP status
/// each kind maps to.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("{entity} not found")]
    NotFound { entity: &'static str },

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("storage failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str) -> Self {
        StoreError::NotFound { entity }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

impl From<libsql::Error> for StoreError {
    fn from(error: libsql::Error) -> Self {
        let msg = error.to_string();
        if msg.to_lowercase().contains("constraint") {
            StoreError::Constraint(msg)
        } else {
            StoreError::Backend(msg)
        }
    }
}

/// Durable storage for users and books.
///
/// Every call is a single read or write against the backing storage. The
/// store is shared by all in-flight requests, so implementations must be
/// safe for concurrent use.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn create_user(&self, user: NewUser) -> StoreResult<User>;

    /// Exact match on email and password. When several users match, the one
    /// with the lowest id wins.
    async fn find_user(&self, credentials: Credentials) -> StoreResult<User>;

    async fn create_book(&self, book: NewBook) -> StoreResult<Book>;

    async fn get_book(&self, id: i64) -> StoreResult<Book>;

    async fn list_books(&self) -> StoreResult<Vec<Book>>;

    async fn update_book(&self, id: i64, changes: BookChanges) -> StoreResult<Book>;

    async fn delete_book(&self, id: i64) -> StoreResult<()>;
}
