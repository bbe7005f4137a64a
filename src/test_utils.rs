//! Helpers shared by the HTTP tests: an app over an in-memory database and
//! a store that fails every call.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    Router,
    body::Body,
    http::{Method, Request, Response, StatusCode, header},
};
use serde_json::Value;
use tower::ServiceExt;

use crate::db::{Database, IN_MEMORY};
use crate::handler::AppState;
use crate::model::{Book, BookChanges, Credentials, NewBook, NewUser, User};
use crate::routes::router;
use crate::store::{EntityStore, StoreError, StoreResult};

pub const TEST_ORIGIN: &str = "http://localhost:3000";

pub struct TestApp {
    router: Router,
}

impl TestApp {
    pub async fn new() -> Self {
        let db = Database::open_local(IN_MEMORY)
            .await
            .expect("failed to open in-memory database");
        Self::with_store(Arc::new(db))
    }

    pub fn with_store(store: Arc<dyn EntityStore>) -> Self {
        let router = router(AppState::new(store), TEST_ORIGIN).expect("failed to build router");
        TestApp { router }
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("failed to build request");

        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible")
    }

    /// Sends a request and decodes the JSON response. An empty body decodes to `Value::Null`.
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        Self::decode(response).await
    }

    /// Sends `body` verbatim, with `content_type` if one is given.
    pub async fn send_raw(
        &self,
        method: Method,
        uri: &str,
        content_type: Option<&str>,
        body: &str,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let request = builder
            .body(Body::from(body.to_string()))
            .expect("failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        Self::decode(response).await
    }

    async fn decode(response: Response<Body>) -> (StatusCode, Value) {
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("failed to read body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("response body is not json")
        };
        (status, value)
    }
}

/// Store whose every call fails as if the database were unreachable.
pub struct FailingStore;

fn unreachable_store<T>() -> StoreResult<T> {
    Err(StoreError::Backend("connection refused".to_string()))
}

#[async_trait]
impl EntityStore for FailingStore {
    async fn create_user(&self, _user: NewUser) -> StoreResult<User> {
        unreachable_store()
    }

    async fn find_user(&self, _credentials: Credentials) -> StoreResult<User> {
        unreachable_store()
    }

    async fn create_book(&self, _book: NewBook) -> StoreResult<Book> {
        unreachable_store()
    }

    async fn get_book(&self, _id: i64) -> StoreResult<Book> {
        unreachable_store()
    }

    async fn list_books(&self) -> StoreResult<Vec<Book>> {
        unreachable_store()
    }

    async fn update_book(&self, _id: i64, _changes: BookChanges) -> StoreResult<Book> {
        unreachable_store()
    }

    async fn delete_book(&self, _id: i64) -> StoreResult<()> {
        unreachable_store()
    }
}

pub fn failing_app() -> TestApp {
    TestApp::with_store(Arc::new(FailingStore))
}
