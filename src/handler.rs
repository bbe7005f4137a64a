use std::sync::Arc;

use axum::{Json, response::IntoResponse};

use tracing::info;

use crate::api::MessageResponse;
use crate::store::EntityStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn EntityStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn EntityStore>) -> Self {
        AppState { store }
    }
}

pub async fn healthcheck() -> impl IntoResponse {
    info!("got healthcheck request");
    Json(MessageResponse::new("Hello, Bookers!"))
}
