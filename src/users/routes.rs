use axum::{Router, routing::post};

use super::handler;
use crate::handler::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sign_up", post(handler::sign_up))
        .route("/sign_in", post(handler::sign_in))
}
