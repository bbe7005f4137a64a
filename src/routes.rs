use anyhow::{Context, Result, bail};
use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, header},
    routing::get,
};
use tower_http::{cors::CorsLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

use crate::books;
use crate::handler::{AppState, healthcheck};
use crate::users;

const ALLOWED_METHODS: [Method; 6] = [
    Method::GET,
    Method::POST,
    Method::PUT,
    Method::PATCH,
    Method::DELETE,
    Method::OPTIONS,
];

fn allowed_headers() -> [HeaderName; 5] {
    [
        header::ORIGIN,
        HeaderName::from_static("x-requested-with"),
        header::CONTENT_TYPE,
        header::ACCEPT,
        header::AUTHORIZATION,
    ]
}

/// Cross-origin policy. Any `OPTIONS` request is answered here with a bare
/// 200 and never reaches a handler. Credentials rule out a `*` origin.
pub fn cors(origin: &str) -> Result<CorsLayer> {
    if origin.trim() == "*" {
        bail!("cors origin must name a single origin, `*` cannot be combined with credentials");
    }
    let origin = origin
        .parse::<HeaderValue>()
        .with_context(|| format!("invalid cors origin {origin:?}"))?;

    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(ALLOWED_METHODS)
        .allow_headers(allowed_headers())
        .allow_credentials(true))
}

/// `CorsLayer` only lists methods and headers on preflights, so these are
/// stamped onto every other response as well.
fn policy_headers() -> Result<(HeaderValue, HeaderValue)> {
    let methods = ALLOWED_METHODS.iter().map(Method::as_str).collect::<Vec<_>>().join(", ");
    let headers = allowed_headers()
        .iter()
        .map(HeaderName::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    Ok((HeaderValue::from_str(&methods)?, HeaderValue::from_str(&headers)?))
}

pub fn router(state: AppState, cors_origin: &str) -> Result<Router> {
    let (methods, headers) = policy_headers()?;

    let app = Router::new()
        .route("/", get(healthcheck))
        .nest("/users", users::routes())
        .nest("/books", books::routes())
        .layer(cors(cors_origin)?)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            methods,
        ))
        .layer(SetResponseHeaderLayer::if_not_present(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            headers,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}
