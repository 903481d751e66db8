use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};

/// Restricts browsers to `origin` when one is configured, otherwise allows any.
pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.and_then(|o| o.parse::<HeaderValue>().ok()) {
        Some(origin) => layer.allow_origin(origin),
        None => {
            if let Some(raw) = origin {
                tracing::warn!(origin = raw, "ignoring unparseable CORS origin");
            }
            layer.allow_origin(Any)
        }
    }
}
