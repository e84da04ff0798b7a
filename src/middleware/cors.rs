use axum::http::{header, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};

pub fn permissive_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_methods(Any)
        .allow_headers(Any)
        .allow_origin(Any)
}

/// Restricts to the site origin when one is configured and parses.
pub fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return permissive_cors();
    };
    match HeaderValue::from_str(origin.trim()) {
        Ok(value) => CorsLayer::new()
            .allow_origin(value)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]),
        Err(e) => {
            tracing::warn!(origin = %origin, error = %e, "Ignoring unparsable CORS_ORIGIN");
            permissive_cors()
        }
    }
}
