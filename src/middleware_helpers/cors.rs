use http::{header, HeaderName, HeaderValue, Method};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use super::REQUEST_ID_HEADER;
use crate::config::AppConfig;

/// CORS policy for the configured environment.
///
/// Returns `None` when no origins are configured and permissive CORS is not
/// allowed; the binary refuses to start in that case.
pub fn cors_layer(cfg: &AppConfig) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = cfg
        .cors_allowed_origins
        .as_deref()
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        // Session cookies need credentialed CORS, which rules out wildcards
        return Some(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::ACCEPT,
                    HeaderName::from_static(REQUEST_ID_HEADER),
                ])
                .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
                .allow_credentials(true),
        );
    }

    if cfg.should_allow_permissive_cors() {
        info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        return Some(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    None
}
