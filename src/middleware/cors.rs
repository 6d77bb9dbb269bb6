//! CORS policy for browser clients.
//!
//! Policy:
//! - Development: permissive (Allow-Origin: *), WITHOUT credentials.
//! - Production: allowlist origins from Config (comma-separated env var), WITHOUT credentials.
//!
//! The identification header is always allowed so browser clients can present tokens.

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::{Config, IdentifierSource};

pub fn apply(router: Router, config: &Config) -> Router {
    let cors = if config.app_env.is_production() {
        // An empty allowlist allows nothing (no CORS headers).
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        let allow_origin = AllowOrigin::predicate(move |origin: &HeaderValue, _req| {
            allowed.iter().any(|v| v == origin)
        });

        CorsLayer::new().allow_origin(allow_origin)
    } else {
        CorsLayer::new().allow_origin(Any)
    };

    let mut allow_headers = vec![
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        HeaderName::from_static("x-request-id"),
    ];
    if let IdentifierSource::Header(name) = &config.identifier_source
        && let Ok(name) = HeaderName::try_from(name.as_str())
        && !allow_headers.contains(&name)
    {
        allow_headers.push(name);
    }

    let cors = cors
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(allow_headers)
        .max_age(std::time::Duration::from_secs(60 * 10));

    router.layer(cors)
}
