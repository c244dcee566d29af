//! Security response headers.
//!
//! # Responsibilities
//! - Attach `X-Content-Type-Options: nosniff` and `X-Frame-Options: DENY`
//!   to every response, including gate rejections
//! - Attach the configured Content-Security-Policy string
//!
//! # Design Decisions
//! - `overriding` semantics: handlers cannot weaken the headers
//! - The validation gate never touches these; they are set by this layer
//!   and only this layer

use axum::{
    http::{header, HeaderValue},
    Router,
};
use tower_http::set_header::SetResponseHeaderLayer;

use crate::config::SecurityConfig;

const DEFAULT_CSP: &str = "default-src 'self'";

/// Wrap a router with the security header layers, when enabled.
pub fn apply(router: Router, config: &SecurityConfig) -> Router {
    if !config.enable_headers {
        return router;
    }

    let csp = HeaderValue::from_str(&config.content_security_policy).unwrap_or_else(|_| {
        tracing::warn!(
            policy = %config.content_security_policy,
            "Configured Content-Security-Policy is not a valid header value, using default"
        );
        HeaderValue::from_static(DEFAULT_CSP)
    });

    router
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp,
        ))
}
