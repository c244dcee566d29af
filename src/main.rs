//! api-guard binary.
//!
//! Wires a small demonstration API onto the gate so every named rate-limit
//! policy and validation schema is exercised end to end: an AI-assist
//! endpoint (ai policy + prompt schema), an authentication endpoint (auth
//! policy), and a ping route under the general policy only. The handlers
//! are thin acknowledgments standing in for real business logic.

use std::path::Path;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_guard::config::{load_config, GateConfig};
use api_guard::http::GateServer;
use api_guard::lifecycle::Shutdown;
use api_guard::observability::metrics;
use api_guard::security::{
    rate_limit_middleware, validate_request, FieldRule, FixedWindowLimiter, RateLimitPolicy,
    ValidationGate, ValidationSchema,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing subscriber
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api_guard=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("api-guard v{} starting", env!("CARGO_PKG_VERSION"));

    // Load configuration (defaults when no file is given)
    let config = match std::env::args().nth(1) {
        Some(path) => load_config(Path::new(&path))?,
        None => GateConfig::default(),
    };

    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        sample_interval_secs = config.telemetry.sample_interval_secs,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    let local_addr = listener.local_addr()?;

    tracing::info!(address = %local_addr, "Listening for connections");

    if config.observability.metrics_enabled {
        if let Ok(addr) = config.observability.metrics_address.parse() {
            metrics::init_metrics(addr);
        } else {
            tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            );
        }
    }

    let shutdown = Shutdown::new();
    let ctrl_c_shutdown = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Shutdown signal received");
            ctrl_c_shutdown.trigger();
        }
    });

    let api = demo_routes(&config);
    let server = GateServer::new(config, api);
    server.run(listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

/// Demonstration routes exercising the three named policies.
fn demo_routes(config: &GateConfig) -> Router {
    let general = Arc::new(FixedWindowLimiter::new(RateLimitPolicy::from_config(
        "general",
        &config.rate_limits.general,
    )));
    let ai = Arc::new(FixedWindowLimiter::new(RateLimitPolicy::from_config(
        "ai",
        &config.rate_limits.ai,
    )));
    let auth = Arc::new(FixedWindowLimiter::new(RateLimitPolicy::from_config(
        "auth",
        &config.rate_limits.auth,
    )));

    let draft_gate = ValidationGate::new(
        ValidationSchema::new()
            .field("prompt", FieldRule::prompt().required().max_len(4000))
            .field("recipient", FieldRule::email())
            .field("tone", FieldRule::text().max_len(64)),
    );
    let login_gate = ValidationGate::new(
        ValidationSchema::new()
            .field("email", FieldRule::email().required())
            .field("password", FieldRule::text().required().max_len(128)),
    );

    let ai_routes = Router::new()
        .route("/api/ai/draft-email", post(draft_email))
        .layer(middleware::from_fn_with_state(draft_gate, validate_request))
        .layer(middleware::from_fn_with_state(ai, rate_limit_middleware));

    let auth_routes = Router::new()
        .route("/api/auth/login", post(login))
        .layer(middleware::from_fn_with_state(login_gate, validate_request))
        .layer(middleware::from_fn_with_state(auth, rate_limit_middleware));

    Router::new()
        .route("/api/ping", get(ping))
        .merge(ai_routes)
        .merge(auth_routes)
        .layer(middleware::from_fn_with_state(
            general,
            rate_limit_middleware,
        ))
}

async fn ping() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// The gate has already sanitized and validated the payload by the time it
/// lands here.
async fn draft_email(Json(payload): Json<Value>) -> Json<Value> {
    let prompt_chars = payload["prompt"].as_str().map(|p| p.chars().count());
    Json(json!({ "status": "queued", "prompt_chars": prompt_chars }))
}

async fn login(Json(payload): Json<Value>) -> Json<Value> {
    Json(json!({ "status": "ok", "email": payload["email"] }))
}
