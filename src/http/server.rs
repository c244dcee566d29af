//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Wrap the caller-supplied API router in the full gate stack
//! - Wire up middleware (telemetry recorder, panic catch, security headers,
//!   request ID, tracing, body limit, timeout)
//! - Expose the health and admin endpoints
//! - Spawn the system sampler and serve with graceful shutdown
//!
//! # Middleware Order
//! ```text
//! request → recorder → security headers → catch panic → request id
//!         → trace → body limit → timeout → routes (rate limit, validation)
//! ```
//! The recorder is outermost so every request is recorded, including gate
//! rejections and panics mapped to 500 beneath it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use tokio::net::TcpListener;
use tower_http::{
    catch_panic::CatchPanicLayer,
    limit::RequestBodyLimitLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::admin;
use crate::config::GateConfig;
use crate::lifecycle::Shutdown;
use crate::security::headers;
use crate::telemetry::health::{classify, HealthStatus, HealthVerdict};
use crate::telemetry::recorder::{record_request_metrics, SystemSnapshot, TelemetryHub};
use crate::telemetry::Sampler;

/// Application state injected into the built-in handlers.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<TelemetryHub>,
    pub config: Arc<GateConfig>,
}

/// HTTP server wrapping an API router in the gate stack.
pub struct GateServer {
    router: Router,
    config: GateConfig,
    hub: Arc<TelemetryHub>,
}

impl GateServer {
    /// Create a new server around the caller's routes. The API router is
    /// expected to carry its own per-route-group rate limiters and
    /// validation gates; everything process-wide is layered here.
    pub fn new(config: GateConfig, api: Router) -> Self {
        let hub = Arc::new(TelemetryHub::new(&config.telemetry));
        let state = AppState {
            hub: hub.clone(),
            config: Arc::new(config.clone()),
        };
        let router = Self::build_router(&config, state, api);
        Self {
            router,
            config,
            hub,
        }
    }

    fn build_router(config: &GateConfig, state: AppState, api: Router) -> Router {
        let mut router = Router::new()
            .route("/health", get(health))
            .route("/health/detail", get(health_detail))
            .with_state(state.clone());

        if config.admin.enabled {
            router = router.merge(admin::setup_admin_router(state.clone()));
        }

        let router = router
            .merge(api)
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(RequestBodyLimitLayer::new(config.security.max_body_size))
            .layer(TraceLayer::new_for_http())
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(CatchPanicLayer::new());

        // Security headers sit outside the panic catcher so even a 500 from
        // a panic carries them; the recorder wraps everything.
        let router = headers::apply(router, &config.security);

        router.layer(middleware::from_fn_with_state(
            state.hub.clone(),
            record_request_metrics,
        ))
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(self, listener: TcpListener, shutdown: Shutdown) -> std::io::Result<()> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Gate server starting");

        let sampler = Sampler::new(
            self.hub.clone(),
            Duration::from_secs(self.config.telemetry.sample_interval_secs),
        );
        tokio::spawn(sampler.run(shutdown.subscribe()));

        let mut rx = shutdown.subscribe();
        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = rx.recv().await;
            })
            .await?;

        tracing::info!("Gate server stopped");
        Ok(())
    }

    /// The telemetry hub shared with the middleware and sampler.
    pub fn telemetry(&self) -> Arc<TelemetryHub> {
        self.hub.clone()
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &GateConfig {
        &self.config
    }
}

/// Health check endpoint: classifier verdict over the latest snapshot.
/// Critical maps to 503 so load balancers can act on it.
async fn health(State(state): State<AppState>) -> Response {
    let latest = state.hub.latest_snapshot();
    let verdict = classify(latest.as_deref());
    let code = if verdict.status == HealthStatus::Critical {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    (code, Json(verdict)).into_response()
}

#[derive(Serialize)]
struct BufferStats {
    recorded: usize,
    capacity: usize,
}

#[derive(Serialize)]
struct HealthDetail {
    #[serde(flatten)]
    verdict: HealthVerdict,
    #[serde(skip_serializing_if = "Option::is_none")]
    snapshot: Option<SystemSnapshot>,
    buffer: BufferStats,
    uptime_seconds: u64,
}

/// Verbose health endpoint: verdict plus the raw snapshot and buffer state.
async fn health_detail(State(state): State<AppState>) -> Json<HealthDetail> {
    let latest = state.hub.latest_snapshot();
    let verdict = classify(latest.as_deref());
    Json(HealthDetail {
        verdict,
        snapshot: latest.map(|s| (*s).clone()),
        buffer: BufferStats {
            recorded: state.hub.recorded_len(),
            capacity: state.hub.request_capacity(),
        },
        uptime_seconds: state.hub.uptime().as_secs(),
    })
}
