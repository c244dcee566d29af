use axum::{extract::State, Json};
use serde::Serialize;

use crate::http::server::AppState;
use crate::telemetry::recorder::{RequestMetric, SystemSnapshot};

/// Number of recent request metrics returned by /admin/requests.
const RECENT_REQUEST_LIMIT: usize = 50;

#[derive(Serialize)]
pub struct SystemStatus {
    pub version: &'static str,
    pub status: &'static str,
    pub uptime_seconds: u64,
    pub recorded_requests: usize,
    pub request_buffer_capacity: usize,
}

pub async fn get_status(State(state): State<AppState>) -> Json<SystemStatus> {
    Json(SystemStatus {
        version: env!("CARGO_PKG_VERSION"),
        status: "operational",
        uptime_seconds: state.hub.uptime().as_secs(),
        recorded_requests: state.hub.recorded_len(),
        request_buffer_capacity: state.hub.request_capacity(),
    })
}

pub async fn get_snapshots(State(state): State<AppState>) -> Json<Vec<SystemSnapshot>> {
    Json(state.hub.snapshot_history())
}

pub async fn get_requests(State(state): State<AppState>) -> Json<Vec<RequestMetric>> {
    Json(state.hub.recent_requests(RECENT_REQUEST_LIMIT))
}
