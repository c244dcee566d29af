//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;

use api_guard::config::GateConfig;
use api_guard::http::GateServer;
use api_guard::lifecycle::Shutdown;
use api_guard::telemetry::TelemetryHub;

/// A gate server running on an ephemeral port.
pub struct TestGate {
    #[allow(dead_code)]
    pub addr: SocketAddr,
    pub base: String,
    pub shutdown: Shutdown,
    pub hub: Arc<TelemetryHub>,
}

/// Defaults hardened for test stability: explicit sampling only, admin
/// enabled with a known key, no metrics exporter.
pub fn test_config() -> GateConfig {
    let mut config = GateConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.observability.metrics_enabled = false;
    // Tests trigger samples explicitly via the hub.
    config.telemetry.sample_interval_secs = 3600;
    config.admin.enabled = true;
    config.admin.api_key = "test-admin-key".to_string();
    config
}

/// Start a gate server around the given API router and wait until it
/// accepts connections.
pub async fn start_gate(config: GateConfig, api: Router) -> TestGate {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server = GateServer::new(config, api);
    let hub = server.telemetry();

    let server_shutdown = shutdown.clone();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    for _ in 0..50 {
        if tokio::net::TcpStream::connect(addr).await.is_ok() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    TestGate {
        addr,
        base: format!("http://{addr}"),
        shutdown,
        hub,
    }
}

/// Non-pooled client so each test request opens a fresh connection.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}
