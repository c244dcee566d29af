//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gate.
//! All types derive Serde traits for deserialization from config files, and
//! every field has a default so a minimal (even empty) config is valid.

use serde::{Deserialize, Serialize};

/// Root configuration for the API gate.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GateConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Security hardening (headers, body limit).
    pub security: SecurityConfig,

    /// The three named rate-limit policies.
    pub rate_limits: RateLimitsConfig,

    /// Telemetry buffer sizes and sampling cadence.
    pub telemetry: TelemetryConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Admin endpoint settings.
    pub admin: AdminConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Security hardening configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Attach security response headers to every response.
    pub enable_headers: bool,

    /// Content-Security-Policy header value.
    pub content_security_policy: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            content_security_policy: "default-src 'self'".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// One named rate-limit policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PolicyConfig {
    /// Window length in milliseconds.
    pub window_ms: u64,

    /// Maximum requests per IP within one window.
    pub max_requests: u32,

    /// Message returned with the 429 rejection.
    pub message: String,
}

/// The three named policies. Defaults are a compatibility contract with
/// collaborating route definitions: general=(900000ms,100),
/// ai=(60000ms,10), auth=(900000ms,5).
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitsConfig {
    pub general: PolicyConfig,
    pub ai: PolicyConfig,
    pub auth: PolicyConfig,
}

impl Default for RateLimitsConfig {
    fn default() -> Self {
        Self {
            general: PolicyConfig {
                window_ms: 900_000,
                max_requests: 100,
                message: "Too many requests, please try again later.".to_string(),
            },
            ai: PolicyConfig {
                window_ms: 60_000,
                max_requests: 10,
                message: "AI request limit reached, please slow down.".to_string(),
            },
            auth: PolicyConfig {
                window_ms: 900_000,
                max_requests: 5,
                message: "Too many authentication attempts, please try again later.".to_string(),
            },
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Request metric buffer capacity (FIFO eviction beyond this).
    pub request_buffer_size: usize,

    /// Snapshot history capacity (one hour at the default cadence).
    pub snapshot_history_size: usize,

    /// Sampling cadence in seconds.
    pub sample_interval_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            request_buffer_size: 1000,
            snapshot_history_size: 60,
            sample_interval_secs: 60,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Enable the /admin routes.
    pub enabled: bool,

    /// API key for authentication (Bearer token).
    pub api_key: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
        }
    }
}
