//! Health classification.
//!
//! # Verdicts
//! - Critical: avg response > 5000 ms OR memory > 90% OR error rate > 10%
//! - Warning: avg response > 2000 ms OR memory > 70% OR error rate > 5%
//! - Healthy: everything under the warning thresholds
//! - Unknown: no snapshot taken yet
//!
//! Critical is checked before warning. Pure function over the latest
//! snapshot; safe to call from any number of concurrent health queries.

use serde::Serialize;

use crate::telemetry::recorder::SystemSnapshot;

const CRITICAL_RESPONSE_MS: f64 = 5_000.0;
const CRITICAL_MEMORY_PERCENT: f64 = 90.0;
const CRITICAL_ERROR_PERCENT: f64 = 10.0;

const WARNING_RESPONSE_MS: f64 = 2_000.0;
const WARNING_MEMORY_PERCENT: f64 = 70.0;
const WARNING_ERROR_PERCENT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
    Unknown,
}

/// Numeric inputs the verdict was derived from, echoed back to callers.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthDetails {
    pub avg_response_time: f64,
    pub memory_usage_percent: f64,
    pub error_rate: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthVerdict {
    pub status: HealthStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HealthDetails>,
}

/// Map the latest snapshot (or its absence) to a verdict.
pub fn classify(snapshot: Option<&SystemSnapshot>) -> HealthVerdict {
    let snapshot = match snapshot {
        Some(snapshot) => snapshot,
        None => {
            return HealthVerdict {
                status: HealthStatus::Unknown,
                message: "No telemetry sample taken yet".into(),
                details: None,
            }
        }
    };

    let details = HealthDetails {
        avg_response_time: snapshot.average_response_time_ms,
        memory_usage_percent: snapshot.memory.usage_percent(),
        error_rate: snapshot.error_rate_percent,
    };

    let (status, message) = if details.avg_response_time > CRITICAL_RESPONSE_MS
        || details.memory_usage_percent > CRITICAL_MEMORY_PERCENT
        || details.error_rate > CRITICAL_ERROR_PERCENT
    {
        (
            HealthStatus::Critical,
            "System under severe load or failing".to_string(),
        )
    } else if details.avg_response_time > WARNING_RESPONSE_MS
        || details.memory_usage_percent > WARNING_MEMORY_PERCENT
        || details.error_rate > WARNING_ERROR_PERCENT
    {
        (
            HealthStatus::Warning,
            "System degraded, watch the trend".to_string(),
        )
    } else {
        (HealthStatus::Healthy, "System operating normally".to_string())
    };

    HealthVerdict {
        status,
        message,
        details: Some(details),
    }
}
