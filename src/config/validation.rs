//! Configuration validation.
//!
//! Semantic checks after serde has handled the syntactic ones. Returns all
//! violations, not just the first, so one edit-reload cycle fixes everything.

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::{GateConfig, PolicyConfig};

/// One semantic violation found in a loaded config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a loaded configuration.
pub fn validate_config(config: &GateConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            "must be a valid socket address",
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new(
            "timeouts.request_secs",
            "must be greater than zero",
        ));
    }

    if config.security.max_body_size == 0 {
        errors.push(ValidationError::new(
            "security.max_body_size",
            "must be greater than zero",
        ));
    }

    check_policy(&mut errors, "rate_limits.general", &config.rate_limits.general);
    check_policy(&mut errors, "rate_limits.ai", &config.rate_limits.ai);
    check_policy(&mut errors, "rate_limits.auth", &config.rate_limits.auth);

    if config.telemetry.request_buffer_size == 0 {
        errors.push(ValidationError::new(
            "telemetry.request_buffer_size",
            "must be greater than zero",
        ));
    }
    if config.telemetry.snapshot_history_size == 0 {
        errors.push(ValidationError::new(
            "telemetry.snapshot_history_size",
            "must be greater than zero",
        ));
    }
    if config.telemetry.sample_interval_secs == 0 {
        errors.push(ValidationError::new(
            "telemetry.sample_interval_secs",
            "must be greater than zero",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            "must be a valid socket address when metrics are enabled",
        ));
    }

    if config.admin.enabled && config.admin.api_key.is_empty() {
        errors.push(ValidationError::new(
            "admin.api_key",
            "must be set when the admin endpoints are enabled",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_policy(errors: &mut Vec<ValidationError>, name: &str, policy: &PolicyConfig) {
    if policy.window_ms == 0 {
        errors.push(ValidationError::new(
            format!("{name}.window_ms"),
            "must be greater than zero",
        ));
    }
    if policy.max_requests == 0 {
        errors.push(ValidationError::new(
            format!("{name}.max_requests"),
            "must be greater than zero",
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&GateConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_violations() {
        let mut config = GateConfig::default();
        config.listener.bind_address = "not-an-address".into();
        config.rate_limits.ai.max_requests = 0;
        config.telemetry.sample_interval_secs = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        assert!(errors.iter().any(|e| e.field == "listener.bind_address"));
        assert!(errors.iter().any(|e| e.field == "rate_limits.ai.max_requests"));
    }
}
