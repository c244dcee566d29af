//! Per-IP fixed-window rate limiting.
//!
//! # Responsibilities
//! - Cap requests per client IP inside a fixed window
//! - Expose the three named policies route groups attach to
//!
//! # Design Decisions
//! - Fixed window, not a sliding log: the counter resets exactly at the
//!   window boundary
//! - Policies are independent instances; a request may pass through more
//!   than one (e.g. general + ai)
//! - Window state is lazily created per IP and lives in a concurrent map,
//!   since requests complete on any runtime worker

use std::net::IpAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::PolicyConfig;
use crate::error::GateError;
use crate::http::request::client_ip;
use crate::observability::metrics;

/// Gate parameters for one named policy.
#[derive(Debug, Clone)]
pub struct RateLimitPolicy {
    pub name: String,
    pub window: Duration,
    pub max_requests: u32,
    pub message: String,
}

impl RateLimitPolicy {
    pub fn new(
        name: impl Into<String>,
        window: Duration,
        max_requests: u32,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            window,
            max_requests,
            message: message.into(),
        }
    }

    /// General API traffic: 100 requests per 15 minutes.
    pub fn general() -> Self {
        Self::new(
            "general",
            Duration::from_millis(900_000),
            100,
            "Too many requests, please try again later.",
        )
    }

    /// AI-endpoint traffic: 10 requests per minute. Tighter because AI calls
    /// are expensive and rate-limited upstream.
    pub fn ai() -> Self {
        Self::new(
            "ai",
            Duration::from_millis(60_000),
            10,
            "AI request limit reached, please slow down.",
        )
    }

    /// Authentication traffic: 5 attempts per 15 minutes (brute-force
    /// mitigation).
    pub fn auth() -> Self {
        Self::new(
            "auth",
            Duration::from_millis(900_000),
            5,
            "Too many authentication attempts, please try again later.",
        )
    }

    pub fn from_config(name: impl Into<String>, config: &PolicyConfig) -> Self {
        Self::new(
            name,
            Duration::from_millis(config.window_ms),
            config.max_requests,
            config.message.clone(),
        )
    }
}

/// Per-IP counter and the instant its window opened.
#[derive(Debug)]
struct Window {
    started: Instant,
    count: u32,
}

/// Request gate produced by a [`RateLimitPolicy`].
pub struct FixedWindowLimiter {
    policy: RateLimitPolicy,
    windows: DashMap<IpAddr, Window>,
}

impl FixedWindowLimiter {
    pub fn new(policy: RateLimitPolicy) -> Self {
        Self {
            policy,
            windows: DashMap::new(),
        }
    }

    pub fn policy(&self) -> &RateLimitPolicy {
        &self.policy
    }

    /// Count one request from `ip` against the current window.
    pub fn check(&self, ip: IpAddr) -> Result<(), GateError> {
        let mut window = self.windows.entry(ip).or_insert_with(|| Window {
            started: Instant::now(),
            count: 0,
        });

        if window.started.elapsed() >= self.policy.window {
            window.started = Instant::now();
            window.count = 0;
        }

        window.count += 1;
        if window.count > self.policy.max_requests {
            Err(GateError::RateLimited(self.policy.message.clone()))
        } else {
            Ok(())
        }
    }
}

/// Middleware function gating a route group behind one limiter instance.
pub async fn rate_limit_middleware(
    State(limiter): State<Arc<FixedWindowLimiter>>,
    request: Request,
    next: Next,
) -> Response {
    let ip = client_ip(&request);
    match limiter.check(ip) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::warn!(
                client = %ip,
                policy = %limiter.policy().name,
                "Rate limit exceeded"
            );
            metrics::record_rate_limited(&limiter.policy().name);
            err.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ip(last: u8) -> IpAddr {
        IpAddr::V4(std::net::Ipv4Addr::new(192, 0, 2, last))
    }

    #[test]
    fn named_policies_expose_contract_defaults() {
        let general = RateLimitPolicy::general();
        assert_eq!(general.window, Duration::from_millis(900_000));
        assert_eq!(general.max_requests, 100);

        let ai = RateLimitPolicy::ai();
        assert_eq!(ai.window, Duration::from_millis(60_000));
        assert_eq!(ai.max_requests, 10);

        let auth = RateLimitPolicy::auth();
        assert_eq!(auth.window, Duration::from_millis(900_000));
        assert_eq!(auth.max_requests, 5);
    }

    #[test]
    fn rejects_beyond_limit_and_resets_at_boundary() {
        let limiter = FixedWindowLimiter::new(RateLimitPolicy::new(
            "test",
            Duration::from_millis(100),
            3,
            "limited",
        ));

        for _ in 0..3 {
            assert!(limiter.check(ip(1)).is_ok());
        }
        assert!(matches!(
            limiter.check(ip(1)),
            Err(GateError::RateLimited(_))
        ));

        std::thread::sleep(Duration::from_millis(120));
        assert!(limiter.check(ip(1)).is_ok(), "window boundary resets count");
    }

    #[test]
    fn counters_are_per_ip() {
        let limiter = FixedWindowLimiter::new(RateLimitPolicy::new(
            "test",
            Duration::from_secs(60),
            1,
            "limited",
        ));
        assert!(limiter.check(ip(1)).is_ok());
        assert!(limiter.check(ip(2)).is_ok());
        assert!(limiter.check(ip(1)).is_err());
    }
}
