//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (structured log lines, request spans)
//!     → metrics.rs (counters, histogram)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - Request ID flows through all subsystems via the request-id layers
//! - Metric updates are cheap atomic operations; no locks on the hot path

pub mod metrics;
