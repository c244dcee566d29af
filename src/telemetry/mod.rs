//! Telemetry subsystem.
//!
//! # Data Flow
//! ```text
//! Every request (outermost middleware):
//!     → recorder.rs (RequestMetric appended on response completion)
//!
//! Fixed 60s cadence (background task):
//!     → sampler.rs → TelemetryHub::take_sample()
//!     → SystemSnapshot appended to bounded history, published as latest
//!
//! Health query (on demand):
//!     → health.rs classify(latest snapshot)
//! ```
//!
//! # Design Decisions
//! - Ephemeral by design: buffers are diagnostic, lost on restart
//! - The hub is an explicitly constructed, injected object, not a
//!   module-level singleton; the sampler owns start/stop via the
//!   shutdown channel

pub mod health;
pub mod recorder;
pub mod sampler;

pub use health::{classify, HealthStatus, HealthVerdict};
pub use recorder::{record_request_metrics, RequestMetric, SystemSnapshot, TelemetryHub};
pub use sampler::Sampler;
