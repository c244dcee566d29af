//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → rate_limit.rs (check per-IP window for every attached policy)
//!     → validate.rs (sanitize query + body, schema checks, refinements)
//!         → patterns.rs (SQL/XSS/prompt-injection heuristics)
//!         → sanitize.rs (strip dangerous substrings)
//!     → Pass to handler with the sanitized payload
//!
//! Outgoing response:
//!     → headers.rs (security response headers)
//! ```
//!
//! # Design Decisions
//! - Defense in depth: sanitization and rejection are independent layers
//! - Fail closed: any violated field aborts the request
//! - No trust in client input, including query strings

pub mod headers;
pub mod patterns;
pub mod rate_limit;
pub mod sanitize;
pub mod validate;

pub use rate_limit::{rate_limit_middleware, FixedWindowLimiter, RateLimitPolicy};
pub use validate::{validate_request, FieldRule, ValidationGate, ValidationSchema};
