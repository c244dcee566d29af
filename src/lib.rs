//! API security gate and request telemetry.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌────────────────────────────────────────────────┐
//!                    │                   API GUARD                     │
//!                    │                                                 │
//!   Client Request   │  ┌──────────┐   ┌──────────┐   ┌────────────┐  │
//!   ─────────────────┼─▶│telemetry │──▶│ security │──▶│  caller's  │  │
//!                    │  │ recorder │   │   gate   │   │  handlers  │  │
//!                    │  └────┬─────┘   └──────────┘   └────────────┘  │
//!                    │       │ RequestMetric (on completion)           │
//!                    │       ▼                                         │
//!                    │  ┌──────────┐   60s    ┌──────────┐  on demand │
//!                    │  │  bounded │─────────▶│  system  │──────────▶ │──▶ /health
//!                    │  │  buffer  │ sampler  │ snapshot │ classifier │
//!                    │  └──────────┘          └──────────┘            │
//!                    │                                                 │
//!                    │  Cross-cutting: config, observability,          │
//!                    │  lifecycle, admin endpoints                     │
//!                    └────────────────────────────────────────────────┘
//! ```
//!
//! The security gate combines per-IP fixed-window rate limiting (three
//! named policies: general, ai, auth), unconditional recursive input
//! sanitization, and a schema-driven validation gate with heuristic
//! SQL/XSS/prompt-injection refinements. The telemetry side records every
//! completed request into a bounded FIFO buffer, reduces the trailing
//! minute into rolling snapshots on a fixed cadence, and serves a
//! threshold-derived health verdict.

// Core subsystems
pub mod config;
pub mod error;
pub mod http;

// Gate subsystems
pub mod security;
pub mod telemetry;

// Cross-cutting concerns
pub mod admin;
pub mod lifecycle;
pub mod observability;

pub use config::GateConfig;
pub use error::GateError;
pub use http::GateServer;
pub use lifecycle::Shutdown;
