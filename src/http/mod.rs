//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack, built-in endpoints)
//!     → request.rs (client IP / User-Agent helpers for the middleware)
//!     → caller-supplied API routes
//! ```

pub mod request;
pub mod server;

pub use server::{AppState, GateServer};
