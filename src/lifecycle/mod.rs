//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Build gate state → Spawn sampler → Serve
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C → broadcast → server drains, sampler exits its loop
//! ```
//!
//! # Design Decisions
//! - One broadcast channel fans out to every long-running task
//! - Tests drive the same channel to stop servers deterministically

pub mod shutdown;

pub use shutdown::Shutdown;
