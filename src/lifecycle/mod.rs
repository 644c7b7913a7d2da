//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Load config → Validate → Build registry → Probe upstreams → Start listener
//!
//! Shutdown (shutdown.rs):
//!     Signal received → Stop health monitor → Drain connections → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Upstreams are probed before the listener accepts traffic
//! - Failed startup probes are not fatal; the upstream starts as down

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
