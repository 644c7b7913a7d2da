//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Request to upstreams:
//!     → failover.rs (walk candidates in order, one attempt each)
//!     → timeouts.rs (bound every attempt)
//!     → On transport failure: mark upstream down, next candidate
//!     → On any HTTP response: done
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every upstream call has a deadline
//! - Failover only moves forward; an upstream is tried at most once per request
//! - Exhaustion is a 503 for this request, never fatal to the process

pub mod failover;
pub mod timeouts;

pub use failover::{AttemptFailure, Delivered, ForwardOutcome, Forwarder};
pub use timeouts::AttemptError;
