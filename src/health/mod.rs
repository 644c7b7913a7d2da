//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer
//!     → Probe each upstream concurrently (GET /health, 200 = alive)
//!     → Update upstream liveness (state.rs)
//!
//! Passive health checks (passive.rs):
//!     Forward attempt outcome observed
//!     → Delivered: recover
//!     → Transport error / timeout: mark down, restart retry window
//!
//! State machine (state.rs):
//!     Healthy ←→ Unhealthy{since}
//! ```
//!
//! # Design Decisions
//! - Active and passive checks are complementary
//! - A single observation flips state; there are no thresholds
//! - Health state is per-upstream, locked per-upstream, never across I/O

pub mod active;
pub mod passive;
pub mod state;

pub use active::{HealthMonitor, ProbeError, ProbeOutcome};
pub use state::{Liveness, Transition};
