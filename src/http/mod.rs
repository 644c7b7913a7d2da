//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing)
//!     → status routes (admin) or the forwarding catch-all
//!     → request.rs (rebuild request for one upstream, headers.rs policy)
//!     → resilience::failover (attempt candidates in order)
//!     → response.rs (strip per-leg headers, tag upstream, or 503)
//!     → Send to client
//! ```

pub mod headers;
pub mod request;
pub mod response;
pub mod server;

pub use headers::{HeaderPolicy, FORWARDING};
pub use request::X_REQUEST_ID;
pub use server::{AppState, HttpServer, ServerError};
