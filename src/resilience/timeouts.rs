//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every upstream call (probe or forward) with a deadline
//! - Classify the ways a single upstream attempt can fail
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities
//! - Timeout errors are distinct from transport errors
//! - Dropping the future cancels the in-flight call

use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time;

/// Why a single upstream attempt failed.
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(#[from] hyper_util::client::legacy::Error),

    #[error("could not build upstream request: {0}")]
    InvalidRequest(#[from] axum::http::Error),
}

impl AttemptError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, AttemptError::Timeout(_))
    }
}

/// Run an upstream call, failing with [`AttemptError::Timeout`] after `limit`.
pub async fn bounded<F, T>(limit: Duration, call: F) -> Result<T, AttemptError>
where
    F: Future<Output = Result<T, hyper_util::client::legacy::Error>>,
{
    match time::timeout(limit, call).await {
        Ok(result) => result.map_err(AttemptError::from),
        Err(_) => Err(AttemptError::Timeout(limit)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_pending_call_times_out() {
        let limit = Duration::from_millis(50);
        let never = std::future::pending::<Result<(), hyper_util::client::legacy::Error>>();

        let err = bounded(limit, never).await.unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "timed out after 50ms");
    }

    #[tokio::test]
    async fn test_ready_call_passes_through() {
        let ready = async { Ok::<_, hyper_util::client::legacy::Error>(42) };
        assert_eq!(bounded(Duration::from_secs(1), ready).await.unwrap(), 42);
    }
}
