//! Response handling and transformation.
//!
//! # Responsibilities
//! - Relay the chosen upstream's response to the client
//! - Tag relayed responses with the serving upstream
//! - Produce the synthetic responses the proxy itself answers with
//!
//! # Design Decisions
//! - Streaming responses avoid buffering entire body
//! - A relayed body that stalls longer than the attempt timeout is aborted
//! - Status and body are relayed verbatim, redirects included
//! - Synthetic errors never carry internal detail or an upstream tag

use std::time::Duration;

use axum::body::{Body, Bytes, HttpBody};
use axum::http::{header, HeaderName, HeaderValue, Response, StatusCode};
use axum::response::IntoResponse;
use axum::BoxError;
use http_body_util::LengthLimitError;
use tower_http::timeout::TimeoutBody;

use crate::http::headers::HeaderPolicy;

/// Message sent when every candidate upstream failed.
pub const ALL_UPSTREAMS_FAILED: &str =
    "Unable to complete the request. All servers are down or not responding.";

/// Turn an upstream response into the client response.
///
/// The body streams through; `idle_timeout` bounds the wait for each frame.
pub fn relay<B>(
    upstream_address: &str,
    upstream_header: &HeaderName,
    policy: &HeaderPolicy,
    idle_timeout: Duration,
    response: Response<B>,
) -> Response<Body>
where
    B: HttpBody<Data = Bytes> + Send + 'static,
    B::Error: Into<BoxError>,
{
    let (mut parts, body) = response.into_parts();
    policy.strip_response_headers(&mut parts.headers);

    match HeaderValue::from_str(upstream_address) {
        Ok(value) => {
            parts.headers.insert(upstream_header.clone(), value);
        }
        Err(_) => {
            tracing::warn!(upstream = %upstream_address, "Upstream address is not a valid header value");
        }
    }

    Response::from_parts(parts, Body::new(TimeoutBody::new(idle_timeout, body)))
}

/// 503 returned when the candidate list is exhausted.
pub fn all_upstreams_failed() -> Response<Body> {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        ALL_UPSTREAMS_FAILED,
    )
        .into_response()
}

/// Returned when the client body cannot be buffered.
///
/// 413 when the size limit was hit, 400 for anything else (e.g. the client
/// went away mid-upload).
pub fn unreadable_body(error: &axum::Error) -> Response<Body> {
    let too_large = std::error::Error::source(error)
        .map(|source| source.is::<LengthLimitError>())
        .unwrap_or(false);

    if too_large {
        (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
    } else {
        (StatusCode::BAD_REQUEST, "Request body could not be read").into_response()
    }
}

/// Returned when the client does not finish sending its body in time.
pub fn body_timed_out() -> Response<Body> {
    (StatusCode::REQUEST_TIMEOUT, "Request body not received in time").into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::headers::FORWARDING;
    use hyper::body::Frame;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    /// Body that never yields a frame.
    struct Stalled;

    impl HttpBody for Stalled {
        type Data = Bytes;
        type Error = std::convert::Infallible;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
            Poll::Pending
        }
    }

    /// Body that fails on first read.
    struct Broken;

    impl HttpBody for Broken {
        type Data = Bytes;
        type Error = std::io::Error;

        fn poll_frame(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<Result<Frame<Bytes>, Self::Error>>> {
            Poll::Ready(Some(Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "client went away",
            ))))
        }
    }

    #[tokio::test]
    async fn test_relay_tags_and_strips() {
        let upstream = Response::builder()
            .status(StatusCode::FOUND)
            .header("location", "/tasks")
            .header("content-length", "5")
            .header("set-cookie", "session=abc")
            .body(Body::from("moved"))
            .unwrap();
        let marker = HeaderName::from_static("x-upstream-server");

        let relayed = relay(
            "http://127.0.0.1:5001",
            &marker,
            &FORWARDING,
            Duration::from_secs(1),
            upstream,
        );

        assert_eq!(relayed.status(), StatusCode::FOUND);
        assert_eq!(relayed.headers()["location"], "/tasks");
        assert_eq!(relayed.headers()["set-cookie"], "session=abc");
        assert_eq!(relayed.headers()["x-upstream-server"], "http://127.0.0.1:5001");
        assert!(relayed.headers().get("content-length").is_none());

        let body = axum::body::to_bytes(relayed.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"moved");
    }

    #[tokio::test]
    async fn test_all_upstreams_failed_is_generic() {
        let response = all_upstreams_failed();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert!(response.headers().get("x-upstream-server").is_none());

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], ALL_UPSTREAMS_FAILED.as_bytes());
    }

    #[tokio::test]
    async fn test_stalled_relay_body_errors_out() {
        let marker = HeaderName::from_static("x-upstream-server");
        let relayed = relay(
            "http://127.0.0.1:5001",
            &marker,
            &FORWARDING,
            Duration::from_millis(50),
            Response::new(Stalled),
        );

        let read = tokio::time::timeout(
            Duration::from_secs(2),
            axum::body::to_bytes(relayed.into_body(), 1024),
        )
        .await
        .expect("stalled body must not hang the client");
        assert!(read.is_err());
    }

    #[tokio::test]
    async fn test_oversized_body_is_413() {
        let err = axum::body::to_bytes(Body::from(vec![0u8; 64]), 16)
            .await
            .unwrap_err();
        assert_eq!(unreadable_body(&err).status(), StatusCode::PAYLOAD_TOO_LARGE);
    }

    #[tokio::test]
    async fn test_broken_body_is_400() {
        let err = axum::body::to_bytes(Body::new(Broken), 1024)
            .await
            .unwrap_err();
        assert_eq!(unreadable_body(&err).status(), StatusCode::BAD_REQUEST);
    }
}
