//! Request handling and transformation.
//!
//! # Responsibilities
//! - Generate a unique request ID (UUID v4) for every client request
//! - Rebuild the client request for one upstream attempt
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - The body is buffered once and cloned per attempt (`Bytes` is refcounted)
//! - Method, path, query and allowed headers pass through untouched

use axum::body::{Body, Bytes};
use axum::http::{request::Parts, HeaderMap, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::http::headers::HeaderPolicy;
use crate::load_balancer::Upstream;

pub const X_REQUEST_ID: &str = "x-request-id";

/// Assigns a random UUID to requests that arrive without an ID.
#[derive(Debug, Clone, Copy, Default)]
pub struct MakeRequestUuidV4;

impl MakeRequestId for MakeRequestUuidV4 {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// The request ID header, or `"unknown"`.
pub fn request_id(headers: &HeaderMap) -> &str {
    headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("unknown")
}

/// Build the request sent to `upstream` for one attempt.
pub fn upstream_request(
    upstream: &Upstream,
    parts: &Parts,
    body: Bytes,
    policy: &HeaderPolicy,
) -> Result<Request<Body>, axum::http::Error> {
    let path_and_query = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut builder = Request::builder()
        .method(parts.method.clone())
        .uri(upstream.uri_for(path_and_query));

    if let Some(headers) = builder.headers_mut() {
        policy.copy_request_headers(&parts.headers, headers);
    }

    builder.body(Body::from(body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::headers::FORWARDING;
    use axum::http::Method;
    use url::Url;

    #[test]
    fn test_upstream_request_keeps_path_query_method() {
        let upstream = Upstream::new(
            "http://127.0.0.1:5001",
            Url::parse("http://127.0.0.1:5001").unwrap(),
        );
        let (parts, _) = Request::builder()
            .method(Method::PUT)
            .uri("/tasks/3?completed=true&x=%20")
            .header("host", "balancer:8080")
            .header("cookie", "session=abc")
            .body(())
            .unwrap()
            .into_parts();

        let req = upstream_request(&upstream, &parts, Bytes::from_static(b"{}"), &FORWARDING)
            .unwrap();

        assert_eq!(req.method(), Method::PUT);
        assert_eq!(
            req.uri().to_string(),
            "http://127.0.0.1:5001/tasks/3?completed=true&x=%20"
        );
        assert!(req.headers().get("host").is_none());
        assert_eq!(req.headers()["cookie"], "session=abc");
    }

    #[test]
    fn test_generated_ids_are_unique() {
        let req = Request::new(());
        let mut make = MakeRequestUuidV4;
        let a = make.make_request_id(&req).unwrap();
        let b = make.make_request_id(&req).unwrap();
        assert_ne!(a.header_value(), b.header_value());
    }

    #[test]
    fn test_request_id_fallback() {
        assert_eq!(request_id(&HeaderMap::new()), "unknown");
    }
}
