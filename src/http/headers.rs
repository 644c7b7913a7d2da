//! Header passthrough policy.
//!
//! # Responsibilities
//! - Decide which client request headers reach the upstream
//! - Strip per-leg headers from relayed upstream responses
//!
//! # Design Decisions
//! - One policy value applied by every forward, never ad hoc per call site
//! - Multi-valued headers (e.g. several `Cookie` lines) are copied in full
//! - `Accept-Encoding` is withheld so upstream bodies arrive unencoded,
//!   which keeps stripping `Content-Encoding` from the response correct

use axum::http::HeaderMap;

/// Allow/deny sets for forwarded headers. Names are lowercase.
#[derive(Debug, Clone, Copy)]
pub struct HeaderPolicy {
    request_denied: &'static [&'static str],
    response_denied: &'static [&'static str],
}

/// The policy used for all forwarded traffic.
pub const FORWARDING: HeaderPolicy = HeaderPolicy {
    // `host` is re-derived from the upstream URI; the body is re-framed.
    request_denied: &["host", "accept-encoding", "transfer-encoding"],
    response_denied: &["transfer-encoding", "content-encoding", "content-length"],
};

impl HeaderPolicy {
    /// Copy every allowed header from `source` into `dest`.
    pub fn copy_request_headers(&self, source: &HeaderMap, dest: &mut HeaderMap) {
        for (name, value) in source {
            if !self.request_denied.contains(&name.as_str()) {
                dest.append(name.clone(), value.clone());
            }
        }
    }

    /// Remove denied headers from an upstream response in place.
    pub fn strip_response_headers(&self, headers: &mut HeaderMap) {
        for name in self.response_denied {
            headers.remove(*name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_request_drops_host_keeps_cookies() {
        let mut source = HeaderMap::new();
        source.insert("host", HeaderValue::from_static("balancer:8080"));
        source.append("cookie", HeaderValue::from_static("a=1"));
        source.append("cookie", HeaderValue::from_static("b=2"));
        source.insert("authorization", HeaderValue::from_static("Bearer t"));
        source.insert("accept-encoding", HeaderValue::from_static("gzip"));

        let mut dest = HeaderMap::new();
        FORWARDING.copy_request_headers(&source, &mut dest);

        assert!(dest.get("host").is_none());
        assert!(dest.get("accept-encoding").is_none());
        assert_eq!(dest.get_all("cookie").iter().count(), 2);
        assert_eq!(dest["authorization"], "Bearer t");
    }

    #[test]
    fn test_response_strips_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert("transfer-encoding", HeaderValue::from_static("chunked"));
        headers.insert("content-encoding", HeaderValue::from_static("gzip"));
        headers.insert("content-length", HeaderValue::from_static("12"));
        headers.insert("content-type", HeaderValue::from_static("text/html"));
        headers.insert("location", HeaderValue::from_static("/tasks"));

        FORWARDING.strip_response_headers(&mut headers);

        assert_eq!(headers.len(), 2);
        assert_eq!(headers["content-type"], "text/html");
        assert_eq!(headers["location"], "/tasks");
    }
}
