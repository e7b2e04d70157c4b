// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Origin allow-list and fixed response headers.
//!
//! CORS headers are attached only when the request's `Origin` is on the
//! allow-list. Other origins still get the response body, but browsers will
//! refuse to expose it to the calling page.

use axum::{
    extract::{Request, State},
    http::{header, HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

pub const ALLOWED_METHODS: &str = "POST, OPTIONS";
pub const ALLOWED_HEADERS: &str = "Content-Type";

/// Headers set on every response.
pub const SECURITY_HEADERS: [(HeaderName, &str); 5] = [
    (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
    (header::X_FRAME_OPTIONS, "DENY"),
    (header::REFERRER_POLICY, "strict-origin-when-cross-origin"),
    (header::CONTENT_SECURITY_POLICY, "default-src 'none'"),
    (
        header::STRICT_TRANSPORT_SECURITY,
        "max-age=31536000; includeSubDomains",
    ),
];

/// Exact-match origin allow-list.
#[derive(Debug, Clone, Default)]
pub struct CorsPolicy {
    allowed: Vec<HeaderValue>,
}

impl CorsPolicy {
    pub fn new<S: AsRef<str>>(origins: &[S]) -> Self {
        let allowed = origins
            .iter()
            .filter_map(|o| {
                let trimmed = o.as_ref().trim().trim_end_matches('/');
                HeaderValue::from_str(trimmed).ok()
            })
            .filter(|v| !v.is_empty())
            .collect();
        Self { allowed }
    }

    pub fn is_allowed(&self, origin: &HeaderValue) -> bool {
        self.allowed.iter().any(|a| a == origin)
    }

    /// Add the CORS headers for `origin` if it is allowed.
    pub fn apply(&self, origin: Option<&HeaderValue>, response: &mut Response) {
        let headers = response.headers_mut();
        headers.append(header::VARY, HeaderValue::from_static("Origin"));

        let Some(origin) = origin else {
            return;
        };
        if !self.is_allowed(origin) {
            debug!(origin = ?origin, "Origin not allow-listed, omitting CORS headers");
            return;
        }
        headers.insert(header::ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOWED_METHODS),
        );
        headers.insert(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        );
    }
}

/// Middleware applying [`CorsPolicy`] to the wrapped routes.
pub async fn apply_cors(
    State(policy): State<Arc<CorsPolicy>>,
    request: Request,
    next: Next,
) -> Response {
    let origin = request.headers().get(header::ORIGIN).cloned();
    let mut response = next.run(request).await;
    policy.apply(origin.as_ref(), &mut response);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    fn policy() -> CorsPolicy {
        CorsPolicy::new(&["https://example.com/", " https://www.example.com"])
    }

    #[test]
    fn test_allowed_origin_gets_headers() {
        let mut response = ().into_response();
        let origin = HeaderValue::from_static("https://example.com");
        policy().apply(Some(&origin), &mut response);

        let headers = response.headers();
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_ORIGIN], "https://example.com");
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_METHODS], ALLOWED_METHODS);
        assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_HEADERS], ALLOWED_HEADERS);
    }

    #[test]
    fn test_other_origins_get_nothing() {
        for origin in [
            "https://malicious-site.com",
            "https://example.com.evil.net",
            "http://example.com",
            "null",
        ] {
            let mut response = ().into_response();
            policy().apply(Some(&HeaderValue::from_static(origin)), &mut response);
            assert!(
                !response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN),
                "{origin} must not be allowed"
            );
        }
    }

    #[test]
    fn test_missing_origin() {
        let mut response = ().into_response();
        policy().apply(None, &mut response);
        assert!(!response.headers().contains_key(header::ACCESS_CONTROL_ALLOW_ORIGIN));
        assert_eq!(response.headers()[header::VARY], "Origin");
    }

    #[test]
    fn test_empty_policy_allows_nothing() {
        let policy = CorsPolicy::new::<&str>(&[]);
        assert!(!policy.is_allowed(&HeaderValue::from_static("https://example.com")));
    }
}
