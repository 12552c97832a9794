//! Response hardening for the JSON API.

use axum::{
    extract::Request,
    http::{HeaderName, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Headers stamped on every response, success or error.
///
/// The API never serves documents, so the policy denies everything a
/// browser could do with a response body: no caching of session-bearing
/// responses, no MIME sniffing, no framing, no referrer leakage, HTTPS only
/// (two years, subdomains included) and an empty CSP.
const SECURITY_HEADERS: [(&str, &str); 6] = [
    ("cache-control", "no-store"),
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "DENY"),
    ("referrer-policy", "no-referrer"),
    (
        "strict-transport-security",
        "max-age=63072000; includeSubDomains",
    ),
    (
        "content-security-policy",
        "default-src 'none'; frame-ancestors 'none'",
    ),
];

/// Add [`SECURITY_HEADERS`] to the response, replacing any value a handler set.
///
/// ```rust,no_run
/// use axum::{middleware, Router};
/// use blogpad::middleware::security_headers;
///
/// let app: Router = Router::new().layer(middleware::from_fn(security_headers));
/// ```
pub async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;

    for (name, value) in SECURITY_HEADERS {
        response
            .headers_mut()
            .insert(HeaderName::from_static(name), HeaderValue::from_static(value));
    }

    response
}
