//! Security headers middleware
//!
//! Adds security headers to all HTTP responses:
//! - X-Content-Type-Options: nosniff - Prevents MIME type sniffing
//! - X-Frame-Options: DENY - Prevents clickjacking attacks
//! - Strict-Transport-Security: HSTS header for HTTPS enforcement
//! - Content-Security-Policy: Restricts resource loading
//! - Referrer-Policy: Controls referrer information

use axum::{
    body::Body,
    extract::Request,
    http::{header, HeaderValue},
    middleware::Next,
    response::Response,
};

/// Security headers middleware
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    // Prevent MIME type sniffing
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );

    // Prevent clickjacking by disallowing embedding in frames
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));

    // Enforce HTTPS for 1 year including subdomains
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );

    // Only allow resources from same origin
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'self'"),
    );

    // Control referrer information sent with requests
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );

    response
}
