//! Security headers and request validation

use axum::{
    body::Body,
    http::{header, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::api::types::ApiError;

/// Maximum accepted request body (64 KiB); every request body here is small JSON
pub const MAX_BODY_SIZE: usize = 64 * 1024;

/// Middleware to add security headers to all responses
pub async fn security_headers_middleware(request: Request<Body>, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static("strict-origin-when-cross-origin"),
    );
    headers.insert(
        header::CONTENT_SECURITY_POLICY,
        HeaderValue::from_static("default-src 'none'; frame-ancestors 'none'"),
    );
    headers.insert(
        header::STRICT_TRANSPORT_SECURITY,
        HeaderValue::from_static("max-age=31536000; includeSubDomains"),
    );

    // Key material must never be cached by intermediaries
    if !headers.contains_key(header::CACHE_CONTROL) {
        headers.insert(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-store, no-cache, must-revalidate"),
        );
    }

    response
}

/// Middleware rejecting oversized or suspicious requests before routing
pub async fn request_validation_middleware(request: Request<Body>, next: Next) -> Response {
    let content_length = request
        .headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<usize>().ok());

    if let Err(e) = validate_content_length(content_length)
        .and_then(|()| validate_request_path(request.uri().path()))
    {
        return ApiError::from(e).into_response();
    }

    next.run(request).await
}

/// Why a request was refused before routing
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RequestValidationError {
    #[error("Request body too large: {0} bytes (max: {max} bytes)", max = MAX_BODY_SIZE)]
    TooLarge(usize),
    #[error("Invalid path: path traversal detected")]
    PathTraversal,
    #[error("Invalid request: prohibited characters")]
    InvalidCharacters,
}

impl From<RequestValidationError> for ApiError {
    fn from(err: RequestValidationError) -> Self {
        match err {
            RequestValidationError::TooLarge(_) => ApiError::new(
                axum::http::StatusCode::PAYLOAD_TOO_LARGE,
                crate::api::types::ApiErrorKind::BadRequest,
                err.to_string(),
            ),
            _ => ApiError::bad_request(err.to_string()),
        }
    }
}

pub fn validate_content_length(
    content_length: Option<usize>,
) -> Result<(), RequestValidationError> {
    match content_length {
        Some(len) if len > MAX_BODY_SIZE => Err(RequestValidationError::TooLarge(len)),
        _ => Ok(()),
    }
}

pub fn validate_request_path(path: &str) -> Result<(), RequestValidationError> {
    if path.contains("..") || path.contains("//") {
        return Err(RequestValidationError::PathTraversal);
    }

    if path.contains('\0') {
        return Err(RequestValidationError::InvalidCharacters);
    }

    Ok(())
}
