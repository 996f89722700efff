//! HTTP response builders.
//!
//! Provides convenient functions for building JSON and text responses.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Response, StatusCode};
use serde::Serialize;

/// Response body type used throughout waypoint.
pub type Body = Full<Bytes>;

/// Full response type used throughout waypoint.
pub type HttpResponse = Response<Body>;

fn with_type(status: StatusCode, content_type: &'static str, body: Bytes) -> HttpResponse {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

fn error(status: StatusCode, message: &str) -> HttpResponse {
    let body = serde_json::json!({ "error": message });
    with_type(status, "application/json", Bytes::from(body.to_string()))
}

/// Build a JSON response with the given status code and body.
pub fn json<T: Serialize>(status: StatusCode, body: &T) -> crate::Result<HttpResponse> {
    let json = serde_json::to_vec(body)?;
    Ok(with_type(status, "application/json", Bytes::from(json)))
}

/// Build a 200 OK response from already-serialized JSON.
pub fn raw_json(json: Bytes) -> HttpResponse {
    with_type(StatusCode::OK, "application/json", json)
}

/// Build a 200 OK JSON response.
pub fn ok<T: Serialize>(body: &T) -> crate::Result<HttpResponse> {
    json(StatusCode::OK, body)
}

/// Build a 201 Created JSON response.
pub fn created<T: Serialize>(body: &T) -> crate::Result<HttpResponse> {
    json(StatusCode::CREATED, body)
}

/// Build a 200 OK plain-text response.
pub fn text(body: impl Into<String>) -> HttpResponse {
    with_type(
        StatusCode::OK,
        "text/plain; charset=utf-8",
        Bytes::from(body.into()),
    )
}

/// Build a 204 No Content response.
pub fn no_content() -> HttpResponse {
    let mut response = Response::new(Full::new(Bytes::new()));
    *response.status_mut() = StatusCode::NO_CONTENT;
    response
}

/// Build a 404 Not Found JSON response.
pub fn not_found(message: &str) -> HttpResponse {
    error(StatusCode::NOT_FOUND, message)
}

/// Build a 405 Method Not Allowed JSON response.
pub fn method_not_allowed() -> HttpResponse {
    error(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

/// Build a 400 Bad Request JSON response.
pub fn bad_request(message: &str) -> HttpResponse {
    error(StatusCode::BAD_REQUEST, message)
}
