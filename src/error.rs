//! Error types with HTTP status code mapping.

use bytes::Bytes;
use http_body_util::Full;
use hyper::{Response, StatusCode};

use crate::format::Invalid;

/// Error type for waypoint operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // Request errors
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Invalid value for `{field}`: {source}")]
    Decode {
        field: String,
        #[source]
        source: Invalid,
    },

    // Config errors
    #[error("Configuration error: {0}")]
    Config(String),

    // System errors
    #[error("Invalid address: {0}")]
    AddrParse(#[from] std::net::AddrParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map error to HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Conflict(_) => StatusCode::CONFLICT,
            Error::BadRequest(_) | Error::Decode { .. } | Error::AddrParse(_) => {
                StatusCode::BAD_REQUEST
            }

            // Config errors -> 500 (shouldn't happen at runtime)
            Error::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,

            Error::Io(_) | Error::Json(_) | Error::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Convert error into HTTP response.
    pub fn into_response(self) -> Response<Full<Bytes>> {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!("Internal error: {self}");
            "Internal server error".to_string()
        } else {
            self.to_string()
        };
        let body = serde_json::json!({
            "error": message
        });

        let mut response = Response::new(Full::new(Bytes::from(body.to_string())));
        *response.status_mut() = status;
        response.headers_mut().insert(
            hyper::header::CONTENT_TYPE,
            hyper::header::HeaderValue::from_static("application/json"),
        );
        response
    }
}

/// An error that can be documented as an operation response.
///
/// Error-response fields hand the document builder a `&dyn HttpError`; the
/// response is keyed by [`status`](HttpError::status), or 500 when it is `None`.
pub trait HttpError: std::error::Error + Send + Sync {
    fn status(&self) -> Option<u16> {
        None
    }
}

impl HttpError for Error {
    fn status(&self) -> Option<u16> {
        Some(self.status_code().as_u16())
    }
}

/// Result type alias using waypoint's Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_maps_to_bad_request() {
        let err = Error::Decode {
            field: "since".into(),
            source: Invalid::new("date-time", "not-a-date"),
        };
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.status(), Some(400));
        assert!(err.to_string().contains("`since`"));
        assert!(err.to_string().contains("not-a-date"));
    }

    #[test]
    fn internal_maps_to_500() {
        assert_eq!(
            Error::Internal("boom".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
