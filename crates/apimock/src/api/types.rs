//! Response helpers and error bodies for the HTTP API.

use crate::error::ResolveError;
use crate::store::StoreError;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::{Response, StatusCode};
use serde::Serialize;
use std::fmt::Display;

/// Error body: `{"type": ..., "description": ..., "errors": [...]}`.
#[derive(Debug, Serialize)]
pub struct ErrorMessage {
    /// Reason phrase of the status, e.g. `Not Found`
    #[serde(rename = "type")]
    pub error_type: String,
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl ErrorMessage {
    pub fn new(status: StatusCode, description: impl Into<String>) -> Self {
        Self {
            error_type: status.canonical_reason().unwrap_or("Error").to_string(),
            description: description.into(),
            errors: Vec::new(),
        }
    }
}

/// Create a JSON response
pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Full<Bytes>> {
    let json = serde_json::to_string_pretty(body).unwrap_or_else(|_| "{}".to_string());
    build_response_with_headers(status, [("Content-Type", "application/json")], json)
}

/// Build an HTTP response with the given status and body.
pub fn build_response(status: StatusCode, body: impl Into<Bytes>) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Build an HTTP response with headers.
pub fn build_response_with_headers(
    status: StatusCode,
    headers: impl IntoIterator<Item = (impl AsRef<str>, impl AsRef<str>)>,
    body: impl Into<Bytes>,
) -> Response<Full<Bytes>> {
    let mut builder = Response::builder().status(status);
    for (key, value) in headers {
        builder = builder.header(key.as_ref(), value.as_ref());
    }
    builder
        .body(Full::new(body.into()))
        .unwrap_or_else(|_| Response::new(Full::new(Bytes::from("Internal Server Error"))))
}

/// Create an error response
pub fn error_response(status: StatusCode, description: &str) -> Response<Full<Bytes>> {
    json_response(status, &ErrorMessage::new(status, description))
}

/// 422 with every validation failure listed
pub fn validation_response(errors: &[String]) -> Response<Full<Bytes>> {
    let status = StatusCode::UNPROCESSABLE_ENTITY;
    let mut message = ErrorMessage::new(status, "The mock definition is invalid");
    message.errors = errors.to_vec();
    json_response(status, &message)
}

pub fn method_not_allowed() -> Response<Full<Bytes>> {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

pub fn resolve_error_response(err: &ResolveError) -> Response<Full<Bytes>> {
    let status = match err {
        ResolveError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ResolveError::NotFound(_) => StatusCode::NOT_FOUND,
        ResolveError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error_response(status, &err.to_string())
}

pub fn store_error_response(err: &StoreError) -> Response<Full<Bytes>> {
    match err {
        StoreError::NotFound(_) => error_response(StatusCode::NOT_FOUND, &err.to_string()),
        StoreError::Validation(errors) => validation_response(errors),
        StoreError::Pattern(_) => {
            error_response(StatusCode::INTERNAL_SERVER_ERROR, &err.to_string())
        }
    }
}

/// Collect a request body into bytes
pub async fn collect_body<B>(body: B) -> Result<Bytes, String>
where
    B: Body<Data = Bytes>,
    B::Error: Display,
{
    body.collect()
        .await
        .map(|c| c.to_bytes())
        .map_err(|e| format!("Failed to read request body: {e}"))
}
