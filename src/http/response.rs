//! HTTP response building module
//!
//! Turns handler outcomes into hyper responses. All non-redirect responses
//! share the `{status, message, data?}` JSON envelope.

use http_body_util::Full;
use hyper::body::Bytes;
use hyper::{Response, StatusCode};
use serde::Serialize;
use serde_json::{Map, Value};

/// Methods the intake endpoint answers
pub const ALLOWED_METHODS: &str = "GET, POST, PATCH, DELETE";

/// JSON body shared by every non-redirect response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub status: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Map<String, Value>>,
}

impl Envelope {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            data: None,
        }
    }

    /// Attach `data`; an empty map is dropped
    #[must_use]
    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = if data.is_empty() { None } else { Some(data) };
        self
    }
}

/// Build an envelope response with `Content-Type: application/json`
pub fn build_envelope_response(envelope: &Envelope) -> Response<Full<Bytes>> {
    let status = StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    let json = match serde_json::to_string(envelope) {
        Ok(j) => j,
        Err(e) => {
            crate::logger::log_error(&format!("Failed to serialize response: {e}"));
            return build_500_fallback();
        }
    };

    let mut builder = Response::builder()
        .status(status)
        .header("Content-Type", "application/json");
    if status == StatusCode::METHOD_NOT_ALLOWED {
        builder = builder.header("Allow", ALLOWED_METHODS);
    }

    builder
        .body(Full::new(Bytes::from(json)))
        .unwrap_or_else(|e| {
            log_build_error(status.as_str(), &e);
            build_500_fallback()
        })
}

/// Build 302 redirect response
pub fn build_redirect_response(target: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header("Location", target)
        .body(Full::new(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error("302", &e);
            build_500_fallback()
        })
}

/// Build 404 envelope for paths other than the intake path
pub fn build_404_response() -> Response<Full<Bytes>> {
    build_envelope_response(&Envelope::new(StatusCode::NOT_FOUND, "Not Found"))
}

/// Build plain-text health probe response
pub fn build_health_response(status: StatusCode, body: &'static str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .header("Cache-Control", "no-cache")
        .body(Full::new(Bytes::from_static(body.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error("health", &e);
            Response::new(Full::new(Bytes::from_static(body.as_bytes())))
        })
}

fn build_500_fallback() -> Response<Full<Bytes>> {
    let mut resp = Response::new(Full::new(Bytes::from_static(
        br#"{"status":500,"message":"Internal server error"}"#,
    )));
    *resp.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    resp
}

/// Log response build error
fn log_build_error(status: &str, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}
