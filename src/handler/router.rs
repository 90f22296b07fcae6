//! Request routing dispatch module
//!
//! Entry point for HTTP request processing: health probes, path check, the
//! per-request database connection, then the intake handler.

use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use hyper::header::{HeaderName, CONTENT_TYPE, REFERER, USER_AGENT};
use hyper::{Method, Request, Response, StatusCode};
use std::convert::Infallible;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use super::intake::{release, Outcome, RequestHandler};
use crate::config::AppState;
use crate::error::IntakeError;
use crate::http;
use crate::intake::{self, FormFields, ValidationError};
use crate::logger::{self, AccessLogEntry};

const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Main entry point for HTTP request handling
pub async fn handle_request<B>(
    req: Request<B>,
    state: Arc<AppState>,
    peer_addr: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible>
where
    B: Body,
    B::Error: Display,
{
    let started = Instant::now();
    let access_log = state.config.logging.access_log;
    let mut entry = access_log.then(|| access_entry(&req, peer_addr));

    let response = route_request(req, &state).await;

    if let Some(entry) = entry.as_mut() {
        entry.status = response.status().as_u16();
        entry.body_bytes = usize::try_from(response.body().size_hint().exact().unwrap_or(0))
            .unwrap_or(usize::MAX);
        entry.request_time_us = u64::try_from(started.elapsed().as_micros()).unwrap_or(u64::MAX);
        logger::log_access(entry, &state.config.logging.access_log_format);
    }

    Ok(response)
}

fn access_entry<B>(req: &Request<B>, peer_addr: SocketAddr) -> AccessLogEntry {
    let header = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(ToString::to_string)
    };

    let mut entry = AccessLogEntry::new(
        peer_addr.ip().to_string(),
        req.method().to_string(),
        req.uri().path().to_string(),
    );
    entry.query = req.uri().query().map(ToString::to_string);
    entry.http_version = logger::http_version_label(req.version()).to_string();
    entry.referer = header(REFERER);
    entry.user_agent = header(USER_AGENT);
    entry
}

/// Route request based on path and configuration
async fn route_request<B>(req: Request<B>, state: &AppState) -> Response<Full<Bytes>>
where
    B: Body,
    B::Error: Display,
{
    let path = req.uri().path();

    // Health check endpoints never reach the intake handler
    let health = &state.config.server.health;
    if health.enabled {
        if path == health.liveness_path {
            return http::build_health_response(StatusCode::OK, "ok");
        }
        if path == health.readiness_path {
            return check_readiness(state).await;
        }
    }

    if path != state.config.intake.path {
        return http::build_404_response();
    }

    let handler = match RequestHandler::connect(state).await {
        Ok(handler) => handler,
        Err(e) => return Outcome::from_error(&e).into_response(),
    };

    let method = req.method().clone();
    let outcome = if method == Method::POST {
        match read_form(req).await {
            Ok(fields) => handler.handle(&method, &fields).await,
            Err(e) => handler.reject(&IntakeError::from(e)).await,
        }
    } else {
        handler.handle(&method, &FormFields::new()).await
    };

    outcome.into_response()
}

/// How a POST body carries its form fields
enum FormEncoding {
    UrlEncoded,
    Multipart(String),
}

/// Urlencoded (also assumed when no type is given) or multipart with a
/// boundary; anything else carries no form fields
fn form_encoding(content_type: Option<&str>) -> Option<FormEncoding> {
    match content_type {
        None => Some(FormEncoding::UrlEncoded),
        Some(value) if is_form_content_type(value) => Some(FormEncoding::UrlEncoded),
        Some(value) => multer::parse_boundary(value).ok().map(FormEncoding::Multipart),
    }
}

/// Collect the body and decode it according to its content type
async fn read_form<B>(req: Request<B>) -> Result<FormFields, ValidationError>
where
    B: Body,
    B::Error: Display,
{
    let content_type = req
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned);

    let Some(encoding) = form_encoding(content_type.as_deref()) else {
        return Ok(FormFields::new());
    };

    let body = req
        .into_body()
        .collect()
        .await
        .map_err(|e| ValidationError::MalformedBody(e.to_string()))?
        .to_bytes();

    match encoding {
        FormEncoding::UrlEncoded => intake::parse_form(&body),
        FormEncoding::Multipart(boundary) => intake::parse_multipart(body, &boundary).await,
    }
}

fn is_form_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .is_some_and(|mime| mime.trim().eq_ignore_ascii_case(FORM_CONTENT_TYPE))
}

/// Readiness: a store connection can be opened and pinged
async fn check_readiness(state: &AppState) -> Response<Full<Bytes>> {
    let result = match state.store.connect().await {
        Ok(mut conn) => {
            let pinged = conn.ping().await;
            release(conn).await;
            pinged
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => http::build_health_response(StatusCode::OK, "ok"),
        Err(e) => {
            logger::log_warning(&format!("Readiness check failed: {e}"));
            http::build_health_response(StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}
