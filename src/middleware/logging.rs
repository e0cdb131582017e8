//! Request logging middleware.
//!
//! One event per request: the lookup target, the outcome, and why it was rejected.

use axum::{
    body::Body,
    extract::Query,
    http::{Request, Uri},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::time::Instant;
use tracing::{error, info, warn};

/// Short cause attached to a rejected response's extensions, read back by [`request_logging`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection(pub &'static str);

impl Rejection {
    /// Tag `response` with this rejection
    pub fn attach(self, mut response: Response) -> Response {
        response.extensions_mut().insert(self);
        response
    }
}

/// The `pgn` / `spn` query a lookup request asked for
#[derive(Debug, Default, Deserialize, PartialEq)]
pub struct LookupTarget {
    pub pgn: Option<String>,
    pub spn: Option<String>,
}

impl LookupTarget {
    pub fn from_uri(uri: &Uri) -> Self {
        Query::<LookupTarget>::try_from_uri(uri)
            .map(|Query(target)| target)
            .unwrap_or_default()
    }
}

/// Logs each request with its lookup target, status, latency and rejection cause.
///
/// Served requests log at INFO, rejections at WARN, server errors at ERROR.
/// Health checks are skipped.
pub async fn request_logging(request: Request<Body>, next: Next) -> Response {
    if request.uri().path() == "/health" {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let target = LookupTarget::from_uri(request.uri());
    let started = Instant::now();

    let response = next.run(request).await;

    let latency_ms = started.elapsed().as_millis() as u64;
    let status = response.status().as_u16();
    let pgn = target.pgn.as_deref();
    let spn = target.spn.as_deref();

    let rejection = response.extensions().get::<Rejection>().map(|r| r.0);

    if response.status().is_server_error() {
        error!(%method, %path, pgn, spn, status, latency_ms, rejection, "Request failed");
    } else if let Some(rejection) = rejection {
        warn!(%method, %path, pgn, spn, status, latency_ms, rejection, "Request rejected");
    } else {
        info!(%method, %path, pgn, spn, status, latency_ms, "Request served");
    }

    response
}
