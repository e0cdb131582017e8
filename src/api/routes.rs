use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::warn;

use crate::api::reference_api;
use crate::auth::{api as auth_api, require_token, AuthState};
use crate::middleware::{request_logging, Rejection};
use crate::reference::LookupEngine;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub lookup: LookupEngine,
    pub auth: AuthState,
    /// Put the lookup routes behind the token gate
    pub require_token: bool,
}

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/login", post(auth_api::login))
        .route("/logout", get(auth_api::logout))
        .with_state(state.auth.clone());

    let lookup_routes = Router::new()
        .route("/api/all", get(reference_api::get_all))
        .route("/api/PGNs/all", get(reference_api::get_all_pgns))
        .route("/api/PGNs", get(reference_api::get_pgn))
        .route("/api/PGNDecoder", get(reference_api::decode_pgn))
        .route("/api/SPNs/all", get(reference_api::get_all_spns))
        .route("/api/SPNs", get(reference_api::get_spn));

    let lookup_routes = if state.require_token {
        lookup_routes.route_layer(middleware::from_fn_with_state(
            state.auth.clone(),
            require_token,
        ))
    } else {
        warn!("⚠️  Token gate disabled: lookup routes are public");
        lookup_routes
    };

    let public_routes = Router::new().route("/health", get(health_check));

    Router::new()
        .merge(public_routes)
        .merge(auth_routes)
        .merge(lookup_routes.with_state(state.lookup))
        .fallback(route_not_found)
        .layer(middleware::from_fn(method_not_allowed))
        .layer(middleware::from_fn(request_logging))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// ===== Route Handlers =====

/// Health check endpoint
async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Framework-level HTTP error body
#[derive(Debug, Serialize, Deserialize)]
pub struct HttpErrorResponse {
    pub code: u16,
    pub name: String,
    pub description: String,
}

impl HttpErrorResponse {
    fn new(status: StatusCode, description: &str) -> Self {
        Self {
            code: status.as_u16(),
            name: status.canonical_reason().unwrap_or_default().to_string(),
            description: description.to_string(),
        }
    }
}

/// Fallback for paths no route matches
async fn route_not_found() -> Response {
    let body = HttpErrorResponse::new(
        StatusCode::NOT_FOUND,
        "The requested URL was not found on the server. If you entered the URL manually \
         please check your spelling and try again.",
    );
    Rejection("unknown_route").attach((StatusCode::NOT_FOUND, Json(body)).into_response())
}

/// Replaces axum's empty 405 for a known path with the JSON error body, keeping `Allow`
async fn method_not_allowed(request: Request, next: Next) -> Response {
    let response = next.run(request).await;
    if response.status() != StatusCode::METHOD_NOT_ALLOWED
        || response.headers().contains_key(header::CONTENT_TYPE)
    {
        return response;
    }

    let body = HttpErrorResponse::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "The method is not allowed for the requested URL.",
    );
    let mut rewritten = (StatusCode::METHOD_NOT_ALLOWED, Json(body)).into_response();
    if let Some(allow) = response.headers().get(header::ALLOW) {
        rewritten.headers_mut().insert(header::ALLOW, allow.clone());
    }
    Rejection("method_not_allowed").attach(rewritten)
}
