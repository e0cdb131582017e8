//! Authentication Middleware
//! Mission: Gate any route behind a valid `x-access-tokens` token

use crate::auth::{
    api::AuthState,
    jwt::TokenError,
    models::MessageResponse,
    user_store::StoreError,
};
use crate::middleware::Rejection;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::{error, warn};

/// Request header carrying the access token
pub const TOKEN_HEADER: &str = "x-access-tokens";

/// Auth gate: verifies the token, resolves its identity to a user, then runs the route.
///
/// The resolved [`User`](crate::auth::models::User) is placed in request extensions, readable with `Extension<User>`.
pub async fn require_token(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    let header = req.headers().get(TOKEN_HEADER).ok_or(AuthError::Missing)?;
    // A present header is a token attempt; non-ASCII bytes cannot be a valid token
    let token = header
        .to_str()
        .map_err(|_| InvalidToken::from(TokenError::Malformed))?
        .trim();
    if token.is_empty() {
        return Err(AuthError::Missing);
    }

    let claims = state.tokens.verify(token).map_err(InvalidToken::from)?;

    let user = state
        .users
        .find_by_identity(&claims.sub)?
        .ok_or(InvalidToken::UnknownUser)?;

    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

/// Why a present token was not accepted
#[derive(Debug, Error)]
pub enum InvalidToken {
    #[error(transparent)]
    Token(#[from] TokenError),
    #[error("token identity does not belong to any user")]
    UnknownUser,
}

impl InvalidToken {
    pub fn reason(&self) -> &'static str {
        match self {
            InvalidToken::Token(e) => e.as_str(),
            InvalidToken::UnknownUser => "unknown_user",
        }
    }
}

/// Auth gate rejections
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("a valid token is missing")]
    Missing,
    #[error("token is invalid: {0}")]
    Invalid(#[from] InvalidToken),
    #[error("credential store unavailable: {0}")]
    Unavailable(#[from] StoreError),
}

impl AuthError {
    /// Category recorded in the request log
    pub fn rejection(&self) -> Rejection {
        match self {
            AuthError::Missing => Rejection("missing_token"),
            AuthError::Invalid(reason) => Rejection(reason.reason()),
            AuthError::Unavailable(_) => Rejection("store_unavailable"),
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let rejection = self.rejection();
        let (status, body) = match &self {
            AuthError::Missing => {
                warn!("Rejected request without token");
                (
                    StatusCode::UNAUTHORIZED,
                    MessageResponse::new("a valid token is missing"),
                )
            }
            AuthError::Invalid(reason) => {
                warn!(reason = reason.reason(), "Rejected request with invalid token");
                (
                    StatusCode::UNAUTHORIZED,
                    MessageResponse::new("token is invalid").with_reason(reason.reason()),
                )
            }
            AuthError::Unavailable(e) => {
                error!("Auth gate could not reach user store: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    MessageResponse::new("internal server error"),
                )
            }
        };

        rejection.attach((status, Json(body)).into_response())
    }
}
