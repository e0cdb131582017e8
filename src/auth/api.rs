//! Authentication API Endpoints
//! Mission: Provide login and logout endpoints

use crate::auth::{
    jwt::TokenService,
    models::{LoginResponse, MessageResponse},
    user_store::{AuthFailure, CredentialStore},
};
use crate::middleware::Rejection;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use axum_extra::{
    headers::{authorization::Basic, Authorization},
    TypedHeader,
};
use std::sync::Arc;
use tracing::{error, info, warn};

/// Shared auth state
#[derive(Clone)]
pub struct AuthState {
    pub users: Arc<dyn CredentialStore>,
    pub tokens: Arc<TokenService>,
}

impl AuthState {
    pub fn new(users: Arc<dyn CredentialStore>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }
}

/// Login endpoint - POST /login with HTTP Basic credentials
pub async fn login(
    State(state): State<AuthState>,
    credentials: Option<TypedHeader<Authorization<Basic>>>,
) -> Result<Json<LoginResponse>, AuthApiError> {
    let Some(TypedHeader(Authorization(basic))) = credentials else {
        warn!("❌ Login attempt without credentials");
        return Err(AuthApiError::InvalidCredentials);
    };

    let username = basic.username().to_string();
    let password = basic.password().to_string();
    if username.is_empty() || password.is_empty() {
        warn!("❌ Login attempt with empty credentials");
        return Err(AuthApiError::InvalidCredentials);
    }

    info!("🔐 Login attempt: {}", username);

    // bcrypt is CPU-bound; keep it off the async workers
    let users = state.users.clone();
    let attempted = username.clone();
    let verified = tokio::task::spawn_blocking(move || users.verify(&attempted, &password))
        .await
        .map_err(|e| {
            error!("Credential check panicked: {}", e);
            AuthApiError::InternalError
        })?;

    let user = match verified {
        Ok(user) => user,
        Err(AuthFailure::InvalidCredentials) => {
            warn!("❌ Failed login attempt: {}", username);
            return Err(AuthApiError::InvalidCredentials);
        }
        Err(AuthFailure::Unavailable(e)) => {
            error!("Credential store error during login: {}", e);
            return Err(AuthApiError::InternalError);
        }
    };

    let issued = state.tokens.issue(&user).map_err(|e| {
        error!("Failed to issue token: {:#}", e);
        AuthApiError::InternalError
    })?;

    info!("✅ Login successful: {} ({})", user.name, user.role.as_str());

    Ok(Json(LoginResponse {
        token: issued.token,
    }))
}

/// Logout endpoint - GET /logout
///
/// Tokens are stateless, so there is nothing to revoke; clients drop their token.
pub async fn logout() -> Json<MessageResponse> {
    info!("👋 Logout requested");
    Json(MessageResponse::new(
        "logged out; discard your token, it stays valid until it expires",
    ))
}

/// Auth API errors
#[derive(Debug)]
pub enum AuthApiError {
    /// Missing, unknown, or wrong credentials, all reported identically
    InvalidCredentials,
    InternalError,
}

impl IntoResponse for AuthApiError {
    fn into_response(self) -> Response {
        match self {
            AuthApiError::InvalidCredentials => Rejection("bad_credentials").attach(
                (
                    StatusCode::UNAUTHORIZED,
                    [(header::WWW_AUTHENTICATE, "Basic realm=\"login required\"")],
                    "could not verify",
                )
                    .into_response(),
            ),
            AuthApiError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{models::UserRole, user_store::UserStore};
    use axum::body::to_bytes;
    use axum::http::HeaderMap;
    use chrono::Duration;
    use tempfile::NamedTempFile;

    const TEST_COST: u32 = 4;

    fn create_test_state() -> (AuthState, NamedTempFile) {
        let temp_file = NamedTempFile::new().unwrap();
        let store = UserStore::with_cost(temp_file.path().to_str().unwrap(), TEST_COST).unwrap();
        store
            .create_user("alice@example.com", "alice", "wonderland", UserRole::User)
            .unwrap();

        let tokens = Arc::new(TokenService::new("test-secret", Duration::minutes(45)));
        (AuthState::new(Arc::new(store), tokens), temp_file)
    }

    fn basic(username: &str, password: &str) -> Option<TypedHeader<Authorization<Basic>>> {
        Some(TypedHeader(Authorization::basic(username, password)))
    }

    async fn failure_body(err: AuthApiError) -> (StatusCode, HeaderMap, String) {
        let response = err.into_response();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_login_issues_token_for_identity() {
        let (state, _temp) = create_test_state();

        let Json(response) = login(State(state.clone()), basic("alice", "wonderland"))
            .await
            .unwrap();

        let claims = state.tokens.verify(&response.token).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.exp - claims.iat, 45 * 60);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let (state, _temp) = create_test_state();

        let wrong_password = login(State(state.clone()), basic("alice", "nope"))
            .await
            .unwrap_err();
        let unknown_user = login(State(state.clone()), basic("mallory", "wonderland"))
            .await
            .unwrap_err();
        let no_credentials = login(State(state), None).await.unwrap_err();

        let wrong_password = failure_body(wrong_password).await;
        let unknown_user = failure_body(unknown_user).await;
        let no_credentials = failure_body(no_credentials).await;

        assert_eq!(wrong_password.0, StatusCode::UNAUTHORIZED);
        assert_eq!(wrong_password.0, unknown_user.0);
        assert_eq!(wrong_password.2, unknown_user.2);
        assert_eq!(wrong_password.2, no_credentials.2);
        assert!(wrong_password.1.contains_key(header::WWW_AUTHENTICATE));
    }

    #[tokio::test]
    async fn test_logout_is_advisory() {
        let Json(body) = logout().await;
        assert!(body.message.contains("logged out"));
    }
}
