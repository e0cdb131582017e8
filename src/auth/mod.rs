//! Authentication Module
//! Mission: Secure lookup access with bcrypt-checked logins and stateless JWT tokens

pub mod api;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod user_store;

pub use api::AuthState;
pub use jwt::{TokenError, TokenService};
pub use middleware::{require_token, AuthError, TOKEN_HEADER};
pub use user_store::{AuthFailure, CredentialStore, UserStore};
