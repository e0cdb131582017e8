//! Service Configuration
//! Mission: Gather startup settings from flags, environment, and `.env`

use crate::auth::jwt::DEFAULT_TTL_MINUTES;
use anyhow::{ensure, Context, Result};
use chrono::{Duration, Utc};
use clap::{ArgAction, Args};
use std::path::PathBuf;
use tracing::warn;

const DEV_JWT_SECRET: &str = "dev-secret-change-in-production-minimum-32-characters";

/// Settings for the HTTP service
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Address the API server listens on
    #[arg(long, env = "BIND_ADDR", default_value = "0.0.0.0:5000")]
    pub bind_addr: String,

    /// J1939 dataset (JSON with J1939PGNdb / J1939SPNdb tables)
    #[arg(long, env = "DATASET_PATH", default_value = "j1939.json")]
    pub dataset_path: PathBuf,

    /// HS256 signing key for access tokens
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Access token lifetime in minutes
    #[arg(long, env = "TOKEN_TTL_MINUTES", default_value_t = DEFAULT_TTL_MINUTES)]
    pub token_ttl_minutes: i64,

    /// Require an `x-access-tokens` token on the lookup routes
    #[arg(long, env = "REQUIRE_TOKEN", default_value_t = true, action = ArgAction::Set)]
    pub require_token: bool,

    /// Create an `admin` account with this password if no admin exists
    #[arg(long, env = "BOOTSTRAP_ADMIN_PASSWORD", hide_env_values = true)]
    pub bootstrap_admin_password: Option<String>,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        self.token_ttl().map(|_| ())
    }

    /// Token lifetime; positive, and short enough that expiry stays a valid timestamp
    pub fn token_ttl(&self) -> Result<Duration> {
        ensure!(
            self.token_ttl_minutes > 0,
            "TOKEN_TTL_MINUTES must be positive, got {}",
            self.token_ttl_minutes
        );
        let ttl = Duration::try_minutes(self.token_ttl_minutes).with_context(|| {
            format!("TOKEN_TTL_MINUTES {} is too large", self.token_ttl_minutes)
        })?;
        ensure!(
            Utc::now().checked_add_signed(ttl).is_some(),
            "TOKEN_TTL_MINUTES {} puts token expiry out of range",
            self.token_ttl_minutes
        );
        Ok(ttl)
    }

    /// Configured signing key, or the development default (with a warning)
    pub fn jwt_secret(&self) -> String {
        match self.jwt_secret.as_deref().map(str::trim) {
            Some(secret) if !secret.is_empty() => secret.to_string(),
            _ => {
                warn!("⚠️  JWT_SECRET not set, using development secret. SET IT IN PRODUCTION!");
                DEV_JWT_SECRET.to_string()
            }
        }
    }
}

/// Settings for the user database, shared by the server and provisioning commands
#[derive(Debug, Clone, Args)]
pub struct StoreConfig {
    /// SQLite database holding user accounts
    #[arg(long, env = "AUTH_DB_PATH", default_value = "login.db", global = true)]
    pub auth_db_path: String,

    /// bcrypt cost for new password hashes
    #[arg(long, env = "BCRYPT_COST", default_value_t = bcrypt::DEFAULT_COST, global = true)]
    pub bcrypt_cost: u32,
}
