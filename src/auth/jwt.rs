//! JWT Token Service
//! Mission: Issue and verify signed, time-limited tokens

use crate::auth::models::{Claims, User};
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;
use tracing::debug;

/// Default token lifetime
pub const DEFAULT_TTL_MINUTES: i64 = 45;

/// Why a presented token was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("token is malformed or its signature does not verify")]
    Malformed,
    #[error("token has expired")]
    Expired,
}

impl TokenError {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenError::Malformed => "malformed",
            TokenError::Expired => "expired",
        }
    }
}

/// A freshly signed token and the claims it carries
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub claims: Claims,
}

/// HS256 token issuer/verifier. Stateless: validity is signature + expiry only.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str, ttl: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl,
        }
    }

    /// Issue a token for a user, starting now
    pub fn issue(&self, user: &User) -> Result<IssuedToken> {
        self.issue_at(user, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, user: &User, now: DateTime<Utc>) -> Result<IssuedToken> {
        let expiration = now
            .checked_add_signed(self.ttl)
            .context("Invalid timestamp")?;

        let claims = Claims {
            sub: user.email.clone(),
            name: user.name.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
        };

        debug!(
            "Issuing token for {} ({}), expires at {}",
            user.name, user.email, expiration
        );

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .context("Failed to sign token")?;

        Ok(IssuedToken { token, claims })
    }

    /// Verify a token against the wall clock
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now())
    }

    /// Verify a token as if the current time were `now`.
    ///
    /// Expiry is strict: a token is expired from the second its `exp` is reached.
    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked below against the caller's clock, with no leeway
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let decoded = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!("Rejected token: {}", e);
            TokenError::Malformed
        })?;

        if now.timestamp() >= decoded.claims.exp {
            debug!("Rejected expired token for {}", decoded.claims.sub);
            return Err(TokenError::Expired);
        }

        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::UserRole;
    use uuid::Uuid;

    fn create_test_user(name: &str) -> User {
        User {
            id: Uuid::new_v4(),
            email: format!("{}@example.com", name),
            name: name.to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::User,
        }
    }

    fn service(secret: &str) -> TokenService {
        TokenService::new(secret, Duration::minutes(DEFAULT_TTL_MINUTES))
    }

    #[test]
    fn test_issue_and_verify() {
        let tokens = service("test-secret-key-12345");
        let user = create_test_user("alice");
        let now = Utc::now();

        let issued = tokens.issue_at(&user, now).unwrap();
        assert!(!issued.token.is_empty());
        assert_eq!(issued.claims.exp - issued.claims.iat, 45 * 60);

        let claims = tokens.verify_at(&issued.token, now).unwrap();
        assert_eq!(claims.sub, "alice@example.com");
        assert_eq!(claims.name, "alice");
        assert_eq!(claims.exp, now.timestamp() + 45 * 60);
    }

    #[test]
    fn test_expired_token_rejected() {
        let tokens = service("test-secret-key-12345");
        let user = create_test_user("alice");
        let issued_at = Utc::now();
        let issued = tokens.issue_at(&user, issued_at).unwrap();

        let just_before = issued_at + Duration::minutes(45) - Duration::seconds(1);
        assert!(tokens.verify_at(&issued.token, just_before).is_ok());

        // No leeway: the expiry second itself is already expired
        let at_expiry = issued_at + Duration::minutes(45);
        assert_eq!(
            tokens.verify_at(&issued.token, at_expiry),
            Err(TokenError::Expired)
        );

        let later = issued_at + Duration::hours(2);
        assert_eq!(tokens.verify_at(&issued.token, later), Err(TokenError::Expired));
    }

    #[test]
    fn test_wall_clock_verify_of_backdated_token() {
        let tokens = service("test-secret-key-12345");
        let user = create_test_user("alice");
        let issued = tokens
            .issue_at(&user, Utc::now() - Duration::hours(1))
            .unwrap();

        assert_eq!(tokens.verify(&issued.token), Err(TokenError::Expired));
    }

    #[test]
    fn test_garbage_token_is_malformed() {
        let tokens = service("test-secret-key-12345");
        assert_eq!(tokens.verify("invalid.token.here"), Err(TokenError::Malformed));
        assert_eq!(tokens.verify(""), Err(TokenError::Malformed));
    }

    #[test]
    fn test_truncated_token_is_malformed() {
        let tokens = service("test-secret-key-12345");
        let issued = tokens.issue(&create_test_user("alice")).unwrap();

        let truncated = &issued.token[..issued.token.len() - 6];
        assert_eq!(tokens.verify(truncated), Err(TokenError::Malformed));
    }

    #[test]
    fn test_tampered_payload_is_malformed() {
        let tokens = service("test-secret-key-12345");
        let alice = tokens.issue(&create_test_user("alice")).unwrap().token;
        let mallory = tokens.issue(&create_test_user("mallory")).unwrap().token;

        // Splice mallory's payload under alice's signature
        let alice_parts: Vec<&str> = alice.split('.').collect();
        let mallory_parts: Vec<&str> = mallory.split('.').collect();
        let forged = format!("{}.{}.{}", alice_parts[0], mallory_parts[1], alice_parts[2]);

        assert_eq!(tokens.verify(&forged), Err(TokenError::Malformed));
    }

    #[test]
    fn test_different_secrets_reject() {
        let tokens1 = service("secret1");
        let tokens2 = service("secret2");
        let issued = tokens1.issue(&create_test_user("alice")).unwrap();

        assert_eq!(tokens2.verify(&issued.token), Err(TokenError::Malformed));
    }

    #[test]
    fn test_token_error_reason_codes() {
        assert_eq!(TokenError::Malformed.as_str(), "malformed");
        assert_eq!(TokenError::Expired.as_str(), "expired");
    }
}
