//! User Storage
//! Mission: Store user accounts in SQLite and verify credentials against them

use crate::auth::models::{User, UserRole};
use bcrypt::{hash, verify, DEFAULT_COST};
use rusqlite::{params, Connection, OptionalExtension, Row};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Storage-level failures (not credential mismatches)
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

/// Outcome of a failed login
#[derive(Debug, Error)]
pub enum AuthFailure {
    /// Unknown username and wrong password are deliberately the same variant
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error(transparent)]
    Unavailable(#[from] StoreError),
}

/// Read side of the user table as the auth layer needs it.
///
/// Lookups are exact and case-sensitive.
pub trait CredentialStore: Send + Sync {
    fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    fn find_by_identity(&self, identity: &str) -> Result<Option<User>, StoreError>;

    /// Check a username/password pair, returning the matching user
    fn verify(&self, username: &str, password: &str) -> Result<User, AuthFailure>;
}

/// User storage with SQLite backend
pub struct UserStore {
    db_path: String,
    cost: u32,
    /// Verified against when the username is unknown, so both failure paths cost a bcrypt round
    dummy_hash: String,
}

const USER_COLUMNS: &str = "id, email, name, password_hash, role";

impl UserStore {
    /// Create a new user store and initialize database
    pub fn new(db_path: &str) -> Result<Self, StoreError> {
        Self::with_cost(db_path, DEFAULT_COST)
    }

    /// Create a store hashing with a specific bcrypt cost
    pub fn with_cost(db_path: &str, cost: u32) -> Result<Self, StoreError> {
        let store = Self {
            db_path: db_path.to_string(),
            cost,
            dummy_hash: hash(Uuid::new_v4().to_string(), cost)?,
        };
        store.init_db()?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        Ok(Connection::open(&self.db_path)?)
    }

    /// Initialize database schema
    fn init_db(&self) -> Result<(), StoreError> {
        let conn = self.connect()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id TEXT PRIMARY KEY,
                email TEXT UNIQUE NOT NULL,
                name TEXT UNIQUE NOT NULL,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Create an admin account if none exists yet. Returns true when one was created.
    pub fn ensure_admin(&self, password: &str) -> Result<bool, StoreError> {
        let conn = self.connect()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?1",
            params![UserRole::Admin.as_str()],
            |row| row.get(0),
        )?;

        if count > 0 {
            return Ok(false);
        }

        self.create_user("admin@localhost", "admin", password, UserRole::Admin)?;
        warn!("⚠️  Bootstrap admin created (username: admin). Rotate its password.");
        Ok(true)
    }

    /// Create a new user
    pub fn create_user(
        &self,
        email: &str,
        name: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, StoreError> {
        let user = User {
            id: Uuid::new_v4(),
            email: email.to_string(),
            name: name.to_string(),
            password_hash: hash(password, self.cost)?,
            role,
        };

        let conn = self.connect()?;
        conn.execute(
            "INSERT INTO users (id, email, name, password_hash, role)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                user.id.to_string(),
                user.email,
                user.name,
                user.password_hash,
                user.role.as_str(),
            ],
        )?;

        info!("✅ Created user: {} ({})", user.name, user.role.as_str());

        Ok(user)
    }

    /// Rotate a user's password. Returns false when the user does not exist.
    pub fn set_password(&self, name: &str, password: &str) -> Result<bool, StoreError> {
        let password_hash = hash(password, self.cost)?;

        let conn = self.connect()?;
        let rows_affected = conn.execute(
            "UPDATE users SET password_hash = ?1 WHERE name = ?2",
            params![password_hash, name],
        )?;

        if rows_affected > 0 {
            info!("🔑 Rotated password for user: {}", name);
        }
        Ok(rows_affected > 0)
    }

    /// List all users
    pub fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM users ORDER BY name",
            USER_COLUMNS
        ))?;

        let users = stmt
            .query_map([], row_to_user)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    fn find_one(&self, column: &str, value: &str) -> Result<Option<User>, StoreError> {
        let conn = self.connect()?;
        let user = conn
            .query_row(
                &format!("SELECT {} FROM users WHERE {} = ?1", USER_COLUMNS, column),
                params![value],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }
}

impl CredentialStore for UserStore {
    fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.find_one("name", username)
    }

    fn find_by_identity(&self, identity: &str) -> Result<Option<User>, StoreError> {
        self.find_one("email", identity)
    }

    fn verify(&self, username: &str, password: &str) -> Result<User, AuthFailure> {
        match self.find_by_username(username)? {
            Some(user) => {
                if verify(password, &user.password_hash).map_err(StoreError::from)? {
                    Ok(user)
                } else {
                    debug!("Password mismatch for {}", username);
                    Err(AuthFailure::InvalidCredentials)
                }
            }
            None => {
                let _ = verify(password, &self.dummy_hash);
                debug!("Unknown username {}", username);
                Err(AuthFailure::InvalidCredentials)
            }
        }
    }
}

fn row_to_user(row: &Row<'_>) -> rusqlite::Result<User> {
    let id: String = row.get(0)?;
    let id = Uuid::parse_str(&id).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
    })?;
    let role: String = row.get(4)?;

    Ok(User {
        id,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        role: UserRole::parse(&role).unwrap_or(UserRole::User),
    })
}
