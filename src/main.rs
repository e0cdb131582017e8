//! J1939 API - token-gated PGN/SPN reference lookups
//!
//! Usage:
//!   j1939-api                                   # serve (settings from env / .env)
//!   j1939-api add-user --email a@b.c --name alice --password ...
//!   j1939-api set-password --name alice --password ...
//!   j1939-api users

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use j1939_api::{
    api::{create_router, AppState},
    auth::{models::UserRole, AuthState, TokenService, UserStore},
    config::{ServerConfig, StoreConfig},
    reference::{LookupEngine, ReferenceIndex},
};
use std::path::Path;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Token-gated lookup service for the J1939 PGN/SPN dataset
#[derive(Parser, Debug)]
#[command(name = "j1939-api", version)]
struct Cli {
    #[command(flatten)]
    store: StoreConfig,

    #[command(flatten)]
    server: ServerConfig,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the API server (the default)
    Serve,

    /// Provision a new user account
    AddUser {
        /// Identity bound into issued tokens
        #[arg(long)]
        email: String,

        /// Login name
        #[arg(long)]
        name: String,

        #[arg(long, env = "NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,

        /// Grant the admin role
        #[arg(long)]
        admin: bool,
    },

    /// Rotate an existing user's password
    SetPassword {
        #[arg(long)]
        name: String,

        #[arg(long, env = "NEW_USER_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// List user accounts
    Users,
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(cli.server, cli.store).await,
        Command::AddUser {
            email,
            name,
            password,
            admin,
        } => {
            let role = if admin { UserRole::Admin } else { UserRole::User };
            let user = open_store(&cli.store)?
                .create_user(&email, &name, &password, role)
                .with_context(|| format!("Failed to create user {}", name))?;
            info!("User {} <{}> created with id {}", user.name, user.email, user.id);
            Ok(())
        }
        Command::SetPassword { name, password } => {
            if !open_store(&cli.store)?.set_password(&name, &password)? {
                bail!("No user named {}", name);
            }
            Ok(())
        }
        Command::Users => {
            for user in open_store(&cli.store)?.list_users()? {
                println!("{}\t{}\t{}\t{}", user.id, user.name, user.email, user.role.as_str());
            }
            Ok(())
        }
    }
}

async fn serve(server: ServerConfig, store: StoreConfig) -> Result<()> {
    server.validate()?;

    info!("🚀 J1939 API starting");

    // The index is built completely before any route can observe it
    let index = ReferenceIndex::load(&server.dataset_path).with_context(|| {
        format!(
            "Cannot serve lookups without the dataset at {}",
            server.dataset_path.display()
        )
    })?;
    let lookup = LookupEngine::new(Arc::new(index));

    let user_store = open_store(&store)?;
    if let Some(password) = server.bootstrap_admin_password.as_deref() {
        user_store.ensure_admin(password)?;
    }
    info!("🔐 Authentication initialized at: {}", store.auth_db_path);

    let tokens = Arc::new(TokenService::new(&server.jwt_secret(), server.token_ttl()?));
    let auth = AuthState::new(Arc::new(user_store), tokens);

    let app = create_router(AppState {
        lookup,
        auth,
        require_token: server.require_token,
    });

    let listener = TcpListener::bind(&server.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", server.bind_addr))?;
    info!("🎯 API server listening on {}", server.bind_addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn open_store(config: &StoreConfig) -> Result<UserStore> {
    UserStore::with_cost(&config.auth_db_path, config.bcrypt_cost)
        .with_context(|| format!("Failed to open user database {}", config.auth_db_path))
}

/// Initialize tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "j1939_api=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn load_env() {
    // 1) Standard dotenv search (cwd + parents)
    let _ = dotenv();

    // 2) Also try the crate's own .env when launched from elsewhere
    let manifest_env = Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
    if manifest_env.exists() {
        let _ = dotenv::from_path(&manifest_env);
    }
}
