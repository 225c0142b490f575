//! Staffdesk Server - Main entry point.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use rand::distributions::Alphanumeric;
use rand::Rng;
use staffdesk_api::{router, AppState, TokenConfig, TokenIssuer, UserDirectory};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "staffdesk-server")]
#[command(about = "Staffdesk - staff console authentication service")]
#[command(version)]
struct Cli {
    /// Users file path
    #[arg(short, long, default_value = "config/users.toml", env = "STAFFDESK_USERS_FILE")]
    users: PathBuf,

    /// Enable development mode (seeded accounts, generated JWT secret)
    #[arg(long, env = "STAFFDESK_DEV_MODE")]
    dev: bool,

    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8000", env = "STAFFDESK_BIND_ADDRESS")]
    bind: String,

    /// HS256 signing secret (at least 32 bytes)
    #[arg(long, env = "STAFFDESK_JWT_SECRET", hide_env_values = true)]
    jwt_secret: Option<String>,

    /// Token lifetime in seconds
    #[arg(long, default_value_t = 8 * 60 * 60, env = "STAFFDESK_TOKEN_TTL")]
    token_ttl: u64,
}

fn generated_secret() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(48)
        .map(char::from)
        .collect()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    tracing::info!("Starting Staffdesk server...");
    tracing::info!("Bind address: {}", cli.bind);

    let users = if cli.dev {
        tracing::warn!("Development mode enabled - DO NOT USE IN PRODUCTION");
        UserDirectory::dev_seeded().context("Failed to seed development accounts")?
    } else {
        UserDirectory::load(&cli.users)
            .await
            .with_context(|| format!("Failed to load users from {}", cli.users.display()))?
    };
    tracing::info!(accounts = users.len(), "User directory ready");

    let secret = match (cli.jwt_secret, cli.dev) {
        (Some(secret), _) => secret,
        (None, true) => {
            tracing::warn!("No JWT secret configured, using a generated one");
            generated_secret()
        },
        (None, false) => bail!("STAFFDESK_JWT_SECRET is required outside development mode"),
    };

    let tokens = TokenIssuer::new(TokenConfig {
        secret,
        ttl: Duration::from_secs(cli.token_ttl),
    })
    .context("Invalid token configuration")?;

    let app = router(AppState::new(users, tokens));
    let listener = tokio::net::TcpListener::bind(&cli.bind)
        .await
        .with_context(|| format!("Failed to bind {}", cli.bind))?;

    tracing::info!("Staffdesk server started successfully");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutting down...");
        })
        .await?;

    Ok(())
}
