//! Staffdesk CLI - Command line interface.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use staffdesk_access::{Capability, GuardOutcome, Module, RoleProfile};
use staffdesk_auth::{
    Authenticator, HttpAuthBackend, HttpAuthConfig, LoginOutcome, Navigator, SessionStore,
    DEFAULT_API_URL,
};
use staffdesk_storage_sqlite::SqliteBackend;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// ============================================================================
// CLI Structure
// ============================================================================

#[derive(Parser)]
#[command(name = "staffdesk")]
#[command(about = "Staffdesk CLI - Log in to the staff console and check access")]
#[command(version)]
struct Cli {
    /// Authentication service base URL
    #[arg(long, default_value = DEFAULT_API_URL, env = "STAFFDESK_API_URL")]
    api_url: String,

    /// Directory holding persisted sessions
    #[arg(long, default_value = ".staffdesk", env = "STAFFDESK_DATA_DIR")]
    data_dir: PathBuf,

    /// Session profile (one persisted session per profile)
    #[arg(long, default_value = "default", env = "STAFFDESK_PROFILE")]
    profile: String,

    /// Request timeout in seconds (no timeout when omitted)
    #[arg(long, env = "STAFFDESK_TIMEOUT")]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in and print the landing page
    Login {
        /// Login name
        #[arg(long)]
        username: String,
        /// Password (read from stdin if not provided)
        #[arg(long)]
        password: Option<String>,
        /// Page that sent the user to login
        #[arg(long, default_value = "/")]
        from: String,
    },
    /// Log out and forget the persisted session
    Logout,
    /// Show the current user
    Whoami {
        /// Ask the service whether the token is still accepted
        #[arg(long)]
        verify: bool,
    },
    /// Navigate to a console path
    Open {
        /// Console path, e.g. /admin/dashboard
        path: String,
    },
    /// Check a capability for the current user
    Can {
        /// Capability name, e.g. accessMIF
        capability: String,
    },
    /// List modules the current user may open
    Modules,
    /// List route rules and whether the current user passes them
    Routes,
}

// ============================================================================
// Console
// ============================================================================

struct Console {
    session: Arc<SessionStore>,
    backend: Arc<HttpAuthBackend>,
    auth: Authenticator,
    navigator: Navigator,
}

impl Console {
    async fn open(cli: &Cli) -> Result<Self> {
        let storage = SqliteBackend::open(&cli.data_dir, &cli.profile)
            .await
            .with_context(|| format!("Failed to open session store in {}", cli.data_dir.display()))?;

        let session = Arc::new(SessionStore::new(Arc::new(storage)));
        session
            .init()
            .await
            .context("Failed to restore session")?;

        let backend = Arc::new(
            HttpAuthBackend::new(HttpAuthConfig {
                api_url: cli.api_url.clone(),
                timeout: cli.timeout.map(Duration::from_secs),
            })
            .context("Failed to create HTTP client")?,
        );

        Ok(Self {
            auth: Authenticator::new(backend.clone(), session.clone()),
            navigator: Navigator::new(session.clone()),
            session,
            backend,
        })
    }
}

fn read_password() -> Result<String> {
    print!("Password: ");
    io::stdout().flush()?;
    let stdin = io::stdin();
    let mut line = String::new();
    stdin.lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

// ============================================================================
// Command Handlers
// ============================================================================

async fn cmd_login(console: &Console, username: &str, password: Option<String>, from: &str) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => read_password()?,
    };

    // Ctrl-C abandons the attempt without touching the session.
    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let outcome = console
        .auth
        .login_with_cancel(username, &password, &cancel)
        .await;
    watcher.abort();

    match outcome {
        LoginOutcome::Success { user } => {
            println!("Logged in as {} ({})", user.display_name(), user.role);
            let landing = console
                .navigator
                .landing_after_login(from)
                .await
                .context("Session empty after login")?;
            println!("{landing}");
            Ok(())
        },
        LoginOutcome::Failure { error } => bail!("Login failed: {error}"),
    }
}

async fn cmd_logout(console: &Console) -> Result<()> {
    console.auth.logout().await.context("Failed to clear session")?;
    println!("Logged out");
    Ok(())
}

async fn cmd_whoami(console: &Console, verify: bool) -> Result<()> {
    let Some(identity) = console.session.current().await else {
        println!("Not logged in");
        return Ok(());
    };

    println!("User:      {}", identity.username);
    println!("Name:      {}", identity.display_name());
    if let Some(email) = &identity.email {
        println!("Email:     {email}");
    }
    println!("Role:      {}", identity.role);
    if let Some(dashboard) = RoleProfile::of(identity.role).dashboard {
        println!("Dashboard: {dashboard}");
    }

    if verify {
        match console.backend.me(&identity.token).await {
            Ok(profile) if profile.role == identity.role => println!("Token:     accepted"),
            Ok(profile) => println!("Token:     accepted (role is now {})", profile.role),
            Err(e) => println!("Token:     rejected ({e})"),
        }
    }

    Ok(())
}

async fn cmd_open(console: &Console, path: &str) -> Result<()> {
    match console.navigator.navigate(path).await {
        GuardOutcome::Render => println!("render {path}"),
        GuardOutcome::Redirect(redirect) => println!("redirect {}", redirect.location()),
        GuardOutcome::Pending => println!("pending"),
    }
    Ok(())
}

async fn cmd_can(console: &Console, capability: &str) -> Result<()> {
    let capability: Capability = capability.parse().with_context(|| {
        let known: Vec<_> = Capability::ALL.iter().map(|c| c.as_str()).collect();
        format!("Unknown capability. Use one of: {}", known.join(", "))
    })?;

    let allowed = console.session.has_permission(capability.as_str()).await;
    println!("{}", if allowed { "yes" } else { "no" });
    Ok(())
}

async fn cmd_modules(console: &Console) -> Result<()> {
    if !console.session.is_authenticated().await {
        println!("Not logged in");
        return Ok(());
    }

    for module in Module::ALL {
        if console.session.can_access_module(module.as_str()).await {
            println!("{module}");
        }
    }
    Ok(())
}

async fn cmd_routes(console: &Console) -> Result<()> {
    let table = console.navigator.guard().table();

    for rule in table.rules() {
        let roles = if rule.is_public() {
            "public".to_string()
        } else {
            let names: Vec<_> = rule.allow_list.iter().map(|r| r.as_str()).collect();
            names.join(",")
        };
        let verdict = match console.navigator.navigate(rule.pattern.as_str()).await {
            GuardOutcome::Render => "yes",
            _ => "no",
        };
        println!("{:<32} {:<4} {}", rule.pattern.as_str(), verdict, roles);
    }
    Ok(())
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let console = Console::open(&cli).await?;

    match cli.command {
        Commands::Login {
            username,
            password,
            from,
        } => cmd_login(&console, &username, password, &from).await,
        Commands::Logout => cmd_logout(&console).await,
        Commands::Whoami { verify } => cmd_whoami(&console, verify).await,
        Commands::Open { path } => cmd_open(&console, &path).await,
        Commands::Can { capability } => cmd_can(&console, &capability).await,
        Commands::Modules => cmd_modules(&console).await,
        Commands::Routes => cmd_routes(&console).await,
    }
}
