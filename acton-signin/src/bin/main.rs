//! acton-signin server

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::BufRead;
use std::sync::Arc;

use acton_signin::auth::{
    env_lookup, hash_password, Adapter, AuthHandle, AuthOptions, CredentialsVerifier,
    LocalUserVerifier, MemoryAdapter, PgAdapter,
};
use acton_signin::config::SigninConfig;
use acton_signin::{observability, state::AppState};

#[derive(Parser)]
#[command(name = "acton-signin")]
#[command(version)]
#[command(about = "Provider sign-in server", long_about = None)]
struct Cli {
    /// Configuration file; defaults to the layered system, user and local files
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the server (default)
    Serve,
    /// Read a password from stdin and print its hash for `[[auth.users]]`
    HashPassword,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command.unwrap_or(Command::Serve) {
        Command::HashPassword => print_password_hash(),
        Command::Serve => serve(cli.config.as_deref()).await,
    }
}

fn print_password_hash() -> Result<()> {
    let mut password = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut password)
        .context("Failed to read password from stdin")?;
    let password = password.trim_end_matches(['\r', '\n']);
    anyhow::ensure!(!password.is_empty(), "Password must not be empty");

    println!("{}", hash_password(password)?);
    Ok(())
}

async fn serve(config_path: Option<&str>) -> Result<()> {
    observability::init()?;

    let config = match config_path {
        Some(path) => SigninConfig::load_from(path),
        None => SigninConfig::load_for_service("acton-signin"),
    }
    .context("Failed to load configuration")?;

    let adapter: Arc<dyn Adapter> = match &config.database.url {
        Some(url) => {
            let adapter = PgAdapter::connect(url, config.database.max_connections)
                .await
                .context("Failed to connect to the database")?;
            adapter.migrate().await.context("Failed to run migrations")?;
            tracing::info!("Using Postgres adapter");
            Arc::new(adapter)
        }
        None => {
            tracing::warn!("No database configured; sessions are kept in memory");
            Arc::new(MemoryAdapter::new())
        }
    };

    let verifier: Option<Arc<dyn CredentialsVerifier>> = if config.auth.users.is_empty() {
        None
    } else {
        let verifier = LocalUserVerifier::from_settings(&config.auth.users)
            .context("Invalid [[auth.users]] entry")?;
        tracing::info!(users = verifier.len(), "Local accounts loaded");
        Some(Arc::new(verifier))
    };

    // Missing provider credentials stop the process here
    let options = AuthOptions::from_config(&config, adapter, verifier, env_lookup)
        .context("Invalid authentication configuration")?;
    let providers: Vec<&str> = options.providers().iter().map(|p| p.id()).collect();
    tracing::info!(?providers, sign_in = %options.pages().sign_in, "Authentication configured");

    let listener = tokio::net::TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("Failed to bind {}", config.server.bind))?;
    tracing::info!(addr = %config.server.bind, "Listening");

    let app = acton_signin::router(AppState::new(config, AuthHandle::new(options)));
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
