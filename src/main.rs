//! account-store: keyring account store behind named IPC channels
//!
//! Usage:
//!   account-store serve  --config config.toml          # expose channels over HTTP
//!   account-store all    --config config.toml
//!   account-store get    --config config.toml 1
//!   account-store set    --config config.toml 1 '{"address":"a","meta":{}}'
//!   account-store remove --config config.toml 1

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use account_store::api::{self, AppState};
use account_store::config::Config;
use account_store::ipc::{CHANNEL_ALL, CHANNEL_GET, CHANNEL_REMOVE, CHANNEL_SET};
use account_store::service::AccountService;

#[derive(Parser)]
#[command(name = "account-store", about = "Keyring account store", version)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, global = true, default_value = "config.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the account-store channels until CTRL+C.
    Serve,
    /// Print every stored account.
    All,
    /// Print one account, or `null`.
    Get { key: String },
    /// Store an account given as JSON.
    Set { key: String, value: String },
    /// Delete an account.
    Remove { key: String },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let cfg = match Config::from_file(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to load config");
            std::process::exit(1);
        }
    };

    let result = match cli.command {
        Command::Serve => run_serve(cfg).await,
        Command::All => run_call(cfg, CHANNEL_ALL, vec![]).await,
        Command::Get { key } => run_call(cfg, CHANNEL_GET, vec![Value::String(key)]).await,
        Command::Set { key, value } => match serde_json::from_str::<Value>(&value) {
            Ok(v) => run_call(cfg, CHANNEL_SET, vec![Value::String(key), v]).await,
            Err(e) => Err(anyhow::Error::new(e).context("value is not valid JSON")),
        },
        Command::Remove { key } => run_call(cfg, CHANNEL_REMOVE, vec![Value::String(key)]).await,
    };

    if let Err(e) = result {
        error!(error = ?e, "Command failed");
        std::process::exit(1);
    }
}

async fn run_serve(cfg: Config) -> anyhow::Result<()> {
    let service = AccountService::new(&cfg.store).context("failed to open account store")?;

    if !cfg.api.enabled {
        info!("HTTP transport disabled; nothing to serve");
        service.shutdown().await;
        return Ok(());
    }

    let port = cfg.api.port;
    let state = Arc::new(AppState {
        ipc: service.ipc.clone(),
        store: service.store.clone(),
        config: cfg,
    });

    api::start_server(state, port, async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Received CTRL+C, shutting down…"),
            Err(e) => error!(error = %e, "Signal error"),
        }
    })
    .await;

    service.shutdown().await;
    Ok(())
}

async fn run_call(cfg: Config, channel: &str, args: Vec<Value>) -> anyhow::Result<()> {
    let service = AccountService::new(&cfg.store).context("failed to open account store")?;
    let result = service.ipc.invoke(channel, args).await;
    service.shutdown().await;

    let value = result.with_context(|| format!("{channel} failed"))?;
    if !value.is_null() || channel == CHANNEL_GET {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}
