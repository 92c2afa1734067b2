//! Reject API Server
//!
//! Run with: cargo run --bin reject -- --config config.toml
//!
//! # Configuration
//!
//! Read from `--config`, `~/.config/reject/config.toml`,
//! `/etc/reject/config.toml` or `./config.toml`, in that order. Environment
//! variables override the file:
//! - `REJECT_HOST`, `REJECT_PORT` / `PORT`: bind address (default: 0.0.0.0:4000)
//! - `REJECT_DB_PATH` / `DB_PATH`: SQLite database (default: /data/reject.db)
//! - `REJECT_AGE_CSV` / `A4E_AGE_CSV`: first-seen CSV for the age index
//! - `REJECT_DISCORD_WEBHOOK` / `DISCORD_WEBHOOK_URL`: contact form webhook
//! - `ADMIN_USER`, `ADMIN_PASS`: admin credentials
//! - `REJECT_LOG_LEVEL`, `REJECT_LOG_FORMAT`: logging (pretty or json)
//! - `RUST_LOG`: overrides the log filter entirely

use anyhow::Context;
use clap::Parser;
use reject::age::AgeService;
use reject::api::{serve, AppState};
use reject::config::{Config, LoggingConfig};
use reject::notify::{DiscordConfig, DiscordWebhook};
use reject::store::SystemStore;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "reject")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Ransom notice API with structure-age estimates")]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = Config::load_default(args.config.as_deref()).context("loading configuration")?;
    init_tracing(&config.logging);

    tracing::info!("Starting Reject API server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!("Database: {:?}", config.database.path);
    tracing::info!("Age index source: {:?}", config.age.csv_path);

    // Age index: a missing or broken CSV leaves the index empty, it does
    // not stop the server
    let age = Arc::new(AgeService::load(&config.age.csv_path).await);
    if age.is_loaded().await {
        tracing::info!("Age index ready with {} entries", age.len().await);
    } else {
        tracing::warn!("Age index empty; /api/age answers 503 until a reload succeeds");
    }

    // Systems database
    let store = SystemStore::open(&config.database.path, config.database.allow_create)
        .with_context(|| format!("opening database {:?}", config.database.path))?;
    if !store.inspect()?.ok {
        tracing::warn!("Database schema incomplete; admin and lookup routes may fail");
    }
    let store = Arc::new(store);

    let mut state = AppState::new(
        age,
        store,
        config.admin.clone(),
        config.server.clone(),
    );

    if config.admin.user.is_none() || config.admin.pass.is_none() {
        tracing::warn!("ADMIN_USER/ADMIN_PASS not set; admin routes will refuse every request");
    }

    // Discord webhook for the contact form
    match config.discord.webhook_url.as_deref() {
        Some(url) => {
            let webhook = DiscordWebhook::new(DiscordConfig {
                webhook_url: url.to_string(),
                username: config.discord.username.clone(),
                request_timeout_ms: config.discord.request_timeout_ms,
            })?;
            let username = webhook.username().to_string();
            tracing::info!("Discord webhook enabled");
            state = state.with_notifier(Arc::new(webhook), username);
        }
        None => {
            tracing::info!("Discord webhook disabled (set DISCORD_WEBHOOK_URL to enable)");
        }
    }

    serve(state, &config.server).await?;

    tracing::info!("Reject API server stopped");
    Ok(())
}

/// `RUST_LOG` wins over the configured level
fn init_tracing(logging: &LoggingConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.filter_directive().into());

    let registry = tracing_subscriber::registry().with(filter);

    if logging.is_json() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}
