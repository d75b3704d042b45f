//! plates-bot - Telegram bot storing vehicle photos by license plate
//!
//! Startup: load `.env`, resolve configuration, initialize tracing, open the
//! database, then hand control to the Telegram dispatcher until Ctrl+C.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use plates_common::config::{locate_config_file, BotConfig, CliOverrides, TomlConfig};
use plates_common::db::init_database;
use plates_common::SqlitePlateStore;
use plates_bot::{telegram, PlateHandler};
use teloxide::Bot;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for plates-bot
#[derive(Parser, Debug)]
#[command(name = "plates-bot")]
#[command(about = "Telegram bot storing vehicle photos by license plate")]
#[command(version)]
struct Args {
    /// Telegram bot token (overrides PLATES_BOT_TOKEN and config file)
    #[arg(long)]
    bot_token: Option<String>,

    /// Data folder holding the database
    #[arg(short, long)]
    root_folder: Option<PathBuf>,

    /// Storage namespace (database file name without extension)
    #[arg(long)]
    db_name: Option<String>,

    /// Path to TOML config file
    #[arg(short, long, env = "PLATES_CONFIG")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine
    let dotenv_path = dotenvy::dotenv().ok();

    let args = Args::parse();

    let config_path = locate_config_file(args.config.as_deref())?;
    let toml_config = match &config_path {
        Some(path) => TomlConfig::load_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?,
        None => TomlConfig::default(),
    };

    let config = BotConfig::resolve(
        CliOverrides {
            bot_token: args.bot_token,
            root_folder: args.root_folder,
            db_name: args.db_name,
        },
        toml_config,
    )?;

    // RUST_LOG wins over the configured level
    let level = &config.log_level;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("plates_bot={level},plates_common={level},teloxide=warn").into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting plates-bot v{}", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &dotenv_path {
        info!("Loaded environment from {}", path.display());
    }
    match &config_path {
        Some(path) => info!("Config file: {}", path.display()),
        None => info!("No config file found, using environment and defaults"),
    }

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());

    let pool = match init_database(&db_path).await {
        Ok(pool) => {
            info!("✓ Connected to database");
            pool
        }
        Err(e) => {
            error!("Failed to initialize database: {}", e);
            return Err(e).context("Database initialization failed");
        }
    };

    let store = Arc::new(SqlitePlateStore::new(pool.clone(), config.db_name.clone()));
    let handler = Arc::new(
        PlateHandler::new(store, config.store_timeout)
            .with_photo_limit(config.max_buffered_photos),
    );
    info!(
        "Store timeout: {} ms, photo buffer limit: {}",
        config.store_timeout.as_millis(),
        config.max_buffered_photos
    );

    let bot = Bot::new(config.bot_token);
    telegram::register_commands(&bot).await;

    info!("Bot is running, press Ctrl+C to stop");
    telegram::run(bot, handler).await;

    pool.close().await;
    info!("Shutdown complete");
    Ok(())
}
