//! CLI administration tool for snaplink.
//!
//! Inspects the durable store and the cache without going through the
//! HTTP API (and therefore without counting clicks or consuming quota).
//!
//! # Usage
//!
//! ```bash
//! # Check database connection
//! cargo run --bin admin -- db check
//!
//! # Show statistics for a short code
//! cargo run --bin admin -- stats aB3dE5fG
//!
//! # Check Redis connection
//! cargo run --bin admin -- cache check
//!
//! # Show cached targets for several codes in one round trip
//! cargo run --bin admin -- cache get aB3dE5fG my-alias
//! ```
//!
//! # Environment Variables
//!
//! Same as the server; see [`snaplink::config`].

use snaplink::config::{Config, mask_connection_string};
use snaplink::domain::repositories::UrlRepository;
use snaplink::infrastructure::cache::VolatileCache;
use snaplink::infrastructure::persistence::PgUrlRepository;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use colored::*;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// CLI tool for managing snaplink.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },

    /// Show statistics for a short code
    Stats {
        /// Short code or custom alias
        code: String,
    },

    /// Cache operations
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,
}

/// Cache operation subcommands.
#[derive(Subcommand)]
enum CacheAction {
    /// Check Redis connection
    Check,

    /// Look up cached targets for one or more short codes
    Get {
        #[arg(required = true)]
        codes: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::from_env()?;

    match cli.command {
        Commands::Db { action } => handle_db_action(action, &config).await?,
        Commands::Stats { code } => handle_stats(&code, &config).await?,
        Commands::Cache { action } => handle_cache_action(action, &config).await?,
    }

    Ok(())
}

async fn connect_db(config: &Config) -> Result<PgPool> {
    PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, config: &Config) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());
            println!(
                "  {}",
                mask_connection_string(&config.database_url).bright_black()
            );

            let pool = connect_db(config).await?;
            sqlx::query("SELECT 1").fetch_one(&pool).await?;

            let urls: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM urls")
                .fetch_one(&pool)
                .await?;

            println!("{}", "✅ Database connection OK".green().bold());
            println!("  URLs stored: {}", urls.to_string().bright_white());
        }
    }

    Ok(())
}

/// Displays the durable record and click count for one code.
async fn handle_stats(code: &str, config: &Config) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let pool = connect_db(config).await?;
    let repo = PgUrlRepository::new(
        Arc::new(pool),
        Duration::from_secs(config.db_query_timeout),
    );

    let record = repo
        .find_by_code(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    let Some(record) = record else {
        println!("{}", format!("❌ No URL with code '{}'", code).red());
        return Ok(());
    };

    let clicks = repo
        .get_clicks(code)
        .await
        .map_err(|e| anyhow::anyhow!("Database error: {}", e))?;

    println!("  Code:     {}", record.short_code.cyan());
    println!("  Target:   {}", record.long_url.bright_white());
    println!(
        "  Created:  {}",
        record.created_at.to_rfc3339().bright_black()
    );

    match record.expires_at {
        Some(expires_at) if record.is_expired_at(Utc::now()) => {
            println!("  Expires:  {}", format!("{} (expired)", expires_at).yellow())
        }
        Some(expires_at) => println!("  Expires:  {}", expires_at.to_rfc3339().bright_black()),
        None => println!("  Expires:  {}", "never".bright_black()),
    }

    if let Some(owner) = &record.owner_id {
        println!("  Owner:    {}", owner.bright_black());
    }

    println!(
        "  Clicks:   {}",
        clicks.to_string().bright_green().bold()
    );
    println!();

    Ok(())
}

/// Handles cache diagnostic commands.
async fn handle_cache_action(action: CacheAction, config: &Config) -> Result<()> {
    let Some(redis_url) = config.redis_url.as_deref() else {
        println!("{}", "⚠️  Redis is not configured".yellow());
        return Ok(());
    };

    let cache = VolatileCache::connect(Some(redis_url), config.cache_settings()).await;

    match action {
        CacheAction::Check => {
            println!("{}", "🔍 Checking Redis connection...".bright_blue());
            println!("  {}", mask_connection_string(redis_url).bright_black());

            if cache.probe().await {
                println!("{}", "✅ Redis connection OK".green().bold());
            } else {
                anyhow::bail!("Redis is unreachable");
            }
        }
        CacheAction::Get { codes } => {
            if !cache.probe().await {
                anyhow::bail!("Redis is unreachable");
            }

            let found = cache.get_urls_bulk(&codes).await;

            for code in &codes {
                match found.get(code).and_then(Option::as_deref) {
                    Some(url) => println!("  {} → {}", code.cyan(), url.bright_white()),
                    None => println!("  {} → {}", code.cyan(), "(not cached)".bright_black()),
                }
            }
        }
    }

    Ok(())
}
