use anyhow::{Context, bail};
use chrono::{NaiveDate, Utc};
use clap::Parser;
use dotenvy::dotenv;
use std::sync::Arc;
use tracing::{debug, info};

use common::config::AppConfig;
use common::logger;
use common::models::{Asset, Signal, SignalVector, parse_pair};
use common::traits::HistoryStore;
use storage::db;
use storage::{HistoryRepository, MemoryHistoryStore};
use strategy::ScenarioCatalog;
use strategy::services::{Matcher, RegimeAnalyzer};

use crate::services::classification_service::ClassificationService;
use crate::services::report::render_history;

mod services;

/// Classify the day's BTC, Gold, USDJPY and EURUSD moves into a capital-flow scenario
#[derive(Parser, Debug)]
#[command(name = "capital-flow")]
#[command(about = "Match today's macro signals against the capital-flow scenarios")]
struct Cli {
    /// One `asset=signal` pair per asset, e.g. `btc=down gold=up usdjpy=up eurusd=down`.
    /// Without pairs the stored signals for `--date` are replayed.
    #[arg(value_parser = parse_pair)]
    pairs: Vec<(Asset, Signal)>,

    /// Day being classified (defaults to today, UTC)
    #[arg(short, long)]
    date: Option<NaiveDate>,

    /// Classify without recording the day
    #[arg(long)]
    dry_run: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Keep history in memory for this run only
    #[arg(long)]
    memory: bool,

    /// Overrides DATABASE_URL
    #[arg(long)]
    database_url: Option<String>,

    /// Print recorded history, most recent first
    #[arg(long, conflicts_with = "pairs")]
    history: bool,

    /// Delete all recorded history
    #[arg(long, conflicts_with_all = ["pairs", "history"])]
    clear_history: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logger::setup_logger();
    dotenv().ok();
    let cli = Cli::parse();
    debug!("{:?}", cli);

    let mut config = AppConfig::from_env()?;
    if let Some(url) = cli.database_url.clone() {
        config.database_url = url;
    }

    let catalog = match &config.catalog_path {
        Some(path) => ScenarioCatalog::from_path(path)?,
        None => ScenarioCatalog::builtin()?,
    };
    let catalog = Arc::new(catalog);
    info!("Loaded {} scenarios", catalog.len());

    let store: Arc<dyn HistoryStore> = if cli.memory {
        Arc::new(MemoryHistoryStore::new(config.history_retention))
    } else {
        let pool = db::open_pool(&config.database_url)
            .await
            .with_context(|| format!("Failed to open {}", config.database_url))?;
        Arc::new(HistoryRepository::new(pool, config.history_retention))
    };

    let service = ClassificationService::new(
        Matcher::new(catalog.clone()),
        RegimeAnalyzer::new(catalog, config.history_window),
        store,
        config.history_retention,
    );

    if cli.clear_history {
        return service.clear_history().await;
    }

    if cli.history {
        let entries = service.history().await?;
        if cli.json {
            println!("{}", serde_json::to_string_pretty(&entries)?);
        } else {
            println!("{}", render_history(&entries));
        }
        return Ok(());
    }

    let date = cli.date.unwrap_or_else(|| Utc::now().date_naive());
    let report = if cli.pairs.is_empty() {
        match service.replay_day(date).await? {
            Some(report) => report,
            None => bail!("No signals given and nothing recorded for {}", date),
        }
    } else {
        let signals = SignalVector::try_from_pairs(cli.pairs.iter().copied())?;
        service.classify_day(date, signals, !cli.dry_run).await?
    };

    if cli.json {
        println!("{}", report.to_json()?);
    } else {
        print!("{}", report);
    }
    Ok(())
}
