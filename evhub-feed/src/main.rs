//! evhub-feed - Event feed command-line client
//!
//! Watches the merged local + remote event feed for a category/search pair and
//! prints every published list. Also adds and removes local events.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use evhub_common::config::{load_config, resolve_config_path, TomlConfig};
use evhub_common::time::millis_to_duration;
use evhub_common::RateLimitedLog;
use evhub_feed::models::NewLocalEvent;
use evhub_feed::services::RemoteEventFetcher;
use evhub_feed::{
    filter_events, sort_events, FeedController, FeedDeps, FeedState, SortMode, SqliteEventStore,
};

/// Command-line arguments for evhub-feed
#[derive(Parser, Debug)]
#[command(name = "evhub-feed")]
#[command(about = "Merged local and remote event feed")]
#[command(version)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the merged feed every time it changes (Ctrl+C to stop)
    Watch {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
        /// date, price-asc, price-desc or title
        #[arg(long, default_value = "date")]
        sort: SortMode,
    },
    /// Add a local event
    Add {
        #[arg(long)]
        title: String,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// HH:MM
        #[arg(long)]
        time: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        organizer: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        price: Option<f64>,
        #[arg(long)]
        free: bool,
        #[arg(long)]
        cover_image: Option<String>,
    },
    /// Remove a local event by id
    Remove { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref());
    let config = load_config(config_path.as_deref()).context("Failed to load configuration")?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting evhub-feed {}", env!("CARGO_PKG_VERSION"));
    info!("Database: {}", config.store.database_path.display());

    let store = SqliteEventStore::open(&config.store.database_path)
        .await
        .context("Failed to open local event store")?;

    match args.command {
        Command::Watch {
            category,
            search,
            sort,
        } => watch(config, store, category, search, sort).await,
        Command::Add {
            title,
            date,
            time,
            location,
            organizer,
            category,
            price,
            free,
            cover_image,
        } => {
            if NaiveDate::parse_from_str(&date, "%Y-%m-%d").is_err() {
                bail!("Invalid date '{}', expected YYYY-MM-DD", date);
            }
            let event = NewLocalEvent {
                title: Some(title),
                cover_image,
                date: Some(date),
                time,
                location,
                organizer_name: organizer,
                price,
                is_free: Some(free),
                category,
                ..Default::default()
            };
            let id = store.insert(&event).await.context("Failed to add event")?;
            println!("{}", id);
            Ok(())
        }
        Command::Remove { id } => {
            if !store.delete(&id).await.context("Failed to remove event")? {
                bail!("No local event with id {}", id);
            }
            info!(id = %id, "Removed local event");
            Ok(())
        }
    }
}

async fn watch(
    config: TomlConfig,
    store: SqliteEventStore,
    category: Option<String>,
    search: Option<String>,
    sort: SortMode,
) -> Result<()> {
    let warnings = Arc::new(RateLimitedLog::new(millis_to_duration(
        config.feed.warn_interval_ms,
    )));
    let fetcher = RemoteEventFetcher::new(config.catalog.clone(), Arc::clone(&warnings))
        .context("Failed to create catalog client")?;

    if config.catalog.valid_api_key().is_none() {
        info!("No catalog API key configured; showing local events only");
    }

    let deps = FeedDeps {
        store: Arc::new(store),
        catalog: Arc::new(fetcher),
        catalog_config: config.catalog,
        feed_config: config.feed,
        warnings,
    };

    let mut controller = FeedController::new(deps);
    let mut state = controller.state();
    controller.set_params(category.clone(), search.clone()).await;

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                print_feed(&snapshot, category.as_deref(), search.as_deref(), sort);
            }
            _ = signal::ctrl_c() => {
                info!("Interrupted, stopping feed");
                break;
            }
        }
    }

    controller.shutdown();
    Ok(())
}

fn print_feed(state: &FeedState, category: Option<&str>, search: Option<&str>, sort: SortMode) {
    let visible = sort_events(&filter_events(&state.events, category, search), sort);

    println!(
        "--- generation {} | {} events{} ---",
        state.generation,
        visible.len(),
        if state.loading { " | loading" } else { "" }
    );
    for event in &visible {
        let price = if event.is_free() {
            "free".to_string()
        } else {
            event
                .price
                .map(|p| format!("{:.2}", p))
                .unwrap_or_else(|| "-".to_string())
        };
        println!(
            "[{:?}] {} | {} {} | {} | {} | {}",
            event.source_origin,
            event.title,
            event.display_date,
            event.display_time,
            event.location.as_deref().unwrap_or("-"),
            price,
            event.cover_image.as_deref().unwrap_or("-"),
        );
    }
}
