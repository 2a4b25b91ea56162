use clap::{Parser, Subcommand};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

mod address;
mod board;
mod classifier;
mod config;
mod constants;
mod domain;
mod error;
mod facade;
mod geocode;
mod logging;
mod stats;
mod store;
mod tasks;
mod variant;

use crate::board::http::HttpBoardApi;
use crate::board::BoardApi;
use crate::config::Config;
use crate::domain::{Filters, TimeWindow};
use crate::facade::{dashboard_view, map_markers, MapVisibility};
use crate::geocode::{GeocodeCache, GeocodePipeline, NominatimGeocoder};
use crate::store::{FileStore, KvStore, LayoutRepo};
use crate::tasks::{print_dashboard, watch_dashboard};

#[derive(Parser)]
#[command(name = "deckhand")]
#[command(about = "Operational dashboard over a kanban board")]
#[command(version = "0.1.0")]
struct Cli {
    /// Board identifier (defaults to board.board_id from config.toml)
    #[arg(long, global = true)]
    board: Option<String>,

    /// Only count cards active in the last N minutes
    #[arg(long, global = true)]
    since_minutes: Option<i64>,

    /// Exclude template cards from counts
    #[arg(long, global = true)]
    exclude_templates: bool,

    /// Exclude completed cards from counts
    #[arg(long, global = true)]
    exclude_completed: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render dashboard tiles once
    Dashboard,
    /// Geocode the board and render map markers
    Map,
    /// Render activity statistics buckets
    Stats,
    /// Run the geocoding pipeline and print a summary
    Geocode {
        /// Also write coordinates back to the board (requires write scope;
        /// clears the geocode cache first)
        #[arg(long)]
        write_back: bool,
    },
    /// Periodically re-fetch and re-render the dashboard
    Watch {
        /// Refresh interval in seconds (floored at 15)
        #[arg(long)]
        interval: Option<u64>,
    },
    /// Clear the geocode cache for the board
    ResetCache,
}

fn filters_from_cli(cli: &Cli) -> Filters {
    Filters {
        time_window: match cli.since_minutes {
            Some(minutes) => TimeWindow::Relative { minutes },
            None => TimeWindow::All,
        },
        exclude_templates: cli.exclude_templates,
        exclude_completed: cli.exclude_completed,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    logging::init_logging();
    dotenv::dotenv().ok();

    let cli = Cli::parse();
    let config = Config::load()?;

    let board_id = cli
        .board
        .clone()
        .unwrap_or_else(|| config.board.board_id.clone());
    let filters = filters_from_cli(&cli);

    let store: Arc<dyn KvStore> = Arc::new(FileStore::new(config.storage.data_root.clone()));
    let layout = LayoutRepo::new(store.clone());
    let api: Arc<dyn BoardApi> = Arc::new(HttpBoardApi::new(
        config.board.base_url.clone(),
        config.board.timeout_seconds,
    )?);

    let pipeline = GeocodePipeline::new(
        Arc::new(NominatimGeocoder::new(config.geocoder.base_url.clone())),
        GeocodeCache::new(store.clone()),
        Duration::from_millis(config.geocoder.delay_ms),
    );

    match cli.command {
        Commands::Dashboard => {
            println!("🗂  Fetching board {}...", board_id);
            let cards = api.board_cards(&board_id).await?;
            let lists = api.board_lists(&board_id).await?;
            let blocks = layout.load_blocks(&board_id).await?;
            let view = dashboard_view(&cards, &lists, &blocks, &filters, chrono::Utc::now());
            print_dashboard(&view);
        }
        Commands::Map => {
            println!("🗺  Geocoding board {}...", board_id);
            let cards = api.board_cards(&board_id).await?;
            let blocks = layout.load_blocks(&board_id).await?;
            let rules = layout.load_marker_rules(&board_id).await?;
            let (coords, summary) = pipeline.run(&board_id, &cards, &blocks).await?;
            info!(
                "geocoding done: {} cached, {} new",
                summary.from_cache, summary.geocoded
            );
            let markers =
                map_markers(&cards, &blocks, &rules, &coords, &MapVisibility::default());
            println!("📍 {} markers:", markers.len());
            for marker in &markers {
                println!(
                    "   {:<32} {:>9.4},{:>9.4}  [{}]",
                    marker.name,
                    marker.position.lat,
                    marker.position.lng,
                    marker.variant.key()
                );
            }
        }
        Commands::Stats => {
            println!("📈 Fetching board {}...", board_id);
            let cards = api.board_cards(&board_id).await?;
            let blocks = layout.load_blocks(&board_id).await?;
            let cache = GeocodeCache::new(store.clone());
            let coords = cache.load(&board_id).await?;
            let report =
                stats::stats_report(&cards, &blocks, &filters, &coords, chrono::Utc::now());
            println!("\n📊 Statistics for {} cards ({} geocoded):", report.total, report.geocoded);
            println!("\n   Created per month:");
            for (month, count) in &report.created_by_month {
                println!("   {:<10} {:>5}", month, count);
            }
            println!("\n   Created per hour of day:");
            for (hour, count) in &report.created_by_hour {
                println!("   {:>2}:00      {:>5}", hour, count);
            }
            println!("\n   Completed per day:");
            for (day, count) in &report.completed_by_day {
                println!("   {:<10} {:>5}", day, count);
            }
        }
        Commands::Geocode { write_back } => {
            println!("🌐 Running geocoding pipeline for board {}...", board_id);
            let cards = api.board_cards(&board_id).await?;
            let blocks = layout.load_blocks(&board_id).await?;

            if write_back {
                // Scope is checked up front; we never learn about missing
                // write permission from a 403.
                if !api.has_write_scope().await? {
                    warn!("write-back requested without write scope");
                    println!("❌ Granted token lacks write scope; write-back disabled");
                    return Ok(());
                }
                // Cached entries predate write-back semantics; start clean.
                pipeline.reset_cache(&board_id).await?;
            }

            let (coords, summary) = pipeline.run(&board_id, &cards, &blocks).await?;
            println!("\n📊 Geocode run for {}:", board_id);
            println!("   From cache: {}", summary.from_cache);
            println!("   Queued:     {}", summary.queued);
            println!("   Geocoded:   {}", summary.geocoded);
            println!("   No address: {}", summary.no_address);
            println!("   No result:  {}", summary.no_result);
            println!("   Failed:     {}", summary.failed);

            if write_back {
                let mut written = 0usize;
                for (card_id, latlng) in &coords {
                    match api.write_coordinates(card_id, latlng).await {
                        Ok(()) => written += 1,
                        Err(e) => error!("write-back failed for card {}: {}", card_id, e),
                    }
                }
                println!(
                    "✅ Wrote {} of {} coordinate sets back to the board",
                    written,
                    coords.len()
                );
            }
        }
        Commands::Watch { interval } => {
            let secs = match interval {
                Some(s) => s.max(constants::MIN_REFRESH_SECS),
                None => config.effective_refresh_secs(),
            };
            println!("👀 Watching board {} every {}s...", board_id, secs);
            watch_dashboard(
                api,
                &layout,
                &filters,
                &board_id,
                Duration::from_secs(secs),
                None,
            )
            .await?;
        }
        Commands::ResetCache => {
            pipeline.reset_cache(&board_id).await?;
            println!("🧹 Geocode cache cleared for board {}", board_id);
        }
    }
    Ok(())
}
