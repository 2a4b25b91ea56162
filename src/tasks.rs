use crate::board::BoardApi;
use crate::domain::Filters;
use crate::error::EngineError;
use crate::facade::{dashboard_view, BlockTiles};
use crate::store::LayoutRepo;
use chrono::Utc;
use metrics::counter;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

/// Periodic full re-fetch of a board with dashboard classification.
///
/// Each cycle takes a fresh immutable snapshot and simply supersedes the
/// previous one; there is no locking to coordinate because classification
/// never mutates shared state. `max_cycles` bounds the loop for tests and
/// one-shot runs; `None` runs until interrupted.
pub async fn watch_dashboard(
    api: Arc<dyn BoardApi>,
    layout: &LayoutRepo,
    filters: &Filters,
    board_id: &str,
    interval: Duration,
    max_cycles: Option<u64>,
) -> crate::error::Result<()> {
    let mut cycle: u64 = 0;
    loop {
        cycle += 1;
        counter!("deckhand_refresh_cycles_total").increment(1);
        info!(cycle, board_id, "refresh cycle starting");

        // Nothing in a cycle is fatal to the loop: any failure skips this
        // cycle and the next scheduled one retries.
        let snapshot = async {
            let cards = api.board_cards(board_id).await?;
            let lists = api.board_lists(board_id).await?;
            let blocks = layout.load_blocks(board_id).await?;
            Ok::<_, EngineError>((cards, lists, blocks))
        }
        .await;

        match snapshot {
            Ok((cards, lists, blocks)) => {
                let view = dashboard_view(&cards, &lists, &blocks, filters, Utc::now());
                print_dashboard(&view);
                info!(
                    cycle,
                    cards = cards.len(),
                    blocks = view.len(),
                    "refresh cycle complete"
                );
            }
            Err(EngineError::RateLimited) => {
                // Auto-refresh stays on; the user is told to back off.
                warn!("board API rate limit hit during refresh");
                println!(
                    "⚠️  The board API is rate limiting us; consider increasing refresh.interval_secs"
                );
            }
            Err(e) => {
                error!("refresh cycle failed: {}", e);
            }
        }

        if let Some(max) = max_cycles {
            if cycle >= max {
                return Ok(());
            }
        }
        tokio::time::sleep(interval).await;
    }
}

/// Renders dashboard tiles to stdout.
pub fn print_dashboard(view: &[BlockTiles]) {
    for block_tiles in view {
        let marker = if block_tiles.block.collapsed { "▸" } else { "▾" };
        println!("\n{} {}", marker, block_tiles.block.name);
        for (_, tile) in &block_tiles.tiles {
            match &tile.description {
                Some(desc) => println!("   {:<24} {:>4}   {}", tile.name, tile.count, desc),
                None => println!("   {:<24} {:>4}", tile.name, tile.count),
            }
        }
    }
}
