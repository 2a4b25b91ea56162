use crate::domain::{Block, Card, Filters, List};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Count and description for one list's dashboard tile.
#[derive(Debug, Clone, PartialEq)]
pub struct TileResult {
    pub count: usize,
    pub name: String,
    pub description: Option<String>,
}

/// Classifies a raw card snapshot into per-list tile results.
///
/// Applies, in order: block membership (cards outside every block's lists are
/// excluded entirely), template exclusion, completion exclusion, and the time
/// window; counts survivors per list; then applies each ignoring block's
/// first-card decrement. Pure and deterministic for a fixed `now`.
pub fn classify(
    cards: &[Card],
    lists: &[List],
    blocks: &[Block],
    filters: &Filters,
    now: DateTime<Utc>,
) -> HashMap<String, TileResult> {
    let union_list_ids: HashSet<&str> = blocks
        .iter()
        .flat_map(|b| b.list_ids.iter().map(String::as_str))
        .collect();

    let list_names: HashMap<&str, &str> = lists
        .iter()
        .map(|l| (l.id.as_str(), l.name.as_str()))
        .collect();

    // Exclusion filters; order matters only for logging, survivors are the
    // intersection either way.
    let survivors: Vec<&Card> = cards
        .iter()
        .filter(|c| union_list_ids.contains(c.list_id.as_str()))
        .filter(|c| !(filters.exclude_templates && c.template))
        .filter(|c| !(filters.exclude_completed && c.complete))
        .filter(|c| filters.time_window.contains(c.last_activity, now))
        .collect();

    let survivor_ids: HashSet<&str> = survivors.iter().map(|c| c.id.as_str()).collect();

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for card in &survivors {
        *counts.entry(card.list_id.as_str()).or_insert(0) += 1;
    }

    let mut results: HashMap<String, TileResult> = union_list_ids
        .iter()
        .map(|list_id| {
            (
                (*list_id).to_string(),
                TileResult {
                    count: counts.get(list_id).copied().unwrap_or(0),
                    name: list_names.get(list_id).unwrap_or(&"").to_string(),
                    description: None,
                },
            )
        })
        .collect();

    // First-card pass: the minimum-position card of each list in an ignoring
    // block is a description slot, not a countable item. Only decrement if
    // that specific card survived the filters above.
    for block in blocks.iter().filter(|b| b.ignore_first_card) {
        for list_id in &block.list_ids {
            let Some(first) = first_card_of(cards, list_id) else {
                continue;
            };
            if !survivor_ids.contains(first.id.as_str()) {
                continue;
            }
            if let Some(tile) = results.get_mut(list_id) {
                tile.count = tile.count.saturating_sub(1);
                if block.display_first_card_description {
                    tile.description = Some(first.name.clone());
                }
                debug!(
                    list_id = %list_id,
                    first_card = %first.id,
                    "excluded first card from tile count"
                );
            }
        }
    }

    results
}

/// The "first card" of a list: minimum position, ties broken by identifier so
/// the choice is deterministic.
pub fn first_card_of<'a>(cards: &'a [Card], list_id: &str) -> Option<&'a Card> {
    cards
        .iter()
        .filter(|c| c.list_id == list_id)
        .min_by(|a, b| {
            a.pos
                .partial_cmp(&b.pos)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        })
}
