//! Aggregation layer combining classifier, variant, and geocode outputs for
//! each consuming view. Tolerates partially geocoded input: geocoding only
//! ever adds coordinates, so a mid-run snapshot is always safe to render.

use crate::classifier::{classify, TileResult};
use crate::domain::{Block, Card, Filters, LatLng, List, MarkerRule};
use crate::variant::{resolve, MarkerVariant};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};

/// One block's tiles, in the block's stored list order.
#[derive(Debug)]
pub struct BlockTiles {
    pub block: Block,
    pub tiles: Vec<(String, TileResult)>,
}

/// Dashboard view: needs only tile results, no geocoding.
pub fn dashboard_view(
    cards: &[Card],
    lists: &[List],
    blocks: &[Block],
    filters: &Filters,
    now: DateTime<Utc>,
) -> Vec<BlockTiles> {
    let mut results = classify(cards, lists, blocks, filters, now);

    blocks
        .iter()
        .filter_map(|block| {
            let tiles: Vec<(String, TileResult)> = block
                .list_ids
                .iter()
                .filter_map(|list_id| {
                    results.remove(list_id).map(|tile| (list_id.clone(), tile))
                })
                .collect();
            // An empty, uncollapsed block renders nothing, so omit it; a
            // collapsed one keeps its toggle.
            if tiles.is_empty() && !block.collapsed {
                return None;
            }
            Some(BlockTiles {
                block: block.clone(),
                tiles,
            })
        })
        .collect()
}

/// A geocoded card ready to render on the map.
#[derive(Debug)]
pub struct Marker {
    pub card_id: String,
    pub name: String,
    pub position: LatLng,
    pub variant: MarkerVariant,
}

/// Visibility toggles the map view currently has switched off.
#[derive(Debug, Default)]
pub struct MapVisibility {
    pub hidden_blocks: HashSet<String>,
    pub hidden_variants: HashSet<String>,
}

/// Map view: geocoded cards filtered by visible blocks and visible variants.
/// A card is shown only if its list's block is visible AND its resolved
/// variant is toggled on.
pub fn map_markers(
    cards: &[Card],
    blocks: &[Block],
    rules: &[MarkerRule],
    coords: &HashMap<String, LatLng>,
    visibility: &MapVisibility,
) -> Vec<Marker> {
    let visible_list_ids: HashSet<&str> = blocks
        .iter()
        .filter(|b| b.include_on_map && !visibility.hidden_blocks.contains(&b.id))
        .flat_map(|b| b.list_ids.iter().map(String::as_str))
        .collect();

    cards
        .iter()
        .filter(|c| visible_list_ids.contains(c.list_id.as_str()))
        .filter_map(|card| {
            let position = card
                .coordinates
                .or_else(|| coords.get(&card.id).copied())?;
            let variant = resolve(card, rules);
            if visibility.hidden_variants.contains(&variant.key()) {
                return None;
            }
            Some(Marker {
                card_id: card.id.clone(),
                name: card.name.clone(),
                position,
                variant,
            })
        })
        .collect()
}
