use crate::address;
use crate::classifier::first_card_of;
use crate::domain::{Block, Card, LatLng};
use crate::error::Result;
use crate::geocode::cache::GeocodeCache;
use crate::geocode::nominatim::Geocoder;
use metrics::counter;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Observable pipeline state for one board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineState {
    Idle,
    Loading,
    Geocoding { remaining: usize },
}

/// Outcome tally for one pipeline run.
#[derive(Debug, Default)]
pub struct GeocodeRunSummary {
    pub from_cache: usize,
    pub queued: usize,
    pub geocoded: usize,
    pub no_address: usize,
    pub no_result: usize,
    pub failed: usize,
    pub cancelled: bool,
}

/// Sequential, rate-limited geocoding over one board's cards.
///
/// Lookups run strictly one at a time with a fixed inter-request delay; the
/// free public geocoder throttles hard, so we trade latency for never
/// tripping its limiter. Cancellation is cooperative via a generation
/// counter: a board change bumps the generation and the running queue
/// discards itself at the next step.
pub struct GeocodePipeline {
    geocoder: Arc<dyn Geocoder>,
    cache: GeocodeCache,
    delay: Duration,
    generation: AtomicU64,
    state: Mutex<PipelineState>,
}

impl GeocodePipeline {
    pub fn new(geocoder: Arc<dyn Geocoder>, cache: GeocodeCache, delay: Duration) -> Self {
        Self {
            geocoder,
            cache,
            delay,
            generation: AtomicU64::new(0),
            state: Mutex::new(PipelineState::Idle),
        }
    }

    pub fn state(&self) -> PipelineState {
        self.state.lock().unwrap().clone()
    }

    /// Invalidates any in-flight run; called when the active board changes.
    pub fn supersede(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    fn set_state(&self, state: PipelineState) {
        *self.state.lock().unwrap() = state;
    }

    /// Cards eligible for geocoding: uncached, with a description, not a
    /// template, list owned by a map-participating block, and not the first
    /// card of a list whose block ignores it.
    pub fn build_queue<'a>(
        cards: &'a [Card],
        blocks: &[Block],
        cached: &HashMap<String, LatLng>,
    ) -> Vec<&'a Card> {
        let map_list_ids: HashSet<&str> = blocks
            .iter()
            .filter(|b| b.include_on_map)
            .flat_map(|b| b.list_ids.iter().map(String::as_str))
            .collect();

        let ignored_first: HashSet<&str> = blocks
            .iter()
            .filter(|b| b.include_on_map && b.ignore_first_card)
            .flat_map(|b| b.list_ids.iter())
            .filter_map(|list_id| first_card_of(cards, list_id))
            .map(|c| c.id.as_str())
            .collect();

        cards
            .iter()
            .filter(|c| map_list_ids.contains(c.list_id.as_str()))
            .filter(|c| c.coordinates.is_none())
            .filter(|c| !cached.contains_key(&c.id))
            .filter(|c| !c.description.trim().is_empty())
            .filter(|c| !c.template)
            .filter(|c| !ignored_first.contains(c.id.as_str()))
            .collect()
    }

    /// Runs one full pipeline pass for a board snapshot, returning all known
    /// coordinates (cached + newly geocoded) keyed by card id.
    #[instrument(skip(self, cards, blocks), fields(board_id = %board_id))]
    pub async fn run(
        &self,
        board_id: &str,
        cards: &[Card],
        blocks: &[Block],
    ) -> Result<(HashMap<String, LatLng>, GeocodeRunSummary)> {
        let generation = self.generation.load(Ordering::SeqCst);
        let mut summary = GeocodeRunSummary::default();

        self.set_state(PipelineState::Loading);
        let cached = self.cache.load(board_id).await?;
        summary.from_cache = cached.len();
        let mut coords: HashMap<String, LatLng> = cached.clone();

        let queue = Self::build_queue(cards, blocks, &cached);
        summary.queued = queue.len();
        info!(
            cached = summary.from_cache,
            queued = summary.queued,
            "geocode queue built"
        );

        let mut first_lookup = true;
        for (i, card) in queue.iter().enumerate() {
            if self.generation.load(Ordering::SeqCst) != generation {
                info!("geocode queue superseded, discarding remainder");
                summary.cancelled = true;
                break;
            }
            self.set_state(PipelineState::Geocoding {
                remaining: queue.len() - i,
            });

            let Some(query) = address::extract(&card.description) else {
                // Permanent skip until the description changes; not an error.
                debug!(card_id = %card.id, "no geocodable address in description");
                summary.no_address += 1;
                counter!("deckhand_geocode_no_address_total").increment(1);
                continue;
            };

            // Raw coordinate queries resolve without touching the network.
            let result = if let Some((lat, lng)) = address::parse_latlng(&query) {
                Some(LatLng { lat, lng })
            } else {
                if !first_lookup {
                    tokio::time::sleep(self.delay).await;
                }
                first_lookup = false;
                counter!("deckhand_geocode_lookups_total").increment(1);
                match self.geocoder.lookup(&query).await {
                    Ok(hit) => hit,
                    Err(e) => {
                        // Transient failure: skip the card, never retried
                        // within this session.
                        warn!(card_id = %card.id, "geocode lookup failed: {e}");
                        summary.failed += 1;
                        counter!("deckhand_geocode_failures_total").increment(1);
                        continue;
                    }
                }
            };

            let Some(latlng) = result else {
                debug!(card_id = %card.id, query = %query, "geocoder had no result");
                summary.no_result += 1;
                continue;
            };

            // Results from a superseded board snapshot must not be written.
            if self.generation.load(Ordering::SeqCst) != generation {
                info!("discarding stale geocode result after board change");
                summary.cancelled = true;
                break;
            }

            self.cache.insert(board_id, &card.id, latlng).await?;
            coords.insert(card.id.clone(), latlng);
            summary.geocoded += 1;
            counter!("deckhand_geocode_success_total").increment(1);
        }

        self.set_state(PipelineState::Idle);
        info!(
            geocoded = summary.geocoded,
            no_address = summary.no_address,
            no_result = summary.no_result,
            failed = summary.failed,
            cancelled = summary.cancelled,
            "geocode run finished"
        );
        Ok((coords, summary))
    }

    /// Explicit cache invalidation: reset action, or enabling write-back
    /// (whose semantics are incompatible with previously cached entries).
    pub async fn reset_cache(&self, board_id: &str) -> Result<()> {
        self.supersede();
        self.cache.clear(board_id).await
    }
}
