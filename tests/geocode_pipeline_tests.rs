use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use deckhand::domain::{Block, Card, LatLng};
use deckhand::geocode::{GeocodeCache, GeocodePipeline, Geocoder};
use deckhand::store::{FileStore, KvStore, MemoryStore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tempfile::tempdir;

/// Geocoder double that counts lookups and always answers the same point.
struct CountingGeocoder {
    calls: AtomicUsize,
    answer: Option<LatLng>,
}

impl CountingGeocoder {
    fn new(answer: Option<LatLng>) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            answer,
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Geocoder for CountingGeocoder {
    async fn lookup(&self, _query: &str) -> deckhand::error::Result<Option<LatLng>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.answer)
    }
}

fn card(id: &str, list_id: &str, pos: f64, description: &str) -> Card {
    Card {
        id: id.to_string(),
        list_id: list_id.to_string(),
        name: format!("card {id}"),
        description: description.to_string(),
        pos,
        labels: vec![],
        template: false,
        complete: false,
        last_activity: Utc::now(),
        coordinates: None,
    }
}

fn map_block(list_ids: &[&str], ignore_first_card: bool) -> Block {
    Block {
        id: "blk".into(),
        name: "Field work".into(),
        list_ids: list_ids.iter().map(|s| s.to_string()).collect(),
        collapsed: false,
        ignore_first_card,
        display_first_card_description: false,
        include_on_map: true,
        map_icon: None,
    }
}

fn pipeline_with(
    geocoder: Arc<CountingGeocoder>,
    store: Arc<dyn KvStore>,
) -> GeocodePipeline {
    GeocodePipeline::new(
        geocoder,
        GeocodeCache::new(store),
        Duration::from_millis(0),
    )
}

#[tokio::test]
async fn cached_cards_perform_zero_lookups() -> Result<()> {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let answer = LatLng {
        lat: -37.8,
        lng: 145.0,
    };
    let cards = vec![card("c1", "l1", 1.0, "123 Example St, Springfield VIC 3171")];
    let blocks = vec![map_block(&["l1"], false)];

    let first_geocoder = Arc::new(CountingGeocoder::new(Some(answer)));
    let pipeline = pipeline_with(first_geocoder.clone(), store.clone());
    let (coords, summary) = pipeline.run("b1", &cards, &blocks).await?;
    assert_eq!(first_geocoder.calls(), 1);
    assert_eq!(summary.geocoded, 1);
    assert_eq!(coords["c1"], answer);

    // Second run against the populated cache: same description, no network.
    let second_geocoder = Arc::new(CountingGeocoder::new(Some(answer)));
    let pipeline = pipeline_with(second_geocoder.clone(), store.clone());
    let (coords, summary) = pipeline.run("b1", &cards, &blocks).await?;
    assert_eq!(second_geocoder.calls(), 0);
    assert_eq!(summary.from_cache, 1);
    assert_eq!(summary.queued, 0);
    assert_eq!(coords["c1"], answer);
    Ok(())
}

#[tokio::test]
async fn raw_coordinate_descriptions_skip_the_network() -> Result<()> {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let geocoder = Arc::new(CountingGeocoder::new(None));
    let pipeline = pipeline_with(geocoder.clone(), store);

    let cards = vec![card("c1", "l1", 1.0, "-37.84,145.01")];
    let blocks = vec![map_block(&["l1"], false)];

    let (coords, summary) = pipeline.run("b1", &cards, &blocks).await?;
    assert_eq!(geocoder.calls(), 0);
    assert_eq!(summary.geocoded, 1);
    assert_eq!(coords["c1"].lat, -37.84);
    Ok(())
}

#[tokio::test]
async fn queue_excludes_templates_first_cards_and_unmapped_lists() -> Result<()> {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let geocoder = Arc::new(CountingGeocoder::new(None));
    let pipeline = pipeline_with(geocoder.clone(), store);

    let mut template = card("tmpl", "l1", 2.0, "10 High St");
    template.template = true;
    let cards = vec![
        card("first", "l1", 1.0, "11 High St"), // first card of ignoring block
        template,
        card("ok", "l1", 3.0, "12 High St"),
        card("blank", "l1", 4.0, "   "),
        card("elsewhere", "l9", 1.0, "13 High St"), // list not on the map
    ];
    let blocks = vec![map_block(&["l1"], true)];

    let (_, summary) = pipeline.run("b1", &cards, &blocks).await?;
    assert_eq!(summary.queued, 1);
    assert_eq!(geocoder.calls(), 1);
    Ok(())
}

#[tokio::test]
async fn unextractable_descriptions_are_skipped_silently() -> Result<()> {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let geocoder = Arc::new(CountingGeocoder::new(None));
    let pipeline = pipeline_with(geocoder.clone(), store);

    let cards = vec![card("c1", "l1", 1.0, "S12345 - no address here")];
    let blocks = vec![map_block(&["l1"], false)];

    let (coords, summary) = pipeline.run("b1", &cards, &blocks).await?;
    assert_eq!(geocoder.calls(), 0);
    assert_eq!(summary.no_address, 1);
    assert!(coords.is_empty());
    Ok(())
}

#[tokio::test]
async fn failed_lookups_do_not_poison_later_cache_writes() -> Result<()> {
    // One card resolves directly, one gets no result; the resolved entry
    // must still land in the cache.
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let geocoder = Arc::new(CountingGeocoder::new(None));
    let pipeline = pipeline_with(geocoder.clone(), store.clone());

    let cards = vec![
        card("direct", "l1", 1.0, "-37.84,145.01"),
        card("miss", "l1", 2.0, "somewhere unfindable"),
    ];
    let blocks = vec![map_block(&["l1"], false)];

    let (_, summary) = pipeline.run("b1", &cards, &blocks).await?;
    assert_eq!(summary.geocoded, 1);
    assert_eq!(summary.no_result, 1);

    let cached = GeocodeCache::new(store).load("b1").await?;
    assert!(cached.contains_key("direct"));
    assert!(!cached.contains_key("miss"));
    Ok(())
}

#[tokio::test]
async fn reset_cache_forces_full_regeocode() -> Result<()> {
    let temp_dir = tempdir()?;
    let store: Arc<dyn KvStore> = Arc::new(FileStore::new(temp_dir.path()));
    let answer = LatLng {
        lat: 1.0,
        lng: 2.0,
    };
    let cards = vec![card("c1", "l1", 1.0, "14 High St")];
    let blocks = vec![map_block(&["l1"], false)];

    let geocoder = Arc::new(CountingGeocoder::new(Some(answer)));
    let pipeline = pipeline_with(geocoder.clone(), store.clone());
    pipeline.run("b1", &cards, &blocks).await?;
    assert_eq!(geocoder.calls(), 1);

    pipeline.reset_cache("b1").await?;

    let geocoder = Arc::new(CountingGeocoder::new(Some(answer)));
    let pipeline = pipeline_with(geocoder.clone(), store);
    let (_, summary) = pipeline.run("b1", &cards, &blocks).await?;
    assert_eq!(summary.from_cache, 0);
    assert_eq!(geocoder.calls(), 1);
    Ok(())
}

/// Geocoder double that simulates a board change arriving while its lookup
/// is in flight: it supersedes the pipeline from inside `lookup`.
#[derive(Default)]
struct SupersedingGeocoder {
    pipeline: std::sync::OnceLock<Arc<GeocodePipeline>>,
}

#[async_trait]
impl Geocoder for SupersedingGeocoder {
    async fn lookup(&self, _query: &str) -> deckhand::error::Result<Option<LatLng>> {
        if let Some(pipeline) = self.pipeline.get() {
            pipeline.supersede();
        }
        Ok(Some(LatLng {
            lat: -37.8,
            lng: 145.0,
        }))
    }
}

#[tokio::test]
async fn board_change_mid_queue_discards_inflight_results() -> Result<()> {
    let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
    let geocoder = Arc::new(SupersedingGeocoder::default());
    let pipeline = Arc::new(GeocodePipeline::new(
        geocoder.clone(),
        GeocodeCache::new(store.clone()),
        Duration::from_millis(0),
    ));
    geocoder.pipeline.set(pipeline.clone()).ok();

    let cards = vec![
        card("c1", "l1", 1.0, "15 High St"),
        card("c2", "l1", 2.0, "16 High St"),
    ];
    let blocks = vec![map_block(&["l1"], false)];

    let (_, summary) = pipeline.run("b1", &cards, &blocks).await?;
    assert!(summary.cancelled);
    assert_eq!(summary.geocoded, 0);

    // The in-flight request completed but its result was discarded.
    let cached = GeocodeCache::new(store).load("b1").await?;
    assert!(cached.is_empty());
    Ok(())
}
