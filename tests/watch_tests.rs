use anyhow::Result;
use async_trait::async_trait;
use deckhand::board::BoardApi;
use deckhand::domain::{Card, Filters, LatLng, List};
use deckhand::error::EngineError;
use deckhand::store::{KvStore, LayoutRepo};
use deckhand::tasks::watch_dashboard;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Board double that counts fetches and can simulate a throttling provider.
struct StubBoardApi {
    fetches: AtomicUsize,
    rate_limited: bool,
}

impl StubBoardApi {
    fn new(rate_limited: bool) -> Self {
        Self {
            fetches: AtomicUsize::new(0),
            rate_limited,
        }
    }

    fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BoardApi for StubBoardApi {
    async fn board_cards(&self, _board_id: &str) -> deckhand::error::Result<Vec<Card>> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        if self.rate_limited {
            return Err(EngineError::RateLimited);
        }
        Ok(vec![])
    }

    async fn list_cards(&self, _list_id: &str) -> deckhand::error::Result<Vec<Card>> {
        Ok(vec![])
    }

    async fn board_lists(&self, _board_id: &str) -> deckhand::error::Result<Vec<List>> {
        Ok(vec![])
    }

    async fn write_coordinates(
        &self,
        _card_id: &str,
        _coords: &LatLng,
    ) -> deckhand::error::Result<()> {
        Ok(())
    }

    async fn has_write_scope(&self) -> deckhand::error::Result<bool> {
        Ok(false)
    }
}

/// Store double whose reads always fail, as a wedged persistence layer would.
struct FailingStore;

#[async_trait]
impl KvStore for FailingStore {
    async fn get(&self, _key: &str) -> deckhand::error::Result<Option<String>> {
        Err(EngineError::Config("transient store failure".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> deckhand::error::Result<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> deckhand::error::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn store_failures_do_not_terminate_the_watch_loop() -> Result<()> {
    let api = Arc::new(StubBoardApi::new(false));
    let layout = LayoutRepo::new(Arc::new(FailingStore));

    watch_dashboard(
        api.clone(),
        &layout,
        &Filters::default(),
        "b1",
        Duration::from_millis(0),
        Some(3),
    )
    .await?;

    // Every scheduled cycle ran despite the store failing each time.
    assert_eq!(api.fetches(), 3);
    Ok(())
}

#[tokio::test]
async fn rate_limited_cycles_keep_auto_refresh_running() -> Result<()> {
    let api = Arc::new(StubBoardApi::new(true));
    let layout = LayoutRepo::new(Arc::new(FailingStore));

    watch_dashboard(
        api.clone(),
        &layout,
        &Filters::default(),
        "b1",
        Duration::from_millis(0),
        Some(2),
    )
    .await?;

    assert_eq!(api.fetches(), 2);
    Ok(())
}
