use crate::domain::LatLng;
use crate::error::Result;
use crate::store::{geocache_key, KvStore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Persistent card-id → coordinates cache, namespaced per board.
///
/// Entries are written once and never mutated; only an explicit clear (reset
/// action, or enabling coordinate write-back) forgets them.
pub struct GeocodeCache {
    store: Arc<dyn KvStore>,
}

impl GeocodeCache {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn load(&self, board_id: &str) -> Result<HashMap<String, LatLng>> {
        match self.store.get(&geocache_key(board_id)).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(HashMap::new()),
        }
    }

    /// Writes a single entry through a read-modify-write of the board's map,
    /// so every successful geocode survives later failures in the same run.
    pub async fn insert(&self, board_id: &str, card_id: &str, coords: LatLng) -> Result<()> {
        let mut entries = self.load(board_id).await?;
        entries.insert(card_id.to_string(), coords);
        let raw = serde_json::to_string(&entries)?;
        self.store.set(&geocache_key(board_id), &raw).await?;
        debug!(board_id, card_id, "cached geocode result");
        Ok(())
    }

    pub async fn clear(&self, board_id: &str) -> Result<()> {
        self.store.delete(&geocache_key(board_id)).await?;
        info!(board_id, "geocode cache cleared");
        Ok(())
    }
}
