use crate::domain::{Block, MarkerRule};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Opaque key/value persistence contract. The engine never depends on the
/// storage technology behind it.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}

// All key formatting lives here; call sites never concatenate keys.
pub fn geocache_key(board_id: &str) -> String {
    format!("geocache:{board_id}")
}

pub fn layout_key(board_id: &str) -> String {
    format!("layout:{board_id}")
}

pub fn marker_rules_key(board_id: &str) -> String {
    format!("markers:{board_id}")
}

pub fn list_color_key(board_id: &str, list_id: &str) -> String {
    format!("listcolor:{board_id}:{list_id}")
}

/// In-memory store for development/testing.
pub struct MemoryStore {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.remove(key);
        Ok(())
    }
}

/// File-backed store: one JSON document per key under a data root.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Keys are namespaced with ':'; flatten for the filesystem.
        let file = key.replace(':', "_");
        self.root.join(format!("{file}.json"))
    }
}

#[async_trait]
impl KvStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path_for(key);
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        let path = self.path_for(key);
        tokio::fs::write(&path, value).await?;
        debug!(key = key, path = %path.display(), "persisted store entry");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Typed access to persisted board layout: blocks, marker rules, and
/// per-list display colors.
pub struct LayoutRepo {
    store: Arc<dyn KvStore>,
}

impl LayoutRepo {
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    pub async fn load_blocks(&self, board_id: &str) -> Result<Vec<Block>> {
        match self.store.get(&layout_key(board_id)).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn save_blocks(&self, board_id: &str, blocks: &[Block]) -> Result<()> {
        let raw = serde_json::to_string(blocks)?;
        self.store.set(&layout_key(board_id), &raw).await
    }

    pub async fn load_marker_rules(&self, board_id: &str) -> Result<Vec<MarkerRule>> {
        match self.store.get(&marker_rules_key(board_id)).await? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    pub async fn save_marker_rules(&self, board_id: &str, rules: &[MarkerRule]) -> Result<()> {
        let raw = serde_json::to_string(rules)?;
        self.store.set(&marker_rules_key(board_id), &raw).await
    }

    pub async fn list_color(&self, board_id: &str, list_id: &str) -> Result<Option<String>> {
        self.store.get(&list_color_key(board_id, list_id)).await
    }

    pub async fn set_list_color(
        &self,
        board_id: &str,
        list_id: &str,
        color: &str,
    ) -> Result<()> {
        self.store
            .set(&list_color_key(board_id, list_id), color)
            .await
    }
}
