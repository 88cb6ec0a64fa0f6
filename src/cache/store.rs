//! Cache store trait and in-memory implementation

use crate::error::Result;
use crate::state::SettingsDocument;
use crate::types::JsonValue;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Backend holding the settings document and cached items
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Load the settings document, if one was ever saved
    async fn load_settings(&self) -> Result<Option<SettingsDocument>>;

    /// Replace the settings document
    async fn save_settings(&self, document: &SettingsDocument) -> Result<()>;

    /// Cached items of `collection` in numeric id order.
    ///
    /// Skips the first `offset` items and returns at most `limit` items.
    async fn load_rows(
        &self,
        collection: &str,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Vec<JsonValue>>;

    /// Insert or replace the item stored under `(collection, id)`
    async fn upsert_row(&self, collection: &str, id: &str, item: &JsonValue) -> Result<()>;
}

/// Sort key placing numeric ids first in numeric order
pub(crate) fn id_order(id: &str) -> (u64, String) {
    (id.parse().unwrap_or(u64::MAX), id.to_string())
}

/// Store keeping everything in process memory
#[derive(Debug, Default)]
pub struct MemoryCacheStore {
    settings: RwLock<Option<SettingsDocument>>,
    rows: RwLock<HashMap<String, HashMap<String, JsonValue>>>,
}

impl MemoryCacheStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of items cached for `collection`
    pub async fn len(&self, collection: &str) -> usize {
        self.rows.read().await.get(collection).map_or(0, HashMap::len)
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn load_settings(&self) -> Result<Option<SettingsDocument>> {
        Ok(self.settings.read().await.clone())
    }

    async fn save_settings(&self, document: &SettingsDocument) -> Result<()> {
        *self.settings.write().await = Some(document.clone());
        Ok(())
    }

    async fn load_rows(
        &self,
        collection: &str,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Vec<JsonValue>> {
        let rows = self.rows.read().await;
        let Some(entries) = rows.get(collection) else {
            return Ok(Vec::new());
        };

        let mut ordered: Vec<(&String, &JsonValue)> = entries.iter().collect();
        ordered.sort_by_key(|(id, _)| id_order(id));

        Ok(ordered
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .map(|(_, item)| item.clone())
            .collect())
    }

    async fn upsert_row(&self, collection: &str, id: &str, item: &JsonValue) -> Result<()> {
        self.rows
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), item.clone());
        Ok(())
    }
}
