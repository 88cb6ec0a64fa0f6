//! Best-effort bridge between the walker and a cache store
//!
//! Every persistence failure is logged and swallowed: a broken cache never
//! aborts a refresh.

use super::store::CacheStore;
use crate::state::{OffsetState, SettingsDocument, SETTINGS_ID};
use crate::types::{cache_key, item_id, JsonValue, ResourceType};
use futures::stream::{self, StreamExt};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Default number of concurrent cache writes
pub const DEFAULT_WRITE_CONCURRENCY: usize = 8;

/// Cache access used by the table adapters
#[derive(Clone)]
pub struct CacheBridge {
    store: Option<Arc<dyn CacheStore>>,
    write_concurrency: usize,
}

impl CacheBridge {
    /// Bridge over `store`
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        Self {
            store: Some(store),
            write_concurrency: DEFAULT_WRITE_CONCURRENCY,
        }
    }

    /// Bridge that does nothing (caching off)
    pub fn disabled() -> Self {
        Self {
            store: None,
            write_concurrency: DEFAULT_WRITE_CONCURRENCY,
        }
    }

    /// Set the number of concurrent cache writes
    pub fn with_write_concurrency(mut self, concurrency: usize) -> Self {
        self.write_concurrency = concurrency.max(1);
        self
    }

    /// Check if caching is on
    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Load persisted offsets. Missing state or a store failure yields defaults.
    pub async fn load_offsets(&self) -> OffsetState {
        let Some(store) = &self.store else {
            return OffsetState::new();
        };

        match store.load_settings().await {
            Ok(Some(document)) => {
                tracing::debug!("Loaded offsets from settings document {}", document.id);
                document.settings
            }
            Ok(None) => {
                tracing::debug!("No persisted offsets, starting from defaults");
                OffsetState::new()
            }
            Err(e) => {
                tracing::warn!("Failed to load offsets, using defaults: {}", e);
                OffsetState::new()
            }
        }
    }

    /// Persist offsets. Failures are logged only.
    pub async fn save_offsets(&self, offsets: &OffsetState) {
        let Some(store) = &self.store else {
            return;
        };

        let document = SettingsDocument::new(SETTINGS_ID, offsets.clone());
        match store.save_settings(&document).await {
            Ok(()) => tracing::debug!("Saved offsets"),
            Err(e) => tracing::warn!("Failed to save offsets: {}", e),
        }
    }

    /// Cached items of `resource` in id order; empty on failure
    pub async fn load_cached_rows(&self, resource: &ResourceType) -> Vec<JsonValue> {
        let Some(store) = &self.store else {
            return Vec::new();
        };

        match store.load_rows(resource.as_str(), 0, None).await {
            Ok(rows) => rows,
            Err(e) => {
                tracing::warn!("Failed to load cached {} rows: {}", resource, e);
                Vec::new()
            }
        }
    }

    /// Upsert `items` under their `id`. Returns how many were written.
    pub async fn save_rows(&self, resource: &ResourceType, items: &[JsonValue]) -> usize {
        let Some(store) = &self.store else {
            return 0;
        };

        let keyed: Vec<(String, &JsonValue)> = items
            .iter()
            .filter_map(|item| match cache_key(item) {
                Some(key) => Some((key, item)),
                None => {
                    tracing::warn!("Skipping {} item without an id", resource);
                    None
                }
            })
            .collect();

        let results: Vec<bool> = stream::iter(keyed)
            .map(|(key, item)| {
                let store = Arc::clone(store);
                async move {
                    match store.upsert_row(resource.as_str(), &key, item).await {
                        Ok(()) => true,
                        Err(e) => {
                            tracing::warn!("Failed to cache {}/{}: {}", resource, key, e);
                            false
                        }
                    }
                }
            })
            .buffer_unordered(self.write_concurrency)
            .collect()
            .await;

        let saved = results.into_iter().filter(|ok| *ok).count();
        tracing::debug!("Cached {}/{} {} items", saved, items.len(), resource);
        saved
    }
}

impl std::fmt::Debug for CacheBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheBridge")
            .field("enabled", &self.is_enabled())
            .field("write_concurrency", &self.write_concurrency)
            .finish()
    }
}

/// Merge cached entries into freshly fetched items.
///
/// Raw items repeating an earlier id are dropped, so each id yields one row.
/// A cached entry with the same id replaces the raw item in place. Cached
/// entries with no raw counterpart are appended in id order.
pub fn merge_cached(raw: Vec<JsonValue>, cached: Vec<JsonValue>) -> Vec<JsonValue> {
    let mut seen = HashSet::new();
    let raw: Vec<JsonValue> = raw
        .into_iter()
        .filter(|item| cache_key(item).map_or(true, |key| seen.insert(key)))
        .collect();

    if cached.is_empty() {
        return raw;
    }

    let mut replacements: HashMap<String, JsonValue> = HashMap::new();
    let mut extras = Vec::new();

    for entry in cached {
        match cache_key(&entry) {
            Some(key) if seen.contains(&key) => {
                replacements.insert(key, entry);
            }
            _ => extras.push(entry),
        }
    }

    let mut merged: Vec<JsonValue> = raw
        .into_iter()
        .map(|item| {
            cache_key(&item)
                .and_then(|key| replacements.remove(&key))
                .unwrap_or(item)
        })
        .collect();

    extras.sort_by_key(|entry| item_id(entry).unwrap_or(u64::MAX));
    merged.extend(extras);
    merged
}
