//! Cache store backed by the cache HTTP server
//!
//! Talks to the `/cache/*` endpoints served by `pokedex-bridge serve`.

use super::store::CacheStore;
use crate::error::{Error, Result};
use crate::http::HttpClient;
use crate::query::append_query_param;
use crate::state::{OffsetState, SettingsDocument, SETTINGS_ID};
use crate::types::JsonValue;
use async_trait::async_trait;

/// Client for a remote cache server
#[derive(Debug)]
pub struct HttpCacheStore {
    client: HttpClient,
    base_url: String,
}

impl HttpCacheStore {
    /// Create a store talking to the server at `base_url`
    pub fn new(client: HttpClient, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    /// Server base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn settings_url(&self) -> String {
        format!("{}/cache/settings", self.base_url)
    }

    fn data_url(&self, collection: &str) -> String {
        format!("{}/cache/data/{collection}", self.base_url)
    }
}

#[async_trait]
impl CacheStore for HttpCacheStore {
    async fn load_settings(&self) -> Result<Option<SettingsDocument>> {
        let body = self.client.get_json(&self.settings_url()).await?;

        let id = match &body {
            JsonValue::Array(documents) => documents.first().and_then(|d| d.get("id")),
            other => other.get("id"),
        }
        .and_then(JsonValue::as_str)
        .unwrap_or(SETTINGS_ID)
        .to_string();

        let offsets = OffsetState::from_settings_response(&body);
        if offsets.is_empty() {
            return Ok(None);
        }
        Ok(Some(SettingsDocument::new(id, offsets)))
    }

    async fn save_settings(&self, document: &SettingsDocument) -> Result<()> {
        let url = format!("{}/{}", self.settings_url(), document.id);
        self.client.put_json(&url, &document.settings).await?;
        Ok(())
    }

    async fn load_rows(
        &self,
        collection: &str,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Vec<JsonValue>> {
        let mut url = self.data_url(collection);
        if offset > 0 {
            url = append_query_param(&url, "offset", offset);
        }
        if let Some(limit) = limit {
            url = append_query_param(&url, "limit", limit);
        }

        match self.client.get_json(&url).await? {
            JsonValue::Array(items) => Ok(items),
            JsonValue::Null => Ok(Vec::new()),
            other => Err(Error::malformed(
                url,
                format!("expected an array of cached items, got {other}"),
            )),
        }
    }

    async fn upsert_row(&self, collection: &str, _id: &str, item: &JsonValue) -> Result<()> {
        self.client.put_json(&self.data_url(collection), item).await?;
        Ok(())
    }
}
