//! Connector trait and the PokeAPI connector
//!
//! Defines the host lifecycle (`setup`, `schema`, `table`, `teardown`) and the
//! per-table adapters that turn a paginated walk into flattened rows.

use crate::cache::{
    merge_cached, CacheBridge, CacheStore, DuckDbCacheStore, HttpCacheStore, MemoryCacheStore,
};
use crate::error::{Error, Result};
use crate::flatten::flatten;
use crate::http::{Fetcher, HttpClient, HttpClientConfig, RateLimiterConfig};
use crate::loader::{CacheDefinition, ConnectorDefinition, TableDefinition};
use crate::pagination::{PaginationWalker, WalkConfig, WalkOutcome};
use crate::schema::TableSchema;
use crate::state::{OffsetState, StateManager};
use crate::types::{FlatRow, JsonValue, Phase, ResourceType};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Connector Trait
// ============================================================================

/// Lifecycle the host drives a connector through
#[async_trait]
pub trait Connector: Send + Sync {
    /// Prepare for `phase`. Persisted offsets are loaded in
    /// [`Phase::GatherData`] when caching is on.
    async fn setup(&self, phase: Phase) -> Result<()>;

    /// Finish the run, persisting offsets when caching is on
    async fn teardown(&self) -> Result<()>;

    /// Schema of every table
    fn schema(&self) -> Vec<TableSchema>;

    /// Get a table by id
    fn table(&self, id: &str) -> Result<&TableAdapter>;
}

// ============================================================================
// Table Adapter
// ============================================================================

/// Fetches and shapes the rows of one table
pub struct TableAdapter {
    definition: TableDefinition,
    resource: ResourceType,
    walker: Arc<PaginationWalker>,
    state: StateManager,
    cache: CacheBridge,
}

impl TableAdapter {
    /// Table id
    pub fn id(&self) -> &str {
        &self.definition.id
    }

    /// Upstream resource type
    pub fn resource(&self) -> &ResourceType {
        &self.resource
    }

    /// Static schema
    pub fn schema(&self) -> TableSchema {
        self.definition.schema()
    }

    /// Walk the resource from its stored offset.
    ///
    /// A `last_record` from the host (number or numeric string) moves the
    /// offset to just past it first. Collected items are cached whether or
    /// not the walk completed; the offset only advances on completion.
    pub async fn get_data(&self, last_record: Option<&JsonValue>) -> Result<WalkOutcome> {
        if let Some(last) = last_record.map(parse_last_record).transpose()?.flatten() {
            self.state.resume_after(&self.resource, last).await;
        }

        let offset = self.state.offset(&self.resource).await;
        tracing::info!("Fetching {} from offset {}", self.resource, offset);

        let outcome = self.walker.walk_all(&self.resource, offset).await;

        if self.cache.is_enabled() {
            self.cache.save_rows(&self.resource, &outcome.items).await;
        }

        if outcome.is_done() {
            let last_id = outcome.last_item_id().unwrap_or(offset);
            let count = outcome.total_count.unwrap_or(0);
            let next = self.state.advance(&self.resource, last_id, count).await;
            tracing::info!(
                "Fetched {} {} items, next offset {}",
                outcome.items.len(),
                self.resource,
                next
            );
        } else {
            tracing::warn!(
                "Fetch of {} aborted after {} items: {}",
                self.resource,
                outcome.items.len(),
                outcome.abort_reason().unwrap_or("unknown")
            );
        }

        Ok(outcome)
    }

    /// Merge cached entries (when caching is on), strip excludes and flatten
    pub async fn post_process(&self, raw: Vec<JsonValue>) -> Result<Vec<FlatRow>> {
        let items = if self.cache.is_enabled() {
            let cached = self.cache.load_cached_rows(&self.resource).await;
            merge_cached(raw, cached)
        } else {
            raw
        };

        Ok(items
            .into_iter()
            .map(|item| flatten(item, &self.definition.excludes))
            .collect())
    }
}

impl std::fmt::Debug for TableAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TableAdapter")
            .field("id", &self.definition.id)
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}

/// Parse a host-supplied last record; `null` means none
fn parse_last_record(value: &JsonValue) -> Result<Option<u64>> {
    let parsed = match value {
        JsonValue::Null => return Ok(None),
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    };

    parsed.map(Some).ok_or_else(|| {
        Error::invalid_value(
            "last_record",
            format!("expected a non-negative integer, got {value}"),
        )
    })
}

// ============================================================================
// PokeAPI Connector
// ============================================================================

/// Connector built from a [`ConnectorDefinition`]
pub struct PokedexConnector {
    definition: ConnectorDefinition,
    cache: CacheBridge,
    state: StateManager,
    tables: Vec<TableAdapter>,
}

impl PokedexConnector {
    /// Build the HTTP client, cache store and walker described by `definition`.
    ///
    /// A cache store that cannot be opened disables caching for the run.
    pub fn from_definition(definition: ConnectorDefinition) -> Result<Self> {
        let http_config = http_config(&definition);
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpClient::with_config(http_config.clone())?);

        let cache = if definition.caching {
            match open_store(&definition.cache, http_config) {
                Ok(store) => CacheBridge::new(store),
                Err(e) => {
                    tracing::warn!("Cache unavailable, continuing without it: {}", e);
                    CacheBridge::disabled()
                }
            }
        } else {
            CacheBridge::disabled()
        };

        Ok(Self::with_parts(definition, fetcher, cache))
    }

    /// Assemble a connector from an existing fetcher and cache bridge
    pub fn with_parts(
        definition: ConnectorDefinition,
        fetcher: Arc<dyn Fetcher>,
        cache: CacheBridge,
    ) -> Self {
        let walk_config = WalkConfig {
            base_url: definition.base_url.clone(),
            limit: definition.pagination.limit,
            max_limit: definition.pagination.max_limit,
            concurrency: definition.pagination.concurrency,
            max_retries: definition.http.max_retries,
            retry_scope: definition.http.retry_scope,
        };
        let walker = Arc::new(PaginationWalker::new(fetcher, walk_config));

        let mut seed = OffsetState::new();
        for table in &definition.tables {
            if table.offset > 0 {
                seed.set(&table.resource(), table.offset);
            }
        }
        let state = StateManager::with_state(seed);

        let tables = definition
            .tables
            .iter()
            .map(|table| TableAdapter {
                definition: table.clone(),
                resource: table.resource(),
                walker: Arc::clone(&walker),
                state: state.clone(),
                cache: cache.clone(),
            })
            .collect();

        Self {
            definition,
            cache,
            state,
            tables,
        }
    }

    /// Get the connector definition
    pub fn definition(&self) -> &ConnectorDefinition {
        &self.definition
    }

    /// Shared offset state
    pub fn state(&self) -> &StateManager {
        &self.state
    }

    /// Cache bridge used by every table
    pub fn cache(&self) -> &CacheBridge {
        &self.cache
    }

    /// Table adapters in declaration order
    pub fn tables(&self) -> &[TableAdapter] {
        &self.tables
    }
}

#[async_trait]
impl Connector for PokedexConnector {
    async fn setup(&self, phase: Phase) -> Result<()> {
        tracing::debug!("Setting up {} for {:?}", self.definition.name, phase);

        if phase == Phase::GatherData && self.cache.is_enabled() {
            let offsets = self.cache.load_offsets().await;
            self.state.load(&offsets).await;
        }
        Ok(())
    }

    async fn teardown(&self) -> Result<()> {
        if self.cache.is_enabled() {
            let offsets = self.state.snapshot().await;
            self.cache.save_offsets(&offsets).await;
        }
        Ok(())
    }

    fn schema(&self) -> Vec<TableSchema> {
        self.tables.iter().map(TableAdapter::schema).collect()
    }

    fn table(&self, id: &str) -> Result<&TableAdapter> {
        self.tables
            .iter()
            .find(|t| t.id() == id)
            .ok_or_else(|| Error::table_not_found(id))
    }
}

impl std::fmt::Debug for PokedexConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PokedexConnector")
            .field("name", &self.definition.name)
            .field("cache", &self.cache)
            .field("tables", &self.tables)
            .finish_non_exhaustive()
    }
}

fn http_config(definition: &ConnectorDefinition) -> HttpClientConfig {
    let http = &definition.http;
    let mut builder = HttpClientConfig::builder()
        .timeout(Duration::from_secs(http.timeout_secs))
        .max_retries(http.max_retries)
        .retry_delay(
            Duration::from_millis(http.retry_delay_ms),
            Duration::from_millis(http.max_backoff_ms),
        );

    if let Some(rps) = http.requests_per_second {
        builder = builder.rate_limit(RateLimiterConfig::per_second(rps));
    }
    if let Some(agent) = &http.user_agent {
        builder = builder.user_agent(agent.clone());
    }

    builder.build()
}

fn open_store(
    cache: &CacheDefinition,
    http_config: HttpClientConfig,
) -> Result<Arc<dyn CacheStore>> {
    let store: Arc<dyn CacheStore> = match cache {
        CacheDefinition::Memory => Arc::new(MemoryCacheStore::new()),
        CacheDefinition::Duckdb { path } => Arc::new(DuckDbCacheStore::open(path)?),
        CacheDefinition::Http { url } => Arc::new(HttpCacheStore::new(
            HttpClient::with_config(http_config)?,
            url.clone(),
        )),
    };
    Ok(store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::load_connector_from_str;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn definition(server: &MockServer, caching: bool) -> ConnectorDefinition {
        let yaml = format!(
            r#"
name: test
base_url: {}/api/v2
caching: {caching}
http:
  retry_delay_ms: 10
pagination:
  limit: 2
  max_limit: 0
  concurrency: 2
tables:
  - id: pokemon
    excludes: [moves]
    columns:
      - {{ id: id, type: int, incremental_refresh: true }}
"#,
            server.uri()
        );
        load_connector_from_str(&yaml).unwrap()
    }

    async fn mount_pokemon(server: &MockServer, offset: &str, ids: &[u64], count: u64) {
        let results: Vec<JsonValue> = ids
            .iter()
            .map(|id| {
                json!({
                    "name": format!("mon-{id}"),
                    "url": format!("{}/api/v2/pokemon/{id}/", server.uri())
                })
            })
            .collect();

        Mock::given(method("GET"))
            .and(path("/api/v2/pokemon"))
            .and(query_param("offset", offset))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": count,
                "next": null,
                "previous": null,
                "results": results
            })))
            .mount(server)
            .await;

        for id in ids {
            Mock::given(method("GET"))
                .and(path(format!("/api/v2/pokemon/{id}/")))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "id": id,
                    "name": format!("mon-{id}"),
                    "moves": [{"move": {"name": "tackle"}}],
                    "types": [{"slot": 1, "type": {"name": "normal"}}]
                })))
                .mount(server)
                .await;
        }
    }

    #[tokio::test]
    async fn test_get_data_and_post_process() {
        let server = MockServer::start().await;
        mount_pokemon(&server, "0", &[1, 2], 10).await;

        let connector =
            PokedexConnector::from_definition(definition(&server, false)).unwrap();
        connector.setup(Phase::GatherData).await.unwrap();

        let table = connector.table("pokemon").unwrap();
        let outcome = table.get_data(None).await.unwrap();
        assert!(outcome.is_done());
        assert_eq!(outcome.items.len(), 2);

        let rows = table.post_process(outcome.items).await.unwrap();
        let expected: FlatRow = serde_json::from_value(json!({
            "id": 1,
            "name": "mon-1",
            "types0Xslot": 1,
            "types0XtypeXname": "normal"
        }))
        .unwrap();
        assert_eq!(rows[0], expected);
        assert!(rows.iter().all(|row| !row.keys().any(|k| k.starts_with("moves"))));

        assert_eq!(connector.state().offset(table.resource()).await, 2);
    }

    #[tokio::test]
    async fn test_last_record_sets_offset() {
        let server = MockServer::start().await;
        mount_pokemon(&server, "42", &[42, 43], 100).await;

        let connector =
            PokedexConnector::from_definition(definition(&server, false)).unwrap();
        let table = connector.table("pokemon").unwrap();

        let outcome = table.get_data(Some(&json!("41"))).await.unwrap();
        assert_eq!(outcome.items.len(), 2);
        assert_eq!(connector.state().offset(table.resource()).await, 43);
    }

    #[tokio::test]
    async fn test_invalid_last_record() {
        let server = MockServer::start().await;
        let connector =
            PokedexConnector::from_definition(definition(&server, false)).unwrap();
        let table = connector.table("pokemon").unwrap();

        let err = table.get_data(Some(&json!("abc"))).await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));

        let err = table.get_data(Some(&json!(-1))).await.unwrap_err();
        assert!(matches!(err, Error::InvalidConfigValue { .. }));
    }

    #[tokio::test]
    async fn test_offset_wraps_after_last_item() {
        let server = MockServer::start().await;
        mount_pokemon(&server, "0", &[1, 2], 2).await;

        let connector =
            PokedexConnector::from_definition(definition(&server, false)).unwrap();
        let table = connector.table("pokemon").unwrap();

        table.get_data(None).await.unwrap();
        assert_eq!(connector.state().offset(table.resource()).await, 0);
    }

    #[tokio::test]
    async fn test_aborted_walk_keeps_offset_and_caches_items() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v2/pokemon"))
            .and(query_param("offset", "0"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "count": 4,
                "next": format!("{}/api/v2/pokemon?limit=2&offset=2", server.uri()),
                "previous": null,
                "results": [{"name": "mon-1", "url": format!("{}/api/v2/pokemon/1/", server.uri())}]
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/pokemon/1/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 1})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/v2/pokemon"))
            .and(query_param("offset", "2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let store = Arc::new(MemoryCacheStore::new());
        let def = definition(&server, true);
        let fetcher: Arc<dyn Fetcher> = Arc::new(HttpClient::new().unwrap());
        let connector =
            PokedexConnector::with_parts(def, fetcher, CacheBridge::new(store.clone()));
        let table = connector.table("pokemon").unwrap();

        let outcome = table.get_data(None).await.unwrap();
        assert!(!outcome.is_done());
        assert_eq!(outcome.items, vec![json!({"id": 1})]);
        assert_eq!(store.len("pokemon").await, 1);
        assert_eq!(connector.state().offset(table.resource()).await, 0);
    }

    #[tokio::test]
    async fn test_offsets_persist_across_runs() {
        let server = MockServer::start().await;
        mount_pokemon(&server, "0", &[1, 2], 10).await;

        let store = Arc::new(MemoryCacheStore::new());
        let first = PokedexConnector::with_parts(
            definition(&server, true),
            Arc::new(HttpClient::new().unwrap()),
            CacheBridge::new(store.clone()),
        );
        first.setup(Phase::GatherData).await.unwrap();
        first.table("pokemon").unwrap().get_data(None).await.unwrap();
        first.teardown().await.unwrap();

        let second = PokedexConnector::with_parts(
            definition(&server, true),
            Arc::new(HttpClient::new().unwrap()),
            CacheBridge::new(store.clone()),
        );
        let pokemon = ResourceType::new("pokemon");

        second.setup(Phase::Interactive).await.unwrap();
        assert_eq!(second.state().offset(&pokemon).await, 0);

        second.setup(Phase::GatherData).await.unwrap();
        assert_eq!(second.state().offset(&pokemon).await, 2);
    }

    #[tokio::test]
    async fn test_post_process_merges_cache() {
        let server = MockServer::start().await;
        let store = Arc::new(MemoryCacheStore::new());
        store
            .upsert_row("pokemon", "2", &json!({"id": 2, "name": "cached-2"}))
            .await
            .unwrap();
        store
            .upsert_row("pokemon", "9", &json!({"id": 9, "name": "cached-9", "moves": []}))
            .await
            .unwrap();

        let connector = PokedexConnector::with_parts(
            definition(&server, true),
            Arc::new(HttpClient::new().unwrap()),
            CacheBridge::new(store),
        );
        let table = connector.table("pokemon").unwrap();

        let rows = table
            .post_process(vec![
                json!({"id": 1, "name": "fresh-1"}),
                json!({"id": 2, "name": "fresh-2"}),
            ])
            .await
            .unwrap();

        let names: Vec<&JsonValue> = rows.iter().map(|row| &row["name"]).collect();
        assert_eq!(names, vec!["fresh-1", "cached-2", "cached-9"]);
    }

    #[test]
    fn test_table_not_found_and_schema() {
        let def = load_connector_from_str(
            "name: t\nbase_url: http://pokeapi.test\ntables:\n  - id: pokemon\n  - id: species\n    resource: pokemon-species",
        )
        .unwrap();
        let connector = PokedexConnector::from_definition(def).unwrap();

        let err = connector.table("berries").unwrap_err();
        assert!(matches!(err, Error::TableNotFound { .. }));

        let ids: Vec<String> = connector.schema().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec!["pokemon", "species"]);
        assert_eq!(
            connector.table("species").unwrap().resource().as_str(),
            "pokemon-species"
        );
        assert!(!connector.cache().is_enabled());
    }

    #[test]
    fn test_parse_last_record() {
        assert_eq!(parse_last_record(&json!(5)).unwrap(), Some(5));
        assert_eq!(parse_last_record(&json!(" 7 ")).unwrap(), Some(7));
        assert_eq!(parse_last_record(&JsonValue::Null).unwrap(), None);
        assert!(parse_last_record(&json!(1.5)).is_err());
        assert!(parse_last_record(&json!({"id": 1})).is_err());
    }
}
