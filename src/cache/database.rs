//! DuckDB-backed cache store
//!
//! Two tables hold everything:
//! - `cache_settings(id, settings)` with the offsets document as JSON text
//! - `cache_data(collection, id, payload)` keyed by `(collection, id)`
//!
//! DuckDB calls block, so every statement runs on tokio's blocking pool.

use super::store::CacheStore;
use crate::error::{Error, Result};
use crate::state::{OffsetState, SettingsDocument};
use crate::types::JsonValue;
use async_trait::async_trait;
use duckdb::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};

const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS cache_settings (
        id VARCHAR PRIMARY KEY,
        settings VARCHAR NOT NULL
    );
    CREATE TABLE IF NOT EXISTS cache_data (
        collection VARCHAR NOT NULL,
        id VARCHAR NOT NULL,
        payload VARCHAR NOT NULL,
        PRIMARY KEY (collection, id)
    );
";

/// Cache store persisted in a DuckDB database
pub struct DuckDbCacheStore {
    conn: Arc<Mutex<Connection>>,
    location: String,
}

impl DuckDbCacheStore {
    /// Open (or create) the database file at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|e| {
            Error::persistence(format!(
                "Failed to open DuckDB database {}: {e}",
                path.display()
            ))
        })?;
        Self::init(conn, path.display().to_string())
    }

    /// Open a throwaway in-memory database
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::persistence(format!("Failed to create DuckDB connection: {e}")))?;
        Self::init(conn, ":memory:".to_string())
    }

    fn init(conn: Connection, location: String) -> Result<Self> {
        conn.execute_batch(CREATE_TABLES)
            .map_err(|e| Error::persistence(format!("Failed to create cache tables: {e}")))?;

        tracing::debug!("Opened cache database at {}", location);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            location,
        })
    }

    /// Where the database lives (`:memory:` for in-memory stores)
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Run `f` against the connection on the blocking pool
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|_| Error::persistence("Cache database lock poisoned"))?;
            f(&conn)
        })
        .await
        .map_err(|e| Error::persistence(format!("Cache database task failed: {e}")))?
    }
}

impl std::fmt::Debug for DuckDbCacheStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuckDbCacheStore")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CacheStore for DuckDbCacheStore {
    async fn load_settings(&self) -> Result<Option<SettingsDocument>> {
        let row = self
            .with_conn(|conn| {
                let mut stmt = conn
                    .prepare("SELECT id, settings FROM cache_settings ORDER BY id LIMIT 1")
                    .map_err(|e| {
                        Error::persistence(format!("Failed to prepare settings query: {e}"))
                    })?;
                let mut rows = stmt
                    .query([])
                    .map_err(|e| Error::persistence(format!("Failed to query settings: {e}")))?;

                let Some(row) = rows
                    .next()
                    .map_err(|e| Error::persistence(format!("Failed to read settings: {e}")))?
                else {
                    return Ok(None);
                };

                let id: String = row
                    .get(0)
                    .map_err(|e| Error::persistence(format!("Failed to read settings id: {e}")))?;
                let text: String = row
                    .get(1)
                    .map_err(|e| Error::persistence(format!("Failed to read settings: {e}")))?;
                Ok(Some((id, text)))
            })
            .await?;

        let Some((id, text)) = row else {
            return Ok(None);
        };
        let value: JsonValue = serde_json::from_str(&text)?;
        Ok(Some(SettingsDocument::new(
            id,
            OffsetState::from_settings_response(&value),
        )))
    }

    async fn save_settings(&self, document: &SettingsDocument) -> Result<()> {
        let text = serde_json::to_string(&document.settings)?;
        let id = document.id.clone();
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO cache_settings (id, settings) VALUES (?, ?)",
                params![id, text],
            )
            .map_err(|e| Error::persistence(format!("Failed to save settings: {e}")))?;
            Ok(())
        })
        .await
    }

    async fn load_rows(
        &self,
        collection: &str,
        offset: usize,
        limit: Option<usize>,
    ) -> Result<Vec<JsonValue>> {
        let window = match limit {
            Some(limit) => format!("LIMIT {limit} OFFSET {offset}"),
            None => format!("OFFSET {offset}"),
        };
        let query = format!(
            "SELECT payload FROM cache_data WHERE collection = ? \
             ORDER BY TRY_CAST(id AS UBIGINT) NULLS LAST, id {window}"
        );
        let collection = collection.to_string();

        let payloads: Vec<String> = self
            .with_conn(move |conn| {
                let mut stmt = conn
                    .prepare(&query)
                    .map_err(|e| Error::persistence(format!("Failed to prepare query: {e}")))?;
                let rows = stmt
                    .query_map(params![collection], |row| row.get::<_, String>(0))
                    .map_err(|e| {
                        Error::persistence(format!("Failed to query {collection}: {e}"))
                    })?;
                rows.collect::<std::result::Result<_, _>>()
                    .map_err(|e| Error::persistence(format!("Failed to read {collection}: {e}")))
            })
            .await?;

        payloads
            .iter()
            .map(|text| serde_json::from_str(text).map_err(Error::from))
            .collect()
    }

    async fn upsert_row(&self, collection: &str, id: &str, item: &JsonValue) -> Result<()> {
        let payload = serde_json::to_string(item)?;
        let (collection, id) = (collection.to_string(), id.to_string());
        self.with_conn(move |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO cache_data (collection, id, payload) VALUES (?, ?, ?)",
                params![collection, id, payload],
            )
            .map_err(|e| Error::persistence(format!("Failed to upsert {collection}/{id}: {e}")))?;
            Ok(())
        })
        .await
    }
}
