//! Loader types
//!
//! Declarative connector definition types for YAML parsing.

use crate::schema::{ColumnSchema, TableSchema};
use crate::types::{ResourceType, RetryScope};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ============================================================================
// Connector Definition
// ============================================================================

/// Top-level connector definition
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ConnectorDefinition {
    /// Connector name
    pub name: String,
    /// Connector version
    #[serde(default = "default_version")]
    pub version: String,
    /// API root, e.g. `https://pokeapi.co/api/v2`
    pub base_url: String,
    /// Whether fetched items and offsets are cached
    #[serde(default)]
    pub caching: bool,
    /// Cache backend
    #[serde(default)]
    pub cache: CacheDefinition,
    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpDefinition,
    /// Pagination configuration
    #[serde(default)]
    pub pagination: PaginationDefinition,
    /// Table definitions
    pub tables: Vec<TableDefinition>,
}

impl ConnectorDefinition {
    /// Get a table by id
    pub fn table(&self, id: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.id == id)
    }

    /// Table ids in declaration order
    pub fn table_ids(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.id.as_str()).collect()
    }
}

fn default_version() -> String {
    "0.1.0".to_string()
}

// ============================================================================
// Cache Definition
// ============================================================================

/// Cache backend definition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheDefinition {
    /// Process-local cache, gone when the run ends
    #[default]
    Memory,
    /// DuckDB database file
    Duckdb {
        /// Database file path
        path: PathBuf,
    },
    /// Remote cache server (`pokedex-bridge serve`)
    Http {
        /// Server base URL
        url: String,
    },
}

// ============================================================================
// HTTP Definition
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpDefinition {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Maximum rate-limit retries
    #[serde(default = "default_retries")]
    pub max_retries: u32,
    /// Delay before retrying a rate-limited request, in milliseconds
    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,
    /// Cap on any single retry delay (including `Retry-After`), in milliseconds
    #[serde(default = "default_max_backoff")]
    pub max_backoff_ms: u64,
    /// Client-side pacing (requests per second)
    #[serde(default)]
    pub requests_per_second: Option<u32>,
    /// Reach of the retry budget
    #[serde(default)]
    pub retry_scope: RetryScope,
    /// User agent
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Default for HttpDefinition {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
            retry_delay_ms: default_retry_delay(),
            max_backoff_ms: default_max_backoff(),
            requests_per_second: None,
            retry_scope: RetryScope::default(),
            user_agent: None,
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_retries() -> u32 {
    2
}

fn default_retry_delay() -> u64 {
    5000
}

fn default_max_backoff() -> u64 {
    60_000
}

// ============================================================================
// Pagination Definition
// ============================================================================

/// Pagination configuration shared by all tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationDefinition {
    /// Page size sent as `limit`
    #[serde(default = "default_limit")]
    pub limit: u32,
    /// Ceiling on items per walk (0 = no ceiling)
    #[serde(default = "default_max_limit")]
    pub max_limit: usize,
    /// Maximum concurrent item fetches
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for PaginationDefinition {
    fn default() -> Self {
        Self {
            limit: default_limit(),
            max_limit: default_max_limit(),
            concurrency: default_concurrency(),
        }
    }
}

fn default_limit() -> u32 {
    60
}

fn default_max_limit() -> usize {
    180
}

fn default_concurrency() -> usize {
    4
}

// ============================================================================
// Table Definition
// ============================================================================

/// Table definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDefinition {
    /// Table id
    pub id: String,
    /// Display name
    #[serde(default)]
    pub alias: Option<String>,
    /// Upstream resource type (defaults to the table id)
    #[serde(default)]
    pub resource: Option<String>,
    /// Top-level keys removed before flattening
    #[serde(default)]
    pub excludes: Vec<String>,
    /// Starting offset when nothing is persisted
    #[serde(default)]
    pub offset: u64,
    /// Declared columns
    #[serde(default)]
    pub columns: Vec<ColumnSchema>,
}

impl TableDefinition {
    /// Upstream resource type
    pub fn resource(&self) -> ResourceType {
        ResourceType::new(self.resource.as_deref().unwrap_or(&self.id))
    }

    /// Static schema for this table
    pub fn schema(&self) -> TableSchema {
        let schema = TableSchema::new(self.id.clone(), self.columns.clone());
        match &self.alias {
            Some(alias) => schema.with_alias(alias.clone()),
            None => schema,
        }
    }
}
