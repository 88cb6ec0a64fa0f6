//! Pagination types
//!
//! Page bodies returned by the collection endpoints and the result of
//! walking a collection.

use crate::error::{Error, Result};
use crate::types::{item_id, JsonValue, RetryScope};
use serde::Deserialize;

/// One entry of a page's `results`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PageEntry {
    /// Entity name
    #[serde(default)]
    pub name: Option<String>,
    /// URL of the full entity
    #[serde(default)]
    pub url: Option<String>,
}

/// One page of a collection: `{count, next, previous, results}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Page {
    /// Total records in the collection
    pub count: u64,
    /// URL of the next page
    #[serde(default)]
    pub next: Option<String>,
    /// URL of the previous page
    #[serde(default)]
    pub previous: Option<String>,
    /// Entries on this page
    pub results: Vec<PageEntry>,
}

impl Page {
    /// Parse a page body fetched from `url`
    pub fn from_value(url: &str, body: JsonValue) -> Result<Self> {
        serde_json::from_value(body).map_err(|e| Error::malformed(url, e.to_string()))
    }

    /// URLs of the entries that have one, in result order
    pub fn item_urls(&self) -> impl Iterator<Item = &str> {
        self.results.iter().filter_map(|entry| entry.url.as_deref())
    }

    /// Next page URL, ignoring empty strings
    pub fn next_url(&self) -> Option<&str> {
        self.next.as_deref().filter(|next| !next.is_empty())
    }
}

/// Walk configuration
#[derive(Debug, Clone)]
pub struct WalkConfig {
    /// API root, e.g. `https://pokeapi.co/api/v2`
    pub base_url: String,
    /// Page size sent as `limit`
    pub limit: u32,
    /// Ceiling on items collected per walk (0 = no ceiling)
    pub max_limit: usize,
    /// Maximum concurrent item fetches
    pub concurrency: usize,
    /// Rate-limit retries available to a walk
    pub max_retries: u32,
    /// Whether the retry budget is shared across the walk
    pub retry_scope: RetryScope,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            base_url: "https://pokeapi.co/api/v2".to_string(),
            limit: 60,
            max_limit: 180,
            concurrency: 4,
            max_retries: 2,
            retry_scope: RetryScope::PerWalk,
        }
    }
}

impl WalkConfig {
    /// Items that may still be collected after `collected`
    pub fn remaining(&self, collected: usize) -> usize {
        if self.max_limit == 0 {
            usize::MAX
        } else {
            self.max_limit.saturating_sub(collected)
        }
    }
}

/// States of a single walk
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkState {
    /// Nothing fetched yet
    Start,
    /// About to fetch the page at this URL
    FetchingPage(String),
    /// Resolving the entries of a fetched page
    ResolvingItems(Page),
    /// Collection exhausted or ceiling reached
    Done,
    /// A page or item fetch failed
    Aborted(String),
}

/// How a walk ended
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum WalkStatus {
    /// The walk ran to completion or to its ceiling
    #[default]
    Done,
    /// The walk stopped early; collected items are still usable
    Aborted {
        /// Human-readable failure reason
        reason: String,
    },
}

/// Items collected by a walk and how it ended
#[derive(Debug, Clone, Default)]
pub struct WalkOutcome {
    /// Items in collection order
    pub items: Vec<JsonValue>,
    /// Terminal status
    pub status: WalkStatus,
    /// `count` reported by the last fetched page
    pub total_count: Option<u64>,
    /// Pages fetched successfully
    pub pages: usize,
}

impl WalkOutcome {
    /// Check if the walk completed
    pub fn is_done(&self) -> bool {
        matches!(self.status, WalkStatus::Done)
    }

    /// Reason for an aborted walk
    pub fn abort_reason(&self) -> Option<&str> {
        match &self.status {
            WalkStatus::Aborted { reason } => Some(reason),
            WalkStatus::Done => None,
        }
    }

    /// Numeric id of the last collected item
    pub fn last_item_id(&self) -> Option<u64> {
        self.items.last().and_then(item_id)
    }
}
