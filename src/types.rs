//! Common types used throughout the bridge
//!
//! This module contains shared type definitions, type aliases,
//! and utility types used across multiple modules.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// A single-level row of scalar values keyed by flattened path.
///
/// Backed by an insertion-ordered map, so key order follows traversal order.
pub type FlatRow = serde_json::Map<String, JsonValue>;

// ============================================================================
// Resource Type
// ============================================================================

/// A logical dataset exposed by the upstream API (e.g. `pokemon`)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceType(String);

impl ResourceType {
    /// Create a resource type from its API path segment
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The API path segment, also used as the cache collection name
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceType {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl From<String> for ResourceType {
    fn from(name: String) -> Self {
        Self(name)
    }
}

// ============================================================================
// Lifecycle Phase
// ============================================================================

/// Phase in which the host initialises the connector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// A user is configuring the connector interactively
    #[default]
    Interactive,
    /// The host is collecting data in the background
    GatherData,
    /// The host is refreshing authentication only
    Auth,
}

// ============================================================================
// Retry Scope
// ============================================================================

/// How far a rate-limit retry budget reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryScope {
    /// One budget shared by every request of a walk
    #[default]
    PerWalk,
    /// A fresh budget for every request
    PerRequest,
}

// ============================================================================
// Utilities
// ============================================================================

/// Numeric identifier of an item (`id` field as number or numeric string)
pub fn item_id(item: &JsonValue) -> Option<u64> {
    match item.get("id")? {
        JsonValue::Number(n) => n.as_u64(),
        JsonValue::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Cache key of an item: its `id` rendered as a string
pub fn cache_key(item: &JsonValue) -> Option<String> {
    match item.get("id")? {
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}
