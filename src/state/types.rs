//! Offset state for incremental refreshes
//!
//! These types are serialized to JSON and persisted between runs as the
//! settings document `{"id": "1", "settings": {"pokemon": 120, ...}}`.

use crate::types::{JsonValue, ResourceType};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Id of the single settings document
pub const SETTINGS_ID: &str = "1";

/// Resume offset per resource type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OffsetState {
    offsets: BTreeMap<String, u64>,
}

impl OffsetState {
    /// Create a new empty state
    pub fn new() -> Self {
        Self::default()
    }

    /// Offset for `resource` (0 when never recorded)
    pub fn get(&self, resource: &ResourceType) -> u64 {
        self.offsets.get(resource.as_str()).copied().unwrap_or(0)
    }

    /// Set the offset for `resource`
    pub fn set(&mut self, resource: &ResourceType, offset: u64) {
        self.offsets.insert(resource.as_str().to_string(), offset);
    }

    /// Resume just past the host's last record: `last_record + 1`
    pub fn resume_after(&mut self, resource: &ResourceType, last_record: u64) {
        self.set(resource, last_record.saturating_add(1));
    }

    /// Record the end of a completed walk.
    ///
    /// Resumes after `last_id` next time, or from 0 once `last_id` reaches
    /// the collection's reported `count`. Returns the new offset.
    pub fn advance(&mut self, resource: &ResourceType, last_id: u64, count: u64) -> u64 {
        let next = next_offset(last_id, count);
        self.set(resource, next);
        next
    }

    /// Overlay every entry of `other`
    pub fn merge(&mut self, other: &OffsetState) {
        for (name, offset) in &other.offsets {
            self.offsets.insert(name.clone(), *offset);
        }
    }

    /// Iterate `(resource, offset)` pairs in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.offsets.iter().map(|(name, offset)| (name.as_str(), *offset))
    }

    /// Check if no offsets are recorded
    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Parse a settings response.
    ///
    /// Accepts a document array (`[{"settings": {...}}]`), a single document
    /// (`{"settings": {...}}`) or a bare offset map. Non-numeric offsets are
    /// ignored; an empty or unrecognised body yields an empty state.
    pub fn from_settings_response(body: &JsonValue) -> Self {
        let document = match body {
            JsonValue::Array(documents) => documents.first(),
            other => Some(other),
        };

        let settings = match document {
            Some(JsonValue::Object(map)) => match map.get("settings") {
                Some(JsonValue::Object(settings)) => settings,
                Some(_) => return Self::new(),
                None => map,
            },
            _ => return Self::new(),
        };

        let offsets = settings
            .iter()
            .filter_map(|(name, value)| {
                let offset = match value {
                    JsonValue::Number(n) => n.as_u64(),
                    JsonValue::String(s) => s.trim().parse().ok(),
                    _ => None,
                }?;
                Some((name.clone(), offset))
            })
            .collect();

        Self { offsets }
    }
}

/// Offset to resume from after a walk ending at `last_id` of `count` records
pub fn next_offset(last_id: u64, count: u64) -> u64 {
    if last_id >= count {
        0
    } else {
        last_id
    }
}

/// The persisted settings document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SettingsDocument {
    /// Document id, always [`SETTINGS_ID`] for this connector
    pub id: String,
    /// Offsets per resource type
    pub settings: OffsetState,
}

impl SettingsDocument {
    /// Wrap `settings` in a document with the given id
    pub fn new(id: impl Into<String>, settings: OffsetState) -> Self {
        Self {
            id: id.into(),
            settings,
        }
    }
}
