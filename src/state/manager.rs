//! State manager implementation
//!
//! Shares one [`OffsetState`] between every table of a connector. Loaded
//! once at setup, mutated after each completed walk, persisted at teardown.

use super::types::OffsetState;
use crate::types::ResourceType;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared, lock-protected offset state
#[derive(Debug, Clone, Default)]
pub struct StateManager {
    state: Arc<RwLock<OffsetState>>,
}

impl StateManager {
    /// Create a manager with no recorded offsets
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager seeded with `state`
    pub fn with_state(state: OffsetState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
        }
    }

    /// Overlay offsets loaded from persistence
    pub async fn load(&self, loaded: &OffsetState) {
        let mut state = self.state.write().await;
        state.merge(loaded);
    }

    /// Copy of the current state, for persisting
    pub async fn snapshot(&self) -> OffsetState {
        self.state.read().await.clone()
    }

    /// Current offset for `resource`
    pub async fn offset(&self, resource: &ResourceType) -> u64 {
        self.state.read().await.get(resource)
    }

    /// Set the offset for `resource`
    pub async fn set_offset(&self, resource: &ResourceType, offset: u64) {
        self.state.write().await.set(resource, offset);
    }

    /// Resume `resource` just past the host's last record
    pub async fn resume_after(&self, resource: &ResourceType, last_record: u64) {
        self.state.write().await.resume_after(resource, last_record);
    }

    /// Record the end of a completed walk, returning the new offset
    pub async fn advance(&self, resource: &ResourceType, last_id: u64, count: u64) -> u64 {
        self.state.write().await.advance(resource, last_id, count)
    }
}
