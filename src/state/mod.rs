//! State management module
//!
//! Tracks the pagination offset of every resource type so that subsequent
//! runs resume where the last completed walk stopped.
//!
//! # Overview
//!
//! The state module provides:
//! - `OffsetState` - Offset per resource type with wrap-around bookkeeping
//! - `SettingsDocument` - The persisted `{id, settings}` document
//! - `StateManager` - Lock-protected state shared by all tables

mod manager;
mod types;

pub use manager::StateManager;
pub use types::{next_offset, OffsetState, SettingsDocument, SETTINGS_ID};
