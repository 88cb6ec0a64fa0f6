// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_lossless)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::ref_option)]
#![allow(clippy::unused_self)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::unused_async)]

//! # Pokedex Bridge
//!
//! Pulls paginated collections from PokeAPI and hands them to an analytics
//! host as flat rows, with an optional cache tier that remembers fetched items
//! and where each collection left off.
//!
//! ## Features
//!
//! - **Paginated Walks**: Follows `next` links page by page, resolving each
//!   page's item URLs with bounded concurrency and keeping page order
//! - **Rate-Limit Recovery**: Retries 429 responses from a shared retry budget
//! - **Flattening**: Turns nested JSON into single-level rows (`a0Xb`)
//! - **Incremental Refresh**: Persists per-resource offsets between runs
//! - **Caching**: Memory, DuckDB or remote cache server backends
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pokedex_bridge::connector::{Connector, PokedexConnector};
//! use pokedex_bridge::{load_connector, Phase, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let definition = load_connector("pokedex")?;
//!     let connector = PokedexConnector::from_definition(definition)?;
//!
//!     connector.setup(Phase::GatherData).await?;
//!     let table = connector.table("pokemon")?;
//!     let outcome = table.get_data(None).await?;
//!     let rows = table.post_process(outcome.items).await?;
//!     connector.teardown().await?;
//!
//!     println!("{} rows", rows.len());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                     Connector Interface                         │
//! │  setup(phase)   schema()   table(id)   teardown()               │
//! │  TableAdapter: get_data(last_record) → post_process(raw)        │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌────────────┬─────────────────┴──┬──────────────┬────────────────┐
//! │    HTTP    │     Pagination     │    Cache     │    Flatten     │
//! ├────────────┼────────────────────┼──────────────┼────────────────┤
//! │ Fetcher    │ Page walk          │ Memory       │ Excludes       │
//! │ 429 retry  │ Item fan-out       │ DuckDB       │ a0Xb keys      │
//! │ Limiter    │ Ceiling            │ HTTP server  │                │
//! └────────────┴────────────────────┴──────────────┴────────────────┘
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types for the bridge
pub mod error;

/// Common types and type aliases
pub mod types;

/// Query-string utilities
pub mod query;

/// Record flattening
pub mod flatten;

/// HTTP fetcher with retry, concurrency and rate limiting
pub mod http;

/// Paginated collection walker
pub mod pagination;

/// Offset state for incremental refreshes
pub mod state;

/// Item and offset caching
pub mod cache;

/// Table schemas and column inference
pub mod schema;

/// YAML loader for connector definitions
pub mod loader;

/// Built-in connector definitions
pub mod connectors;

/// Connector lifecycle and table adapters
pub mod connector;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use connector::{Connector, PokedexConnector, TableAdapter};
pub use loader::{load_connector, load_connector_from_str, ConnectorDefinition};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
