//! YAML Loader module
//!
//! Parse connector definitions from YAML files.
//!
//! # Overview
//!
//! The loader module provides:
//! - `ConnectorDefinition` - Declarative connector definition
//! - `TableDefinition` - Table configuration
//! - YAML parsing with validation

mod parser;
mod types;

pub use parser::{load_connector, load_connector_from_str, validate_connector};
pub use types::{
    CacheDefinition, ConnectorDefinition, HttpDefinition, PaginationDefinition, TableDefinition,
};
