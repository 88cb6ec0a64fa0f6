//! YAML parser for connector definitions
//!
//! Parses and validates connector YAML files.
//! Supports both built-in connectors (by name) and custom YAML files (by path).

use crate::connectors;
use crate::error::{Error, Result};
use crate::loader::types::{ConnectorDefinition, TableDefinition};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Load a connector definition from a name or file path
///
/// This function first checks if the input is a built-in connector name (e.g., "pokedex"),
/// then falls back to loading from a file path.
///
/// # Examples
///
/// ```ignore
/// // Load built-in connector by name
/// let connector = load_connector("pokedex")?;
///
/// // Load custom connector from file
/// let connector = load_connector("./my-pokedex.yaml")?;
/// ```
pub fn load_connector(path: impl AsRef<Path>) -> Result<ConnectorDefinition> {
    let path = path.as_ref();
    let path_str = path.to_string_lossy();

    // Built-in names have no path separators and no .yaml extension
    if !path_str.contains('/')
        && !path_str.contains('\\')
        && !path_str.ends_with(".yaml")
        && !path_str.ends_with(".yml")
    {
        if let Some(yaml) = connectors::get_builtin(&path_str) {
            return load_connector_from_str(yaml);
        }
    }

    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            let builtin_list = connectors::list_builtin().join(", ");
            Error::config(format!(
                "Connector '{}' not found. Built-in connectors: {}. Or provide a path to a YAML file.",
                path.display(),
                builtin_list
            ))
        } else {
            Error::config(format!(
                "Failed to read connector file '{}': {}",
                path.display(),
                e
            ))
        }
    })?;
    load_connector_from_str(&content)
}

/// Load a connector definition from a YAML string
pub fn load_connector_from_str(yaml: &str) -> Result<ConnectorDefinition> {
    let def: ConnectorDefinition = serde_yaml::from_str(yaml)
        .map_err(|e| Error::config(format!("Failed to parse connector YAML: {e}")))?;

    validate_connector(&def)?;
    Ok(def)
}

/// Validate a connector definition
pub fn validate_connector(def: &ConnectorDefinition) -> Result<()> {
    if def.name.is_empty() {
        return Err(Error::config("Connector name cannot be empty"));
    }

    if def.base_url.is_empty() {
        return Err(Error::config("Connector base_url cannot be empty"));
    }

    if def.tables.is_empty() {
        return Err(Error::config("Connector must have at least one table"));
    }

    let table_ids: HashSet<_> = def.tables.iter().map(|t| &t.id).collect();
    if table_ids.len() != def.tables.len() {
        return Err(Error::config("Duplicate table ids found"));
    }

    if def.pagination.limit == 0 {
        return Err(Error::invalid_value(
            "pagination.limit",
            "must be greater than 0",
        ));
    }

    if def.pagination.concurrency == 0 {
        return Err(Error::invalid_value(
            "pagination.concurrency",
            "must be greater than 0",
        ));
    }

    for table in &def.tables {
        validate_table(table)?;
    }

    Ok(())
}

/// Validate a table definition
fn validate_table(table: &TableDefinition) -> Result<()> {
    if table.id.is_empty() {
        return Err(Error::config("Table id cannot be empty"));
    }

    if table.resource.as_deref().is_some_and(str::is_empty) {
        return Err(Error::config(format!(
            "Table '{}' resource cannot be empty",
            table.id
        )));
    }

    let incremental = table.columns.iter().filter(|c| c.incremental_refresh);
    for column in incremental {
        if !column.data_type.supports_incremental() {
            return Err(Error::invalid_value(
                format!("tables.{}.columns.{}", table.id, column.id),
                format!(
                    "incremental refresh needs an int or datetime column, got {}",
                    column.data_type
                ),
            ));
        }
    }

    Ok(())
}
