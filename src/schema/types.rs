//! Schema types

use serde::{Deserialize, Serialize};

/// Column data type understood by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    /// true/false
    Bool,
    /// `YYYY-MM-DD`
    Date,
    /// ISO 8601 timestamp
    Datetime,
    /// Floating point number
    Float,
    /// Integer
    Int,
    /// Text (also the fallback for mixed columns)
    String,
}

impl ColumnType {
    /// Merge two types, returning the more general type
    pub fn merge_with(self, other: ColumnType) -> ColumnType {
        match (self, other) {
            (a, b) if a == b => a,
            (ColumnType::Int, ColumnType::Float) | (ColumnType::Float, ColumnType::Int) => {
                ColumnType::Float
            }
            (ColumnType::Date, ColumnType::Datetime) | (ColumnType::Datetime, ColumnType::Date) => {
                ColumnType::Datetime
            }
            // Incompatible types - fall back to string
            _ => ColumnType::String,
        }
    }

    /// Check if a column of this type can drive incremental refreshes
    pub fn supports_incremental(self) -> bool {
        matches!(self, ColumnType::Int | ColumnType::Datetime)
    }
}

impl std::fmt::Display for ColumnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnType::Bool => write!(f, "bool"),
            ColumnType::Date => write!(f, "date"),
            ColumnType::Datetime => write!(f, "datetime"),
            ColumnType::Float => write!(f, "float"),
            ColumnType::Int => write!(f, "int"),
            ColumnType::String => write!(f, "string"),
        }
    }
}

/// One column of a table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    /// Column id, the flattened key it is read from
    pub id: String,

    /// Column type
    #[serde(rename = "type")]
    pub data_type: ColumnType,

    /// Whether the host may pass this column's last value back as `last_record`
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub incremental_refresh: bool,
}

impl ColumnSchema {
    /// Create a column
    pub fn new(id: impl Into<String>, data_type: ColumnType) -> Self {
        Self {
            id: id.into(),
            data_type,
            incremental_refresh: false,
        }
    }

    /// Mark the column as the incremental refresh key
    #[must_use]
    pub fn incremental(mut self) -> Self {
        self.incremental_refresh = true;
        self
    }
}

/// Schema of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table id
    pub id: String,

    /// Display name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,

    /// Columns in display order
    pub columns: Vec<ColumnSchema>,
}

impl TableSchema {
    /// Create a table schema
    pub fn new(id: impl Into<String>, columns: Vec<ColumnSchema>) -> Self {
        Self {
            id: id.into(),
            alias: None,
            columns,
        }
    }

    /// Set the display name
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Get a column by id
    pub fn column(&self, id: &str) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.id == id)
    }

    /// Column used for incremental refreshes, if any
    pub fn incremental_column(&self) -> Option<&ColumnSchema> {
        self.columns.iter().find(|c| c.incremental_refresh)
    }

    /// Convert to pretty JSON string
    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
