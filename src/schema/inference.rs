//! Column type inference from flattened rows

use super::types::{ColumnSchema, ColumnType};
use crate::types::{FlatRow, JsonValue};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

static DATETIME_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}").ok());

static DATE_RE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").ok());

/// Column inferrer with configuration options
#[derive(Debug, Clone)]
pub struct ColumnInferrer {
    /// Detect date and datetime strings
    detect_dates: bool,
    /// Column that drives incremental refreshes
    incremental_column: Option<String>,
}

impl Default for ColumnInferrer {
    fn default() -> Self {
        Self::new()
    }
}

impl ColumnInferrer {
    /// Create a new inferrer with default settings
    pub fn new() -> Self {
        Self {
            detect_dates: true,
            incremental_column: Some("id".to_string()),
        }
    }

    /// Enable/disable date detection
    #[must_use]
    pub fn with_date_detection(mut self, enabled: bool) -> Self {
        self.detect_dates = enabled;
        self
    }

    /// Set the incremental refresh column (`None` for no column)
    #[must_use]
    pub fn with_incremental_column(mut self, column: Option<&str>) -> Self {
        self.incremental_column = column.map(str::to_string);
        self
    }

    /// Infer the type of a single value; `None` for null
    pub fn infer_value(&self, value: &JsonValue) -> Option<ColumnType> {
        match value {
            JsonValue::Null => None,
            JsonValue::Bool(_) => Some(ColumnType::Bool),
            JsonValue::Number(n) if n.is_i64() || n.is_u64() => Some(ColumnType::Int),
            JsonValue::Number(_) => Some(ColumnType::Float),
            JsonValue::String(s) if self.detect_dates => Some(string_type(s)),
            // Rows are flat; anything else is rendered as text
            _ => Some(ColumnType::String),
        }
    }

    /// Infer columns from rows, in order of first appearance.
    ///
    /// Columns that are null in every row default to `string`.
    pub fn infer(&self, rows: &[FlatRow]) -> Vec<ColumnSchema> {
        let mut order: Vec<String> = Vec::new();
        let mut types: HashMap<String, Option<ColumnType>> = HashMap::new();

        for row in rows {
            for (key, value) in row {
                let inferred = self.infer_value(value);
                match types.get_mut(key) {
                    Some(slot) => {
                        *slot = match (*slot, inferred) {
                            (Some(a), Some(b)) => Some(a.merge_with(b)),
                            (a, b) => a.or(b),
                        };
                    }
                    None => {
                        order.push(key.clone());
                        types.insert(key.clone(), inferred);
                    }
                }
            }
        }

        order
            .into_iter()
            .map(|id| {
                let data_type = types
                    .get(&id)
                    .copied()
                    .flatten()
                    .unwrap_or(ColumnType::String);
                let incremental = data_type.supports_incremental()
                    && self.incremental_column.as_deref() == Some(id.as_str());
                let column = ColumnSchema::new(id, data_type);
                if incremental {
                    column.incremental()
                } else {
                    column
                }
            })
            .collect()
    }
}

/// Infer columns with default settings
pub fn infer_columns(rows: &[FlatRow]) -> Vec<ColumnSchema> {
    ColumnInferrer::new().infer(rows)
}

fn string_type(s: &str) -> ColumnType {
    if is_date(s) {
        ColumnType::Date
    } else if is_datetime(s) {
        ColumnType::Datetime
    } else {
        ColumnType::String
    }
}

fn is_datetime(s: &str) -> bool {
    DATETIME_RE.as_ref().is_some_and(|re| re.is_match(s))
}

fn is_date(s: &str) -> bool {
    DATE_RE.as_ref().is_some_and(|re| re.is_match(s))
}
