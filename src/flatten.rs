//! Record flattening
//!
//! Converts a nested JSON record into a single-level [`FlatRow`] of scalar
//! leaves. Key derivation:
//!
//! - a top-level scalar (or null) keeps its property name
//! - array elements append their index directly: `moves` -> `moves0`, `moves1`
//! - object properties append `X` and the property name: `sprites` -> `spritesXfront_default`
//!
//! So `{"a": [{"b": 1}]}` flattens to `{"a0Xb": 1}`. Empty arrays and objects
//! contribute no keys.

use crate::types::{FlatRow, JsonValue};

/// Marker inserted between an object key and its child property names
pub const OBJECT_MARKER: char = 'X';

/// Remove every top-level key in `excludes` from `record`.
///
/// Applied before flattening so large unused sub-trees (move lists, flavor
/// text, localized names) are never traversed.
pub fn strip_excluded<S: AsRef<str>>(record: &mut JsonValue, excludes: &[S]) {
    if let JsonValue::Object(map) = record {
        for key in excludes {
            map.shift_remove(key.as_ref());
        }
    }
}

/// Strip `excludes` from `record` and flatten what is left.
pub fn flatten<S: AsRef<str>>(mut record: JsonValue, excludes: &[S]) -> FlatRow {
    strip_excluded(&mut record, excludes);
    flatten_record(&record)
}

/// Flatten a record without any exclusion.
///
/// Non-object records have no named properties and flatten to an empty row.
pub fn flatten_record(record: &JsonValue) -> FlatRow {
    let mut row = FlatRow::new();

    if let JsonValue::Object(map) = record {
        for (key, value) in map {
            emit(key.clone(), value, &mut row);
        }
    }

    row
}

fn emit(key: String, value: &JsonValue, row: &mut FlatRow) {
    match value {
        JsonValue::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                emit(format!("{key}{index}"), item, row);
            }
        }
        JsonValue::Object(map) => {
            for (child, item) in map {
                emit(format!("{key}{OBJECT_MARKER}{child}"), item, row);
            }
        }
        scalar => {
            row.insert(key, scalar.clone());
        }
    }
}
