//! Schema inference tests

use super::*;
use crate::flatten::flatten_record;
use crate::types::FlatRow;
use serde_json::json;

fn row(value: serde_json::Value) -> FlatRow {
    flatten_record(&value)
}

#[test]
fn test_infer_scalar_types() {
    let rows = vec![row(json!({
        "id": 25,
        "name": "pikachu",
        "is_default": true,
        "weight_kg": 6.0,
        "released": "1996-02-27",
        "updated_at": "2024-01-15T10:30:00Z"
    }))];

    let columns = infer_columns(&rows);
    let types: Vec<(&str, ColumnType)> = columns
        .iter()
        .map(|c| (c.id.as_str(), c.data_type))
        .collect();

    assert_eq!(
        types,
        vec![
            ("id", ColumnType::Int),
            ("name", ColumnType::String),
            ("is_default", ColumnType::Bool),
            ("weight_kg", ColumnType::Float),
            ("released", ColumnType::Date),
            ("updated_at", ColumnType::Datetime),
        ]
    );
}

#[test]
fn test_infer_flattened_keys() {
    let rows = vec![row(json!({
        "id": 1,
        "types": [{"slot": 1, "type": {"name": "grass"}}]
    }))];

    let columns = infer_columns(&rows);
    let ids: Vec<&str> = columns.iter().map(|c| c.id.as_str()).collect();

    assert_eq!(ids, vec!["id", "types0Xslot", "types0XtypeXname"]);
}

#[test]
fn test_infer_merges_across_rows() {
    let rows = vec![
        row(json!({"id": 1, "height": 7, "color": null, "mixed": 1})),
        row(json!({"id": 2, "height": 7.5, "color": null, "mixed": "one", "extra": false})),
    ];

    let columns = infer_columns(&rows);
    let schema = TableSchema::new("pokemon", columns);

    assert_eq!(schema.column("height").unwrap().data_type, ColumnType::Float);
    assert_eq!(schema.column("color").unwrap().data_type, ColumnType::String);
    assert_eq!(schema.column("mixed").unwrap().data_type, ColumnType::String);
    assert_eq!(schema.column("extra").unwrap().data_type, ColumnType::Bool);
}

#[test]
fn test_null_then_value_takes_value_type() {
    let rows = vec![row(json!({"base_happiness": null})), row(json!({"base_happiness": 70}))];
    let columns = infer_columns(&rows);
    assert_eq!(columns[0].data_type, ColumnType::Int);
}

#[test]
fn test_incremental_column_marked() {
    let rows = vec![row(json!({"id": 1, "order": 3}))];

    let columns = infer_columns(&rows);
    let schema = TableSchema::new("pokemon", columns);
    assert_eq!(schema.incremental_column().map(|c| c.id.as_str()), Some("id"));

    let none = ColumnInferrer::new()
        .with_incremental_column(None)
        .infer(&rows);
    assert!(none.iter().all(|c| !c.incremental_refresh));
}

#[test]
fn test_string_id_not_incremental() {
    let rows = vec![row(json!({"id": "abc"}))];
    let columns = infer_columns(&rows);
    assert!(!columns[0].incremental_refresh);
}

#[test]
fn test_date_detection_disabled() {
    let rows = vec![row(json!({"released": "1996-02-27"}))];
    let columns = ColumnInferrer::new().with_date_detection(false).infer(&rows);
    assert_eq!(columns[0].data_type, ColumnType::String);
}

#[test]
fn test_type_merge_rules() {
    assert_eq!(ColumnType::Int.merge_with(ColumnType::Float), ColumnType::Float);
    assert_eq!(ColumnType::Date.merge_with(ColumnType::Datetime), ColumnType::Datetime);
    assert_eq!(ColumnType::Bool.merge_with(ColumnType::Int), ColumnType::String);
    assert_eq!(ColumnType::Int.merge_with(ColumnType::Int), ColumnType::Int);
}

#[test]
fn test_schema_serialization() {
    let schema = TableSchema::new(
        "pokemon",
        vec![
            ColumnSchema::new("id", ColumnType::Int).incremental(),
            ColumnSchema::new("name", ColumnType::String),
        ],
    )
    .with_alias("Pokémon");

    let value = serde_json::to_value(&schema).unwrap();
    assert_eq!(
        value,
        json!({
            "id": "pokemon",
            "alias": "Pokémon",
            "columns": [
                {"id": "id", "type": "int", "incremental_refresh": true},
                {"id": "name", "type": "string"}
            ]
        })
    );

    let parsed: TableSchema = serde_json::from_value(value).unwrap();
    assert_eq!(parsed, schema);
}
