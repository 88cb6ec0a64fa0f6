//! Schema module
//!
//! Describes the columns each table hands to the host.
//!
//! # Features
//!
//! - **Static Schemas**: Column lists declared in the connector definition
//! - **Type Inference**: Infers column types from sampled, flattened rows
//! - **Incremental Keys**: Marks the column the host passes back as `last_record`

mod inference;
mod types;

pub use inference::{infer_columns, ColumnInferrer};
pub use types::{ColumnSchema, ColumnType, TableSchema};

#[cfg(test)]
mod tests;
