//! Core abstractions shared by the builder, the resolver and the drivers.
//!
//! - [`schema`]: table, column and constraint model
//! - [`traits`]: the metadata source trait and its row types

pub mod schema;
pub mod traits;

pub use schema::{
    Column, ConstraintPart, ForeignKeyConstraint, KeyType, ModelSummary, SchemaModel,
    TableRecord, ValueType,
};
pub use traits::{ColumnRow, ForeignKeyUsageRow, MetadataSource};
