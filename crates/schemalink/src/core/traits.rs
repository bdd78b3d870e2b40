//! The metadata source abstraction and the catalog rows it returns.
//!
//! - [`MetadataSource`]: answers the per-table catalog queries
//! - [`ColumnRow`]: one row of the column description
//! - [`ForeignKeyUsageRow`]: one row of the foreign-key usage description
//!
//! Drivers (`drivers/mysql`, `drivers/memory`) implement the trait; the
//! builder only sees the logical row shapes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One column as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnRow {
    /// Column name.
    pub name: String,
    /// Vendor type string, e.g. `varchar(50)` or `int`.
    pub data_type: String,
    /// Key classification string, e.g. `PRI`, `MUL` or empty.
    pub key: String,
}

impl ColumnRow {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            key: key.into(),
        }
    }
}

/// One foreign-key usage row. Only rows with a referenced table are
/// returned, so plain index usage never shows up here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyUsageRow {
    /// Referencing (local) column.
    pub column: String,
    /// Constraint the column belongs to.
    pub constraint: String,
    /// Referenced table.
    pub remote_table: String,
    /// Referenced column.
    pub remote_column: String,
}

impl ForeignKeyUsageRow {
    pub fn new(
        column: impl Into<String>,
        constraint: impl Into<String>,
        remote_table: impl Into<String>,
        remote_column: impl Into<String>,
    ) -> Self {
        Self {
            column: column.into(),
            constraint: constraint.into(),
            remote_table: remote_table.into(),
            remote_column: remote_column.into(),
        }
    }
}

/// Read-only access to a source database catalog.
///
/// Implementations own connection handling, timeouts and retries. Every
/// failure, including a row that cannot be decoded, is reported as
/// [`SchemaError::MetadataQuery`](crate::error::SchemaError::MetadataQuery)
/// for the table being described.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// List the base tables of the source schema.
    async fn list_tables(&self) -> Result<Vec<String>>;

    /// Describe the columns of a table.
    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnRow>>;

    /// Describe the foreign-key usage of a table.
    async fn describe_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyUsageRow>>;

    /// Get the database type identifier (e.g., "mysql").
    fn db_type(&self) -> &str;

    /// Release any held connections.
    async fn close(&self) {}
}
