//! In-memory metadata source.
//!
//! Serves fixed catalog rows without a database. Used by tests and
//! documentation examples.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

use crate::core::traits::{ColumnRow, ForeignKeyUsageRow, MetadataSource};
use crate::error::{MetadataQuery, Result, SchemaError};

#[derive(Debug, Clone, Default)]
struct TableRows {
    columns: Vec<ColumnRow>,
    foreign_keys: Vec<ForeignKeyUsageRow>,
}

/// Metadata source backed by in-memory rows.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: BTreeMap<String, TableRows>,
    failures: HashMap<String, MetadataQuery>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table with its column and foreign-key usage rows.
    pub fn with_table(
        mut self,
        name: impl Into<String>,
        columns: Vec<ColumnRow>,
        foreign_keys: Vec<ForeignKeyUsageRow>,
    ) -> Self {
        self.tables.insert(
            name.into(),
            TableRows {
                columns,
                foreign_keys,
            },
        );
        self
    }

    /// Make the given query fail for a table.
    pub fn fail_on(mut self, table: impl Into<String>, query: MetadataQuery) -> Self {
        self.failures.insert(table.into(), query);
        self
    }

    fn check_failure(&self, table: &str, query: MetadataQuery) -> Result<()> {
        match self.failures.get(table) {
            Some(q) if *q == query => Err(SchemaError::metadata(
                table,
                query,
                "injected failure",
            )),
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl MetadataSource for MemorySource {
    async fn list_tables(&self) -> Result<Vec<String>> {
        Ok(self.tables.keys().cloned().collect())
    }

    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnRow>> {
        self.check_failure(table, MetadataQuery::Columns)?;
        Ok(self
            .tables
            .get(table)
            .map(|t| t.columns.clone())
            .unwrap_or_default())
    }

    async fn describe_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyUsageRow>> {
        self.check_failure(table, MetadataQuery::ForeignKeyUsage)?;
        Ok(self
            .tables
            .get(table)
            .map(|t| t.foreign_keys.clone())
            .unwrap_or_default())
    }

    fn db_type(&self) -> &str {
        "memory"
    }
}
