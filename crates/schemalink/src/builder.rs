//! Per-table model builder.
//!
//! Turns the two catalog descriptions of one table into a [`TableRecord`].
//! Builds for different tables share nothing and may run concurrently.

use tracing::debug;

use crate::core::schema::{Column, ConstraintPart, ForeignKeyConstraint, KeyType, TableRecord};
use crate::core::traits::{ColumnRow, ForeignKeyUsageRow, MetadataSource};
use crate::error::{MetadataQuery, Result, SchemaError};
use crate::typemap::TypePrefixTable;

/// Build a table record using the built-in MySQL type table.
pub async fn build_table(table: &str, source: &dyn MetadataSource) -> Result<TableRecord> {
    build_table_with(table, source, &TypePrefixTable::mysql()).await
}

/// Build a table record, resolving column types against `types`.
///
/// Fails with [`SchemaError::MetadataQuery`] if either query fails. Nothing
/// is returned for a table whose description is incomplete.
pub async fn build_table_with(
    table: &str,
    source: &dyn MetadataSource,
    types: &TypePrefixTable,
) -> Result<TableRecord> {
    if table.trim().is_empty() {
        return Err(SchemaError::metadata(
            table,
            MetadataQuery::Columns,
            "table name is empty",
        ));
    }

    let columns = source.describe_columns(table).await?;
    let usage = source.describe_foreign_keys(table).await?;

    let record = assemble(table, &columns, &usage, types);
    debug!(
        "Built {}: {} columns, {} foreign keys",
        table,
        record.columns.len(),
        record.foreign_keys.len()
    );
    Ok(record)
}

/// Assemble a record from already fetched rows.
pub fn assemble(
    table: &str,
    columns: &[ColumnRow],
    usage: &[ForeignKeyUsageRow],
    types: &TypePrefixTable,
) -> TableRecord {
    let mut record = TableRecord::new(table);

    for row in columns {
        // Duplicate names are not expected; the last row wins.
        record.columns.insert(
            row.name.clone(),
            Column {
                name: row.name.clone(),
                key_type: KeyType::from_classification(&row.key),
                value_type: types.resolve(&row.data_type),
            },
        );
    }

    for row in usage {
        record.referenced_tables.insert(row.remote_table.clone());
        record
            .foreign_keys
            .entry(row.constraint.clone())
            .or_insert_with(|| ForeignKeyConstraint::new(row.constraint.clone()))
            .parts
            .push(ConstraintPart {
                table: table.to_string(),
                column: row.column.clone(),
                remote_table: row.remote_table.clone(),
                remote_column: row.remote_column.clone(),
            });
    }

    record
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::schema::ValueType;
    use crate::drivers::MemorySource;
    use std::collections::BTreeSet;

    fn registration_source() -> MemorySource {
        MemorySource::new().with_table(
            "registration",
            vec![
                ColumnRow::new("id", "int", "PRI"),
                ColumnRow::new("student_id", "int", "MUL"),
                ColumnRow::new("course_id", "int", "MUL"),
                ColumnRow::new("note", "varchar(200)", ""),
            ],
            vec![
                ForeignKeyUsageRow::new("student_id", "fk1", "student", "id"),
                ForeignKeyUsageRow::new("course_id", "fk2", "course", "id"),
            ],
        )
    }

    #[tokio::test]
    async fn test_build_classifies_columns() {
        let source = MemorySource::new().with_table(
            "person",
            vec![
                ColumnRow::new("ssn", "varchar(50)", "PRI"),
                ColumnRow::new("age", "int(11)", ""),
                ColumnRow::new("shape", "unknown_type", "UNI"),
            ],
            vec![],
        );

        let record = build_table("person", &source).await.unwrap();
        assert_eq!(record.name, "person");
        assert_eq!(
            record.column("ssn"),
            Some(&Column {
                name: "ssn".to_string(),
                key_type: KeyType::Primary,
                value_type: ValueType::String,
            })
        );
        assert_eq!(record.column("age").unwrap().value_type, ValueType::Int);
        assert_eq!(record.column("shape").unwrap().key_type, KeyType::None);
        assert_eq!(record.column("shape").unwrap().value_type, ValueType::Undefined);
        assert!(record.foreign_keys.is_empty());
        assert!(record.inbound.is_empty());
    }

    #[tokio::test]
    async fn test_referenced_tables_accumulate() {
        let record = build_table("registration", &registration_source())
            .await
            .unwrap();

        let expected: BTreeSet<String> = ["student", "course"].iter().map(|s| s.to_string()).collect();
        assert_eq!(record.referenced_tables, expected);
        assert_eq!(record.foreign_keys.len(), 2);

        let fk1 = record.constraint("fk1").unwrap();
        assert_eq!(
            fk1.parts,
            vec![ConstraintPart {
                table: "registration".to_string(),
                column: "student_id".to_string(),
                remote_table: "student".to_string(),
                remote_column: "id".to_string(),
            }]
        );
        assert!(record.inbound.is_empty());
    }

    #[tokio::test]
    async fn test_composite_constraint_groups_parts_in_order() {
        let source = MemorySource::new().with_table(
            "grade",
            vec![
                ColumnRow::new("course_id", "int", "MUL"),
                ColumnRow::new("term", "varchar(10)", "MUL"),
            ],
            vec![
                ForeignKeyUsageRow::new("course_id", "fk_offering", "offering", "course_id"),
                ForeignKeyUsageRow::new("term", "fk_offering", "offering", "term"),
            ],
        );

        let record = build_table("grade", &source).await.unwrap();
        let fk = record.constraint("fk_offering").unwrap();
        let columns: Vec<&str> = fk.parts.iter().map(|p| p.column.as_str()).collect();
        assert_eq!(columns, vec!["course_id", "term"]);
        assert_eq!(record.referenced_tables.len(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_column_last_wins() {
        let source = MemorySource::new().with_table(
            "dup",
            vec![
                ColumnRow::new("a", "int", "PRI"),
                ColumnRow::new("a", "text", ""),
            ],
            vec![],
        );
        let record = build_table("dup", &source).await.unwrap();
        assert_eq!(record.columns.len(), 1);
        assert_eq!(record.column("a").unwrap().value_type, ValueType::String);
        assert_eq!(record.column("a").unwrap().key_type, KeyType::None);
    }

    #[tokio::test]
    async fn test_columns_query_failure() {
        let source = registration_source().fail_on("registration", MetadataQuery::Columns);
        let err = build_table("registration", &source).await.unwrap_err();
        match err {
            SchemaError::MetadataQuery { table, query, .. } => {
                assert_eq!(table, "registration");
                assert_eq!(query, MetadataQuery::Columns);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_foreign_key_query_failure_returns_no_record() {
        let source =
            registration_source().fail_on("registration", MetadataQuery::ForeignKeyUsage);
        let result = build_table("registration", &source).await;
        assert!(matches!(
            result,
            Err(SchemaError::MetadataQuery {
                query: MetadataQuery::ForeignKeyUsage,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_empty_table_name_rejected() {
        let source = MemorySource::new();
        assert!(build_table("  ", &source).await.is_err());
    }

    #[test]
    fn test_assemble_with_custom_types() {
        let types = TypePrefixTable::new([("varchar", ValueType::String), ("int", ValueType::Int)]);
        let record = assemble(
            "t",
            &[ColumnRow::new("c", "datetime", "")],
            &[],
            &types,
        );
        assert_eq!(record.column("c").unwrap().value_type, ValueType::Undefined);
    }
}
