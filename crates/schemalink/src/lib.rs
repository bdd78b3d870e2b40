//! # schemalink
//!
//! Relational schema extraction with bidirectional foreign-key links.
//!
//! The library reads column and foreign-key metadata for every table of a
//! source database and builds a [`SchemaModel`] in which each table knows
//! both the tables it references and, after resolution, the constraints on
//! other tables that reference it:
//!
//! - **Builder**: one catalog round trip per table, safe to run concurrently
//! - **Resolver**: a single pass that attaches reversed constraints
//! - **Extractor**: lists, filters, builds in parallel, then resolves
//! - **MySQL source** reading `INFORMATION_SCHEMA` through SQLx
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use schemalink::{ColumnRow, ExtractConfig, ForeignKeyUsageRow, MemorySource, SchemaExtractor};
//!
//! # #[tokio::main]
//! # async fn main() -> schemalink::Result<()> {
//! let source = MemorySource::new()
//!     .with_table("student", vec![ColumnRow::new("id", "int", "PRI")], vec![])
//!     .with_table(
//!         "registration",
//!         vec![ColumnRow::new("student_id", "int", "MUL")],
//!         vec![ForeignKeyUsageRow::new("student_id", "fk1", "student", "id")],
//!     );
//!
//! let result = SchemaExtractor::new(Arc::new(source), ExtractConfig::default())
//!     .extract()
//!     .await?;
//! let student = result.model.get("student").unwrap();
//! assert_eq!(student.inbound[0].parts[0].remote_table, "registration");
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod extractor;
pub mod resolver;
pub mod typemap;

// Re-exports for convenient access
pub use builder::{build_table, build_table_with};
pub use config::{Config, ExtractConfig, SourceConfig};
pub use crate::core::{
    Column, ColumnRow, ConstraintPart, ForeignKeyConstraint, ForeignKeyUsageRow, KeyType,
    MetadataSource, ModelSummary, SchemaModel, TableRecord, ValueType,
};
pub use drivers::{MemorySource, MysqlSource};
pub use error::{MetadataQuery, Result, SchemaError};
pub use extractor::{ExtractionResult, SchemaExtractor};
pub use resolver::{resolve, reverse_constraint};
pub use typemap::TypePrefixTable;
