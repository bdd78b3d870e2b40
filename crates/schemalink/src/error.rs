//! Error types for schema extraction and link resolution.

use std::fmt;

use thiserror::Error;

/// Exit code for configuration errors.
pub const EXIT_CONFIG_ERROR: u8 = 1;
/// Exit code for a failed metadata query.
pub const EXIT_METADATA_ERROR: u8 = 2;
/// Exit code for a malformed foreign-key constraint.
pub const EXIT_CONSISTENCY_ERROR: u8 = 3;
/// Exit code for a reference to a table missing from the model.
pub const EXIT_UNRESOLVED_ERROR: u8 = 4;
/// Exit code for connection pool failures.
pub const EXIT_POOL_ERROR: u8 = 5;
/// Exit code for a table missing from the extracted model.
pub const EXIT_NOT_FOUND: u8 = 6;
/// Exit code for file system errors.
pub const EXIT_IO_ERROR: u8 = 7;
/// Exit code for any other failure.
pub const EXIT_GENERAL_ERROR: u8 = 8;

/// The two catalog queries issued per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataQuery {
    /// Column list with type and key classification.
    Columns,
    /// Foreign-key usage rows.
    ForeignKeyUsage,
}

impl fmt::Display for MetadataQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataQuery::Columns => write!(f, "describe columns"),
            MetadataQuery::ForeignKeyUsage => write!(f, "describe foreign key usage"),
        }
    }
}

/// Main error type for schema operations.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Configuration error (invalid YAML, missing fields, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A catalog query failed to execute or one of its rows failed to decode.
    #[error("Metadata query '{query}' failed for table {table}: {message}")]
    MetadataQuery {
        table: String,
        query: MetadataQuery,
        message: String,
    },

    /// A single foreign-key constraint references more than one remote table.
    #[error(
        "Constraint {constraint} on table {table} references both {expected} and {found}"
    )]
    ConstraintConsistency {
        table: String,
        constraint: String,
        expected: String,
        found: String,
    },

    /// A foreign-key constraint has no parts.
    #[error("Constraint {constraint} on table {table} has no columns")]
    EmptyConstraint { table: String, constraint: String },

    /// A foreign-key constraint references a table that is not in the model.
    #[error("Constraint {constraint} on table {table} references unknown table {remote_table}")]
    UnresolvedReference {
        table: String,
        constraint: String,
        remote_table: String,
    },

    /// A requested table is not part of the extracted model.
    #[error("Table {0} not found in source schema")]
    TableNotFound(String),

    /// Connection pool error with context
    #[error("Pool error: {message}\n  Context: {context}")]
    Pool { message: String, context: String },

    /// A table build task panicked or was aborted.
    #[error("Build task failed: {0}")]
    Join(String),

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SchemaError {
    /// Create a Pool error with context about where it occurred
    pub fn pool(message: impl fmt::Display, context: impl Into<String>) -> Self {
        SchemaError::Pool {
            message: message.to_string(),
            context: context.into(),
        }
    }

    /// Create a MetadataQuery error for the given table and query.
    pub fn metadata(
        table: impl Into<String>,
        query: MetadataQuery,
        message: impl fmt::Display,
    ) -> Self {
        SchemaError::MetadataQuery {
            table: table.into(),
            query,
            message: message.to_string(),
        }
    }

    /// Whether this error signals corrupt schema metadata rather than an
    /// operational failure. Fatal errors must never be retried or skipped.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SchemaError::ConstraintConsistency { .. }
                | SchemaError::EmptyConstraint { .. }
                | SchemaError::UnresolvedReference { .. }
        )
    }

    /// Process exit code for the CLI.
    pub fn exit_code(&self) -> u8 {
        match self {
            SchemaError::Config(_) | SchemaError::Yaml(_) => EXIT_CONFIG_ERROR,
            SchemaError::MetadataQuery { .. } => EXIT_METADATA_ERROR,
            SchemaError::ConstraintConsistency { .. } | SchemaError::EmptyConstraint { .. } => {
                EXIT_CONSISTENCY_ERROR
            }
            SchemaError::UnresolvedReference { .. } => EXIT_UNRESOLVED_ERROR,
            SchemaError::TableNotFound(_) => EXIT_NOT_FOUND,
            SchemaError::Pool { .. } => EXIT_POOL_ERROR,
            SchemaError::Io(_) => EXIT_IO_ERROR,
            SchemaError::Join(_) | SchemaError::Json(_) => EXIT_GENERAL_ERROR,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
