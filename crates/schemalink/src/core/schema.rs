//! Schema model types: tables, columns, and foreign-key constraints in both
//! directions.
//!
//! A [`SchemaModel`] is built once (one [`TableRecord`] per table), resolved
//! once (inbound constraints attached), and then read-only.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Key classification of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyType {
    /// Not part of any key.
    #[default]
    None,
    /// Part of the primary key.
    Primary,
    /// Part of a non-unique (multi-value) index.
    Multi,
}

impl KeyType {
    /// Classify a catalog key string. `PRI` and `MUL` are recognized,
    /// everything else (including `UNI` and the empty string) is `None`.
    pub fn from_classification(key: &str) -> Self {
        match key {
            "PRI" => KeyType::Primary,
            "MUL" => KeyType::Multi,
            _ => KeyType::None,
        }
    }
}

/// Semantic value type resolved from a vendor type name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueType {
    /// No prefix in the lookup table matched.
    #[default]
    Undefined,
    Int,
    Float,
    String,
    Datetime,
    Bool,
    Bytes,
}

/// Column metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    /// Column name, unique within its table.
    pub name: String,

    /// Key classification.
    pub key_type: KeyType,

    /// Resolved value type.
    pub value_type: ValueType,
}

/// One leg of a possibly composite foreign key.
///
/// For an outbound constraint `table`/`column` is the referencing side. For
/// an inbound (reversed) constraint the roles are swapped, so `table` is the
/// referenced table and `remote_table` the table that declared the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConstraintPart {
    /// Local table name.
    pub table: String,

    /// Local column name.
    pub column: String,

    /// Remote table name.
    pub remote_table: String,

    /// Remote column name.
    pub remote_column: String,
}

impl ConstraintPart {
    /// The same leg seen from the other side.
    pub fn reversed(&self) -> Self {
        Self {
            table: self.remote_table.clone(),
            column: self.remote_column.clone(),
            remote_table: self.table.clone(),
            remote_column: self.column.clone(),
        }
    }
}

/// A named foreign key made of one or more parts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyConstraint {
    /// Constraint name as declared on the referencing table.
    pub name: String,

    /// Ordered parts; more than one for composite keys.
    pub parts: Vec<ConstraintPart>,
}

impl ForeignKeyConstraint {
    /// Create an empty constraint.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parts: Vec::new(),
        }
    }

    /// Remote table of the first part, if any.
    pub fn remote_table(&self) -> Option<&str> {
        self.parts.first().map(|p| p.remote_table.as_str())
    }

    /// Set of (local column, remote column) pairs, ignoring part order.
    pub fn column_pairs(&self) -> BTreeSet<(String, String)> {
        self.parts
            .iter()
            .map(|p| (p.column.clone(), p.remote_column.clone()))
            .collect()
    }
}

/// Everything known about one table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRecord {
    /// Table name.
    pub name: String,

    /// Columns keyed by name.
    pub columns: HashMap<String, Column>,

    /// Distinct tables referenced by this table's foreign keys.
    pub referenced_tables: BTreeSet<String>,

    /// Outbound foreign keys keyed by constraint name.
    pub foreign_keys: HashMap<String, ForeignKeyConstraint>,

    /// Reversed foreign keys declared on other tables that point here.
    /// Empty until the model is resolved.
    pub inbound: Vec<ForeignKeyConstraint>,
}

impl TableRecord {
    /// Create an empty record.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.get(name)
    }

    pub fn constraint(&self, name: &str) -> Option<&ForeignKeyConstraint> {
        self.foreign_keys.get(name)
    }

    /// Primary key column names, sorted.
    pub fn primary_key(&self) -> Vec<String> {
        let mut pk: Vec<String> = self
            .columns
            .values()
            .filter(|c| c.key_type == KeyType::Primary)
            .map(|c| c.name.clone())
            .collect();
        pk.sort();
        pk
    }

    /// Tables whose foreign keys point at this one.
    pub fn referencing_tables(&self) -> BTreeSet<&str> {
        self.inbound
            .iter()
            .flat_map(|c| c.parts.iter().map(|p| p.remote_table.as_str()))
            .collect()
    }
}

/// Counts describing a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelSummary {
    pub tables: usize,
    pub columns: usize,
    pub outbound_constraints: usize,
    pub inbound_constraints: usize,
}

/// All table records of one source schema.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaModel {
    tables: HashMap<String, TableRecord>,
    #[serde(default)]
    resolved: bool,
}

impl SchemaModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, keyed by its name. Returns the record it replaced.
    pub fn insert(&mut self, record: TableRecord) -> Option<TableRecord> {
        self.tables.insert(record.name.clone(), record)
    }

    pub fn get(&self, name: &str) -> Option<&TableRecord> {
        self.tables.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tables.contains_key(name)
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableRecord> {
        self.tables.values()
    }

    /// Table names in sorted order.
    pub fn table_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.tables.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Whether inbound constraints have been attached.
    pub fn is_resolved(&self) -> bool {
        self.resolved
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut TableRecord> {
        self.tables.get_mut(name)
    }

    pub(crate) fn mark_resolved(&mut self) {
        self.resolved = true;
    }

    pub fn summary(&self) -> ModelSummary {
        self.tables.values().fold(
            ModelSummary {
                tables: self.tables.len(),
                ..Default::default()
            },
            |mut acc, t| {
                acc.columns += t.columns.len();
                acc.outbound_constraints += t.foreign_keys.len();
                acc.inbound_constraints += t.inbound.len();
                acc
            },
        )
    }
}
