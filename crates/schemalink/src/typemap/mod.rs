//! Vendor type name to semantic value type lookup.

use crate::core::schema::ValueType;

/// Built-in MySQL prefixes. Order only matters for prefixes of equal length.
const MYSQL_PREFIXES: &[(&str, ValueType)] = &[
    // Integer types
    ("int", ValueType::Int),
    ("tinyint", ValueType::Int),
    ("smallint", ValueType::Int),
    ("mediumint", ValueType::Int),
    ("bigint", ValueType::Int),
    // Floating point and fixed point
    ("float", ValueType::Float),
    ("double", ValueType::Float),
    ("decimal", ValueType::Float),
    ("numeric", ValueType::Float),
    ("real", ValueType::Float),
    // String types
    ("varchar", ValueType::String),
    ("char", ValueType::String),
    ("text", ValueType::String),
    ("tinytext", ValueType::String),
    ("mediumtext", ValueType::String),
    ("longtext", ValueType::String),
    ("enum", ValueType::String),
    ("set", ValueType::String),
    ("json", ValueType::String),
    // Date/time types
    ("date", ValueType::Datetime),
    ("time", ValueType::Datetime),
    ("datetime", ValueType::Datetime),
    ("timestamp", ValueType::Datetime),
    ("year", ValueType::Datetime),
    // Boolean
    ("bool", ValueType::Bool),
    ("boolean", ValueType::Bool),
    ("bit", ValueType::Bool),
    // Binary types
    ("blob", ValueType::Bytes),
    ("binary", ValueType::Bytes),
    ("varbinary", ValueType::Bytes),
];

/// Ordered `(prefix, type)` entries resolved by longest matching prefix.
///
/// When two matching prefixes have the same length the one listed first
/// wins. Unmatched names resolve to [`ValueType::Undefined`].
#[derive(Debug, Clone)]
pub struct TypePrefixTable {
    entries: Vec<(String, ValueType)>,
}

impl TypePrefixTable {
    /// Build a table from entries in lookup order.
    pub fn new<I, S>(entries: I) -> Self
    where
        I: IntoIterator<Item = (S, ValueType)>,
        S: Into<String>,
    {
        Self {
            entries: entries
                .into_iter()
                .map(|(prefix, ty)| (prefix.into().to_lowercase(), ty))
                .collect(),
        }
    }

    /// The built-in MySQL table.
    pub fn mysql() -> Self {
        Self::new(MYSQL_PREFIXES.iter().copied())
    }

    /// Resolve a vendor type string such as `varchar(50)` or `INT(11) UNSIGNED`.
    pub fn resolve(&self, data_type: &str) -> ValueType {
        let data_type = data_type.trim().to_lowercase();
        let mut best: Option<(usize, ValueType)> = None;
        for (prefix, ty) in &self.entries {
            if !data_type.starts_with(prefix.as_str()) {
                continue;
            }
            match best {
                Some((len, _)) if len >= prefix.len() => {}
                _ => best = Some((prefix.len(), *ty)),
            }
        }
        best.map(|(_, ty)| ty).unwrap_or_default()
    }
}

impl Default for TypePrefixTable {
    fn default() -> Self {
        Self::mysql()
    }
}
