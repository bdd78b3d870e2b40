//! Schema extractor - builds every table concurrently, then resolves links.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::builder::build_table_with;
use crate::config::ExtractConfig;
use crate::core::schema::SchemaModel;
use crate::core::traits::MetadataSource;
use crate::error::{Result, SchemaError};
use crate::resolver::resolve;
use crate::typemap::TypePrefixTable;

/// Runs the build and resolve phases against one metadata source.
pub struct SchemaExtractor {
    source: Arc<dyn MetadataSource>,
    config: ExtractConfig,
    types: Arc<TypePrefixTable>,
    config_hash: Option<String>,
}

/// Result of an extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// The resolved model.
    pub model: SchemaModel,

    /// Tables built.
    pub tables_total: usize,

    /// Outbound foreign keys across all tables.
    pub constraints_total: usize,

    /// Inbound (reversed) foreign keys across all tables.
    pub inbound_total: usize,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the extraction started.
    pub started_at: DateTime<Utc>,

    /// When the extraction completed.
    pub completed_at: DateTime<Utc>,

    /// Hash of the configuration the run used, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
}

impl ExtractionResult {
    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl SchemaExtractor {
    /// Create an extractor using the built-in MySQL type table.
    pub fn new(source: Arc<dyn MetadataSource>, config: ExtractConfig) -> Self {
        Self {
            source,
            config,
            types: Arc::new(TypePrefixTable::mysql()),
            config_hash: None,
        }
    }

    /// Use a different type lookup table.
    pub fn with_types(mut self, types: TypePrefixTable) -> Self {
        self.types = Arc::new(types);
        self
    }

    /// Record the configuration hash in every result.
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    /// Extract every table the source lists, subject to include/exclude
    /// patterns.
    pub async fn extract(&self) -> Result<ExtractionResult> {
        info!("Phase 1: Listing tables from {} source", self.source.db_type());
        let tables = self.source.list_tables().await?;
        let selected = self.filter_tables(tables)?;
        self.extract_tables(selected).await
    }

    /// Extract exactly the given tables. The set must be closed under
    /// foreign-key references or resolution fails.
    pub async fn extract_tables(&self, tables: Vec<String>) -> Result<ExtractionResult> {
        let started_at = Utc::now();
        let timer = Instant::now();

        let tables: Vec<String> = tables
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        info!("Phase 2: Building {} tables", tables.len());
        let mut model = self.build_all(tables).await?;

        info!("Phase 3: Resolving reverse links");
        resolve(&mut model)?;

        let summary = model.summary();
        let completed_at = Utc::now();
        let result = ExtractionResult {
            model,
            tables_total: summary.tables,
            constraints_total: summary.outbound_constraints,
            inbound_total: summary.inbound_constraints,
            duration_seconds: timer.elapsed().as_secs_f64(),
            started_at,
            completed_at,
            config_hash: self.config_hash.clone(),
        };

        info!(
            "Extraction completed: {} tables, {} foreign keys in {:.1}s",
            result.tables_total, result.constraints_total, result.duration_seconds
        );
        Ok(result)
    }

    /// Build all tables on a bounded pool. Returns only once every build has
    /// finished; the first failure aborts the rest.
    async fn build_all(&self, tables: Vec<String>) -> Result<SchemaModel> {
        let workers = self.config.get_workers().max(1);
        let semaphore = Arc::new(Semaphore::new(workers));
        let mut set = JoinSet::new();

        for name in tables {
            let source = self.source.clone();
            let types = self.types.clone();
            let semaphore = semaphore.clone();
            set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| SchemaError::Join(e.to_string()))?;
                build_table_with(&name, source.as_ref(), &types).await
            });
        }

        let mut model = SchemaModel::new();
        while let Some(joined) = set.join_next().await {
            let record = joined.map_err(|e| SchemaError::Join(e.to_string()))??;
            debug!("Collected table {}", record.name);
            model.insert(record);
        }
        Ok(model)
    }

    /// Apply include/exclude glob patterns. Returns the selected names sorted.
    pub fn filter_tables(&self, tables: Vec<String>) -> Result<Vec<String>> {
        let include = compile_patterns(&self.config.include_tables)?;
        let exclude = compile_patterns(&self.config.exclude_tables)?;

        let mut selected: Vec<String> = tables
            .into_iter()
            .filter(|t| include.is_empty() || include.iter().any(|p| p.matches(t)))
            .filter(|t| !exclude.iter().any(|p| p.matches(t)))
            .collect();
        selected.sort();
        selected.dedup();
        Ok(selected)
    }
}

fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p)
                .map_err(|e| SchemaError::Config(format!("invalid table pattern '{}': {}", p, e)))
        })
        .collect()
}
