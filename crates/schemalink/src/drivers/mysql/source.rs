//! MySQL/MariaDB metadata source.
//!
//! Reads `INFORMATION_SCHEMA` through an SQLx connection pool. All queries
//! are scoped to the configured database and use bound parameters.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow, MySqlSslMode};
use sqlx::Row;
use tracing::{debug, info};

use crate::config::SourceConfig;
use crate::core::traits::{ColumnRow, ForeignKeyUsageRow, MetadataSource};
use crate::error::{MetadataQuery, Result, SchemaError};

/// Connection pool timeout.
const POOL_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);

// CAST to CHAR: information_schema may return VARBINARY depending on collation
const LIST_TABLES_QUERY: &str = r#"
    SELECT CAST(TABLE_NAME AS CHAR(255)) AS TABLE_NAME
    FROM INFORMATION_SCHEMA.TABLES
    WHERE TABLE_SCHEMA = ? AND TABLE_TYPE = 'BASE TABLE'
    ORDER BY TABLE_NAME
"#;

const COLUMNS_QUERY: &str = r#"
    SELECT
        CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
        CAST(DATA_TYPE AS CHAR(255)) AS DATA_TYPE,
        CAST(COLUMN_KEY AS CHAR(3)) AS COLUMN_KEY
    FROM INFORMATION_SCHEMA.COLUMNS
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
    ORDER BY ORDINAL_POSITION
"#;

// Cross-schema references are left out so the model stays closed over one schema
const FOREIGN_KEY_USAGE_QUERY: &str = r#"
    SELECT
        CAST(COLUMN_NAME AS CHAR(255)) AS COLUMN_NAME,
        CAST(CONSTRAINT_NAME AS CHAR(255)) AS CONSTRAINT_NAME,
        CAST(REFERENCED_TABLE_NAME AS CHAR(255)) AS REFERENCED_TABLE_NAME,
        CAST(REFERENCED_COLUMN_NAME AS CHAR(255)) AS REFERENCED_COLUMN_NAME
    FROM INFORMATION_SCHEMA.KEY_COLUMN_USAGE
    WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?
        AND REFERENCED_TABLE_NAME IS NOT NULL
        AND REFERENCED_TABLE_SCHEMA = TABLE_SCHEMA
    ORDER BY CONSTRAINT_NAME, ORDINAL_POSITION
"#;

/// MySQL/MariaDB metadata source.
pub struct MysqlSource {
    pool: MySqlPool,
    database: String,
}

impl MysqlSource {
    /// Connect using the source configuration.
    pub async fn new(config: &SourceConfig, max_conns: usize) -> Result<Self> {
        let ssl_mode = parse_ssl_mode(&config.ssl_mode)?;

        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(ssl_mode);

        let pool = MySqlPoolOptions::new()
            .max_connections(max_conns.max(1) as u32)
            .acquire_timeout(POOL_CONNECTION_TIMEOUT)
            .connect_with(options)
            .await
            .map_err(|e| SchemaError::pool(e, "creating MySQL source pool"))?;

        info!(
            "Connected to MySQL source: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self {
            pool,
            database: config.database.clone(),
        })
    }

    /// Run a trivial query to check the connection.
    pub async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| SchemaError::pool(e, "testing MySQL source connection"))?;
        Ok(())
    }

    async fn fetch_table_rows(
        &self,
        sql: &str,
        table: &str,
        query: MetadataQuery,
    ) -> Result<Vec<MySqlRow>> {
        sqlx::query(sql)
            .bind(&self.database)
            .bind(table)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SchemaError::metadata(table, query, e))
    }
}

fn parse_ssl_mode(mode: &str) -> Result<MySqlSslMode> {
    match mode.to_lowercase().as_str() {
        "disabled" | "disable" => Ok(MySqlSslMode::Disabled),
        "preferred" | "prefer" => Ok(MySqlSslMode::Preferred),
        "required" | "require" => Ok(MySqlSslMode::Required),
        "verify_ca" | "verify-ca" => Ok(MySqlSslMode::VerifyCa),
        "verify_identity" | "verify-full" => Ok(MySqlSslMode::VerifyIdentity),
        other => Err(SchemaError::Config(format!(
            "source.ssl_mode '{}' is not a MySQL SSL mode",
            other
        ))),
    }
}

/// Decode a string column, treating SQL NULL as an empty string.
fn get_string(row: &MySqlRow, name: &str, table: &str, query: MetadataQuery) -> Result<String> {
    row.try_get::<Option<String>, _>(name)
        .map(Option::unwrap_or_default)
        .map_err(|e| SchemaError::metadata(table, query, format!("decoding {}: {}", name, e)))
}

#[async_trait]
impl MetadataSource for MysqlSource {
    async fn list_tables(&self) -> Result<Vec<String>> {
        let rows: Vec<MySqlRow> = sqlx::query(LIST_TABLES_QUERY)
            .bind(&self.database)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| SchemaError::pool(e, "listing MySQL tables"))?;

        let mut tables = Vec::with_capacity(rows.len());
        for row in rows {
            let name: String = row
                .try_get("TABLE_NAME")
                .map_err(|e| SchemaError::pool(e, "decoding MySQL table list"))?;
            tables.push(name);
        }

        info!(
            "Found {} tables in MySQL schema '{}'",
            tables.len(),
            self.database
        );
        Ok(tables)
    }

    async fn describe_columns(&self, table: &str) -> Result<Vec<ColumnRow>> {
        let query = MetadataQuery::Columns;
        let rows = self.fetch_table_rows(COLUMNS_QUERY, table, query).await?;

        let columns = rows
            .iter()
            .map(|row| {
                Ok(ColumnRow {
                    name: get_string(row, "COLUMN_NAME", table, query)?,
                    data_type: get_string(row, "DATA_TYPE", table, query)?,
                    key: get_string(row, "COLUMN_KEY", table, query)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Loaded {} columns for {}", columns.len(), table);
        Ok(columns)
    }

    async fn describe_foreign_keys(&self, table: &str) -> Result<Vec<ForeignKeyUsageRow>> {
        let query = MetadataQuery::ForeignKeyUsage;
        let rows = self
            .fetch_table_rows(FOREIGN_KEY_USAGE_QUERY, table, query)
            .await?;

        let usage = rows
            .iter()
            .map(|row| {
                Ok(ForeignKeyUsageRow {
                    column: get_string(row, "COLUMN_NAME", table, query)?,
                    constraint: get_string(row, "CONSTRAINT_NAME", table, query)?,
                    remote_table: get_string(row, "REFERENCED_TABLE_NAME", table, query)?,
                    remote_column: get_string(row, "REFERENCED_COLUMN_NAME", table, query)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Loaded {} foreign key usage rows for {}", usage.len(), table);
        Ok(usage)
    }

    fn db_type(&self) -> &str {
        "mysql"
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}
