//! Configuration validation.

use super::Config;
use crate::error::{Result, SchemaError};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    if config.source.host.is_empty() {
        return Err(SchemaError::Config("source.host is required".into()));
    }
    if config.source.database.is_empty() {
        return Err(SchemaError::Config("source.database is required".into()));
    }
    if config.source.user.is_empty() {
        return Err(SchemaError::Config("source.user is required".into()));
    }
    if config.source.r#type != "mysql" {
        return Err(SchemaError::Config(format!(
            "source.type must be 'mysql', got '{}'",
            config.source.r#type
        )));
    }

    // Extract config validation - only check if explicitly set
    if let Some(0) = config.extract.workers {
        return Err(SchemaError::Config(
            "extract.workers must be at least 1".into(),
        ));
    }
    if let Some(0) = config.extract.max_connections {
        return Err(SchemaError::Config(
            "extract.max_connections must be at least 1".into(),
        ));
    }

    for (field, patterns) in [
        ("extract.include_tables", &config.extract.include_tables),
        ("extract.exclude_tables", &config.extract.exclude_tables),
    ] {
        for pattern in patterns {
            if let Err(e) = glob::Pattern::new(pattern) {
                return Err(SchemaError::Config(format!(
                    "{} has invalid pattern '{}': {}",
                    field, pattern, e
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ExtractConfig, SourceConfig};

    fn valid_config() -> Config {
        Config {
            source: SourceConfig {
                r#type: "mysql".to_string(),
                host: "localhost".to_string(),
                port: 3306,
                database: "school".to_string(),
                user: "reader".to_string(),
                password: "password".to_string(),
                ssl_mode: "disabled".to_string(),
            },
            extract: ExtractConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = valid_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_source_host() {
        let mut config = valid_config();
        config.source.host = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_missing_database() {
        let mut config = valid_config();
        config.source.database = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_wrong_source_type() {
        let mut config = valid_config();
        config.source.r#type = "postgres".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_workers() {
        let mut config = valid_config();
        config.extract.workers = Some(0);
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_invalid_glob_pattern() {
        let mut config = valid_config();
        config.extract.exclude_tables = vec!["tmp_[".to_string()];
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("extract.exclude_tables"));
    }

    #[test]
    fn test_source_config_debug_redacts_password() {
        let mut config = valid_config();
        config.source.password = "super_secret_password_123".to_string();
        let debug_output = format!("{:?}", config.source);
        assert!(
            debug_output.contains("[REDACTED]"),
            "Debug output should contain [REDACTED]"
        );
        assert!(
            !debug_output.contains("super_secret_password_123"),
            "Debug output should not contain actual password value"
        );
    }
}
