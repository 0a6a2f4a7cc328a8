use std::collections::HashSet;
use std::path::Path;

use crate::config::schema::HarvestConfig;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../../../schema/harvest-config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<HarvestConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<HarvestConfig, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: HarvestConfig = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

/// Semantic checks the schema cannot express. Also applies to configs built
/// in code rather than loaded from a file.
pub fn validate_config(config: &HarvestConfig) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.ingest.batch_size == 0 {
        return Err(ConfigError::Validation {
            message: "ingest.batchSize must be greater than 0".to_string(),
        });
    }

    if !config.imap.category_query.contains("{category}") {
        return Err(ConfigError::Validation {
            message: format!(
                "imap.categoryQuery must contain '{{category}}': {}",
                config.imap.category_query
            ),
        });
    }

    if config.categories.is_empty() {
        return Err(ConfigError::InvalidCategories {
            reason: "at least one category is required".to_string(),
        });
    }

    let mut seen = HashSet::new();
    for spec in &config.categories {
        if !seen.insert(spec.category) {
            return Err(ConfigError::InvalidCategories {
                reason: format!("duplicate category '{}'", spec.category),
            });
        }
        if spec.label > 1 {
            return Err(ConfigError::InvalidCategories {
                reason: format!(
                    "label for '{}' must be 0 or 1, got {}",
                    spec.category, spec.label
                ),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Category, CategorySpec, ProcessingOrder};
    use std::path::PathBuf;

    #[test]
    fn test_load_minimal_config_uses_defaults() {
        let config = load_config_from_str(r#"{ "version": "1.0" }"#).unwrap();

        assert_eq!(config.imap.host, "imap.gmail.com");
        assert_eq!(config.imap.port, 993);
        assert_eq!(config.imap.folder, "INBOX");
        assert_eq!(
            config.dataset.output_path,
            PathBuf::from("full_email_dataset.csv")
        );
        assert_eq!(config.ingest.batch_size, 50);
        assert_eq!(config.categories.len(), 4);
        assert_eq!(config.categories[2], CategorySpec::new(Category::Promotions, 1));
    }

    #[test]
    fn test_load_full_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "imap": {
                "host": "imap.example.com",
                "port": 1993,
                "username": "me@example.com",
                "passwordFile": "~/.config/mailharvest/pass",
                "passwordEnvVar": null,
                "folder": "[Gmail]/All Mail"
            },
            "dataset": {
                "outputPath": "/data/emails.csv",
                "checkpointPath": "/data/uids.txt"
            },
            "ingest": {
                "batchSize": 10,
                "fetchDelayMs": 0,
                "retryBackoffSecs": 2,
                "minBodyLength": 15,
                "maxConnectAttempts": 5,
                "processingOrder": "oldestFirst",
                "operationTimeoutSecs": 30
            },
            "categories": [
                { "category": "primary", "label": 0 },
                { "category": "social", "label": 1 }
            ]
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.imap.host, "imap.example.com");
        assert_eq!(config.imap.port, 1993);
        assert_eq!(
            config.imap.password_file.as_deref(),
            Some("~/.config/mailharvest/pass")
        );
        assert_eq!(config.imap.password_env_var, None);
        assert_eq!(config.dataset.checkpoint_path, PathBuf::from("/data/uids.txt"));
        assert_eq!(config.ingest.batch_size, 10);
        assert_eq!(config.ingest.max_connect_attempts, Some(5));
        assert_eq!(config.ingest.processing_order, ProcessingOrder::OldestFirst);
        assert_eq!(config.categories.len(), 2);
    }

    #[test]
    fn test_invalid_version() {
        let err = load_config_from_str(r#"{ "version": "2.0" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::SchemaValidation { .. }));
    }

    #[test]
    fn test_unknown_category_rejected_by_schema() {
        let config_json = r#"{
            "version": "1.0",
            "categories": [{ "category": "forums", "label": 0 }]
        }"#;
        let err = load_config_from_str(config_json).unwrap_err();
        assert!(matches!(err, ConfigError::SchemaValidation { .. }));
    }

    #[test]
    fn test_zero_batch_size_rejected() {
        let config_json = r#"{ "version": "1.0", "ingest": { "batchSize": 0 } }"#;
        assert!(load_config_from_str(config_json).is_err());

        let mut config = HarvestConfig::default();
        config.ingest.batch_size = 0;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn test_duplicate_category_rejected() {
        let config_json = r#"{
            "version": "1.0",
            "categories": [
                { "category": "primary", "label": 0 },
                { "category": "primary", "label": 1 }
            ]
        }"#;
        let err = load_config_from_str(config_json).unwrap_err();
        assert!(err.to_string().contains("duplicate category 'primary'"));
    }

    #[test]
    fn test_query_without_placeholder_rejected() {
        let config_json = r#"{
            "version": "1.0",
            "imap": { "categoryQuery": "ALL" }
        }"#;
        let err = load_config_from_str(config_json).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_out_of_range_label_rejected_in_code() {
        let mut config = HarvestConfig::default();
        config.categories[0].label = 2;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidCategories { .. })
        ));
    }

    #[test]
    fn test_malformed_json() {
        let err = load_config_from_str("{ not json").unwrap_err();
        assert!(matches!(err, ConfigError::ParseJson(_)));
    }

    #[test]
    fn test_missing_file() {
        let err = load_config("/nonexistent/mailharvest.json").unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
