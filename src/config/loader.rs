//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::AiConfig;

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Load raw configuration from a TOML file.
///
/// Semantic validation is separate (`validate_config`) because it never fails.
pub fn load_config(path: &Path) -> Result<AiConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    tracing::info!(path = ?path, providers = config.providers.len(), "AI configuration loaded");
    Ok(config)
}

/// Parse raw configuration from TOML text.
pub fn parse_config(content: &str) -> Result<AiConfig, ConfigError> {
    Ok(toml::from_str(content)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = parse_config("").unwrap();
        assert!(config.enable_failover);
        assert_eq!(config.default_provider, "openai");
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.circuit_breaker.timeout_seconds, 30);
        assert_eq!(config.max_concurrent_requests, 10);
        assert_eq!(config.health_check_interval_minutes, 5);
        assert!(config.providers.is_empty());
    }

    #[test]
    fn test_full_document() {
        let config = parse_config(
            r#"
            default_provider = "claude"
            enable_failover = false
            max_concurrent_requests = 4

            [circuit_breaker]
            failure_threshold = 3
            timeout_seconds = 60

            [[providers]]
            id = "openai"
            priority = 2
            api_key = "sk-test"
            cost_per_1k_tokens = 0.5

            [[providers]]
            id = "claude"
            priority = 1
            api_key = "ak-test"
            timeout_seconds = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.default_provider, "claude");
        assert!(!config.enable_failover);
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
        assert_eq!(config.providers.len(), 2);
        assert!(config.providers[0].enabled);
        assert_eq!(config.providers[1].timeout_seconds, Some(10));
        assert_eq!(config.providers[0].cost_per_1k_tokens, 0.5);
    }

    #[test]
    fn test_syntax_error_is_parse_error() {
        let err = parse_config("providers = [").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = load_config(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
