use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project directory holding configuration and persisted state
pub const PROJECT_DIR: &str = ".healmap";

/// Prefix of environment variable overrides
pub const ENV_PREFIX: &str = "HEALMAP_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid chunking.max_len: {0}. Must be at least 1")]
    InvalidChunkSize(usize),

    #[error("Invalid retrieval.top_k: {0}. Must be at least 1")]
    InvalidTopK(usize),

    #[error("Invalid generation.temperature: {0}. Must be within [0, 1]")]
    InvalidTemperature(f32),

    #[error("Invalid embedding.dimension: {0}. Must be at least 1")]
    InvalidDimension(usize),

    #[error("Invalid embedding.max_batch_size: {0}. Must be at least 1")]
    InvalidBatchSize(usize),

    #[error("Invalid {section}.timeout_secs: {value}. Must be at least 1")]
    InvalidTimeout { section: &'static str, value: u64 },

    #[error("Invalid generation.max_tokens: {0}. Must be at least 1")]
    InvalidMaxTokens(u32),

    #[error("Path cannot be empty: {0}")]
    EmptyPath(&'static str),

    #[error("Model identifier cannot be empty: {0}")]
    EmptyModel(&'static str),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .healmap/config.yaml (project config)
    /// 3. .healmap/local.yaml (local overrides, optional)
    /// 4. Environment variables (HEALMAP_* prefix, `__` separates sections)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(PROJECT_DIR)
    }

    /// Load configuration rooted at a project directory other than `.healmap`
    pub fn load_from_dir(dir: impl AsRef<Path>) -> Result<Config> {
        let dir = dir.as_ref();
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file, still honouring env overrides
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.document_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("document_path"));
        }
        if config.snapshot.embeddings_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("snapshot.embeddings_path"));
        }
        if config.snapshot.index_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyPath("snapshot.index_path"));
        }

        if config.chunking.max_len == 0 {
            return Err(ConfigError::InvalidChunkSize(config.chunking.max_len));
        }
        if config.retrieval.top_k == 0 {
            return Err(ConfigError::InvalidTopK(config.retrieval.top_k));
        }

        let embedding = &config.embedding;
        if embedding.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel("embedding.model"));
        }
        if embedding.dimension == 0 {
            return Err(ConfigError::InvalidDimension(embedding.dimension));
        }
        if embedding.max_batch_size == 0 {
            return Err(ConfigError::InvalidBatchSize(embedding.max_batch_size));
        }
        if embedding.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                section: "embedding",
                value: embedding.timeout_secs,
            });
        }

        let generation = &config.generation;
        if generation.model.trim().is_empty() {
            return Err(ConfigError::EmptyModel("generation.model"));
        }
        if !(0.0..=1.0).contains(&generation.temperature) {
            return Err(ConfigError::InvalidTemperature(generation.temperature));
        }
        if generation.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                section: "generation",
                value: generation.timeout_secs,
            });
        }
        if generation.max_tokens == 0 {
            return Err(ConfigError::InvalidMaxTokens(generation.max_tokens));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(
                config.logging.rotation.clone(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::config::{EmbeddingBackend, GenerationBackend};
    use std::io::Write;
    use std::path::PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_validate_zero_chunk_size() {
        let mut config = Config::default();
        config.chunking.max_len = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidChunkSize(0))
        ));
    }

    #[test]
    fn test_validate_zero_top_k() {
        let mut config = Config::default();
        config.retrieval.top_k = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTopK(0))
        ));
    }

    #[test]
    fn test_validate_temperature_range() {
        let mut config = Config::default();
        config.generation.temperature = 1.2;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTemperature(_))
        ));

        config.generation.temperature = 1.0;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_embedding_limits() {
        let mut config = Config::default();
        config.embedding.dimension = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidDimension(0))
        ));

        let mut config = Config::default();
        config.embedding.max_batch_size = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBatchSize(0))
        ));

        let mut config = Config::default();
        config.embedding.timeout_secs = 0;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidTimeout {
                section: "embedding",
                value: 0
            })
        ));
    }

    #[test]
    fn test_validate_empty_paths() {
        let mut config = Config::default();
        config.snapshot.index_path = PathBuf::new();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::EmptyPath("snapshot.index_path"))
        ));
    }

    #[test]
    fn test_validate_invalid_log_settings() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();
        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(_))
        ));

        let mut config = Config::default();
        config.logging.rotation = "weekly".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogRotation(_))
        ));
    }

    #[test]
    fn test_hierarchical_merging() {
        let dir = tempfile::tempdir().unwrap();

        let mut base = std::fs::File::create(dir.path().join("config.yaml")).unwrap();
        writeln!(
            base,
            "retrieval:\n  top_k: 5\nlogging:\n  level: info\n  format: json"
        )
        .unwrap();

        let mut local = std::fs::File::create(dir.path().join("local.yaml")).unwrap();
        writeln!(local, "retrieval:\n  top_k: 7\nlogging:\n  level: debug").unwrap();

        let config = temp_env::with_vars_unset(
            ["HEALMAP_RETRIEVAL__TOP_K", "HEALMAP_LOGGING__LEVEL"],
            || ConfigLoader::load_from_dir(dir.path()).unwrap(),
        );

        assert_eq!(config.retrieval.top_k, 7, "Local override should win");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(
            config.logging.format, "json",
            "Base value should persist when not overridden"
        );
        assert_eq!(config.chunking.max_len, 200);
    }

    #[test]
    fn test_env_override_wins() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("config.yaml"), "retrieval:\n  top_k: 5\n").unwrap();

        let config = temp_env::with_vars(
            [
                ("HEALMAP_RETRIEVAL__TOP_K", Some("9")),
                ("HEALMAP_EMBEDDING__BACKEND", Some("local")),
                ("HEALMAP_GENERATION__BACKEND", Some("anthropic")),
            ],
            || ConfigLoader::load_from_dir(dir.path()).unwrap(),
        );

        assert_eq!(config.retrieval.top_k, 9);
        assert_eq!(config.embedding.backend, EmbeddingBackend::Local);
        assert_eq!(config.generation.backend, GenerationBackend::Anthropic);
    }

    #[test]
    fn test_invalid_file_value_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.yaml");
        std::fs::write(&path, "chunking:\n  max_len: 0\n").unwrap();

        let err = ConfigLoader::load_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("max_len"));
    }

    #[test]
    fn test_missing_explicit_file() {
        let err = ConfigLoader::load_from_file("/nonexistent/healmap.yaml").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
