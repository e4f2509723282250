use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Directory, relative to the project root, holding configuration files.
pub const CONFIG_DIR: &str = ".glimpse";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Latency thresholds must be non-decreasing, got t1={0} t2={1} t3={2} t4={3} ms")]
    NonMonotonicThresholds(u64, u64, u64, u64),

    #[error("Invalid max_attempts: {0}. Must be at least 1")]
    InvalidMaxAttempts(u32),

    #[error("Invalid poll_interval_ms: {0}. Must be at least 1")]
    InvalidPollInterval(u64),

    #[error("Invalid cache max_size: {0}. Must be at least 1")]
    InvalidCacheSize(usize),

    #[error("Invalid cache ttl_seconds: {0}. Must be at least 1")]
    InvalidCacheTtl(u64),

    #[error("Invalid timeouts: initial ({0}s) must be positive and not exceed max ({1}s)")]
    InvalidTimeouts(f64, f64),

    #[error("Invalid timeout window_size: {0}. Must be at least 1")]
    InvalidWindowSize(usize),

    #[error("Invalid max_concurrent: {0}. Must be at least 1")]
    InvalidMaxConcurrent(usize),

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
    /// Load configuration for the current directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults
    /// 2. .glimpse/config.yaml
    /// 3. .glimpse/local.yaml (optional local overrides)
    /// 4. Environment variables (GLIMPSE_* prefix, `__` separates nested keys)
    pub fn load() -> Result<Config> {
        Self::load_from(Path::new("."))
    }

    /// Same as [`load`](Self::load), rooted at `project_dir`.
    pub fn load_from(project_dir: &Path) -> Result<Config> {
        let dir = project_dir.join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(dir.join("config.yaml")))
            .merge(Yaml::file(dir.join("local.yaml")))
            .merge(Env::prefixed("GLIMPSE_").split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let latency = &config.latency;
        if !latency.is_monotonic() {
            return Err(ConfigError::NonMonotonicThresholds(
                latency.t1_ms,
                latency.t2_ms,
                latency.t3_ms,
                latency.t4_ms,
            ));
        }

        if config.engine.max_attempts == 0 {
            return Err(ConfigError::InvalidMaxAttempts(config.engine.max_attempts));
        }
        if config.engine.poll_interval_ms == 0 {
            return Err(ConfigError::InvalidPollInterval(config.engine.poll_interval_ms));
        }

        if config.cache.max_size == 0 {
            return Err(ConfigError::InvalidCacheSize(config.cache.max_size));
        }
        if config.cache.ttl_seconds == 0 {
            return Err(ConfigError::InvalidCacheTtl(config.cache.ttl_seconds));
        }

        let timeout = &config.timeout;
        if !(timeout.initial_timeout_secs > 0.0
            && timeout.initial_timeout_secs <= timeout.max_timeout_secs
            && timeout.max_timeout_secs.is_finite())
        {
            return Err(ConfigError::InvalidTimeouts(
                timeout.initial_timeout_secs,
                timeout.max_timeout_secs,
            ));
        }
        if timeout.window_size == 0 {
            return Err(ConfigError::InvalidWindowSize(timeout.window_size));
        }

        if config.queue.max_concurrent == 0 {
            return Err(ConfigError::InvalidMaxConcurrent(config.queue.max_concurrent));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.to_lowercase().as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.engine.max_attempts, 2);
        assert_eq!(config.latency.t4_ms, 6000);
        assert_eq!(config.cache.max_size, 1000);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
latency:
  t1_ms: 500
  t2_ms: 800
  t3_ms: 1300
  t4_ms: 2000
engine:
  max_attempts: 3
cache:
  max_size: 2000
  ttl_seconds: 7200
queue:
  max_concurrent: 10
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.latency.t4_ms, 2000);
        assert_eq!(config.engine.max_attempts, 3);
        assert_eq!(config.engine.debounce_ms, 300, "unset fields keep defaults");
        assert_eq!(config.cache.ttl_seconds, 7200);
        assert_eq!(config.queue.max_concurrent, 10);
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_non_monotonic_thresholds() {
        let mut config = Config::default();
        config.latency.t3_ms = 1000;

        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::NonMonotonicThresholds(1500, 2500, 1000, 6000)
        ));
    }

    #[test]
    fn test_validate_equal_thresholds_allowed() {
        let mut config = Config::default();
        config.latency.t2_ms = config.latency.t1_ms;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_attempts() {
        let mut config = Config::default();
        config.engine.max_attempts = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxAttempts(0)
        ));
    }

    #[test]
    fn test_validate_zero_cache_size() {
        let mut config = Config::default();
        config.cache.max_size = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidCacheSize(0)
        ));
    }

    #[test]
    fn test_validate_initial_above_max_timeout() {
        let mut config = Config::default();
        config.timeout.initial_timeout_secs = 12.0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidTimeouts(_, _)
        ));
    }

    #[test]
    fn test_validate_zero_concurrency() {
        let mut config = Config::default();
        config.queue.max_concurrent = 0;
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidMaxConcurrent(0)
        ));
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(matches!(
            ConfigLoader::validate(&config).unwrap_err(),
            ConfigError::InvalidLogFormat(_)
        ));
    }

    #[test]
    fn test_load_from_file_rejects_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "engine:\n  max_attempts: 0").unwrap();
        file.flush().unwrap();

        let err = ConfigLoader::load_from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("max_attempts"));
    }

    #[test]
    fn test_hierarchical_merging() {
        let project = TempDir::new().unwrap();
        let dir = project.path().join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("config.yaml"),
            "engine:\n  max_attempts: 3\n  debounce_ms: 100\nlogging:\n  format: json\n",
        )
        .unwrap();
        fs::write(dir.join("local.yaml"), "engine:\n  max_attempts: 4\n").unwrap();

        let config = ConfigLoader::load_from(project.path()).unwrap();
        assert_eq!(config.engine.max_attempts, 4, "Local override should win");
        assert_eq!(config.engine.debounce_ms, 100, "Base value should persist");
        assert_eq!(config.logging.format, "json");
    }

    #[test]
    fn test_env_override_wins() {
        let project = TempDir::new().unwrap();
        let dir = project.path().join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yaml"), "queue:\n  max_concurrent: 2\n").unwrap();

        temp_env::with_vars(
            [
                ("GLIMPSE_QUEUE__MAX_CONCURRENT", Some("8")),
                ("GLIMPSE_CLARIFIER__CURIOSITY", Some("true")),
            ],
            || {
                let config = ConfigLoader::load_from(project.path()).unwrap();
                assert_eq!(config.queue.max_concurrent, 8);
                assert!(config.clarifier.curiosity);
            },
        );
    }

    #[test]
    fn test_missing_files_use_defaults() {
        let project = TempDir::new().unwrap();
        let config = ConfigLoader::load_from(project.path()).unwrap();
        assert_eq!(config.engine, Config::default().engine);
    }
}
