//! Configuration Loader
//!
//! Environment-aware configuration loading: a TOML file layered under
//! `HEALTHWATCH__` environment variables, deserialized once and frozen.

use config::{Config, Environment, File, FileFormat};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

use super::error::{ConfigResult, ConfigurationError};
use super::{AppConfig, ProbeKind};
use crate::constants::{CONFIG_ENV_VAR, DEFAULT_CONFIG_PATH, ENV_PREFIX};

/// Owner of the immutable application configuration
#[derive(Debug)]
pub struct ConfigManager {
    config: Arc<AppConfig>,
    environment: String,
    source: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection.
    ///
    /// Reads `HEALTHWATCH_CONFIG` if set (the file must then exist), otherwise
    /// `config/healthwatch.toml` if present, then applies environment overrides.
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        match env::var(CONFIG_ENV_VAR) {
            Ok(path) if !path.trim().is_empty() => Self::load_from_file(Some(Path::new(&path))),
            _ => Self::load_from_file(None),
        }
    }

    /// Load configuration from an explicit file (required) or the default
    /// location (optional), layering environment overrides on top.
    pub fn load_from_file(path: Option<&Path>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();

        let (file_source, source) = match path {
            Some(path) => {
                if !path.exists() {
                    return Err(ConfigurationError::config_file_not_found(
                        path.to_path_buf(),
                    ));
                }
                (File::from(path).required(true), Some(path.to_path_buf()))
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_PATH);
                let exists = default_path.exists();
                (
                    File::from(default_path.as_path()).required(false),
                    exists.then_some(default_path),
                )
            }
        };

        debug!(
            environment = %environment,
            source = ?source,
            "Loading health-check configuration"
        );

        let settings = Config::builder()
            .add_source(file_source)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Self::finish(settings, environment, source)
    }

    /// Build configuration from an in-memory TOML document, without environment
    /// overrides. Used by tests and embedders that assemble config themselves.
    pub fn from_toml_str(document: &str) -> ConfigResult<Arc<ConfigManager>> {
        let settings = Config::builder()
            .add_source(File::from_str(document, FileFormat::Toml))
            .build()?;

        Self::finish(settings, Self::detect_environment(), None)
    }

    /// Wrap an already-built configuration
    pub fn from_config(config: AppConfig) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config: Arc::new(config),
            environment: Self::detect_environment(),
            source: None,
        }))
    }

    fn finish(
        settings: Config,
        environment: String,
        source: Option<PathBuf>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config: AppConfig = settings.try_deserialize().map_err(|e| {
            ConfigurationError::parse_error(
                source
                    .as_ref()
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "inline configuration".to_string()),
                e,
            )
        })?;

        config.validate()?;

        info!(
            environment = %environment,
            enabled = config.health_check.enable_checks_standard,
            endpoint = %config.health_check.health_check_path(),
            probes = ?Self::sanitized_probe_summary(&config),
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config: Arc::new(config),
            environment,
            source,
        }))
    }

    /// Probe names and kinds only; connection strings stay out of the logs
    fn sanitized_probe_summary(config: &AppConfig) -> Vec<String> {
        config
            .probes
            .iter()
            .map(|probe| format!("{} ({})", probe.name, probe.kind.as_str()))
            .collect()
    }

    /// Detect the runtime environment from environment variables
    pub fn detect_environment() -> String {
        env::var("HEALTHWATCH_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Shared handle to the frozen configuration
    pub fn shared(&self) -> Arc<AppConfig> {
        Arc::clone(&self.config)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Whether any configured probe needs a database connection
    pub fn has_sql_probes(&self) -> bool {
        self.config
            .probes
            .iter()
            .any(|p| matches!(p.kind, ProbeKind::Sql { .. }))
    }
}
