use crate::error::Result;
use crate::ml::{ArtifactFormat, RangePolicy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Config {
    /// Model artifact location
    #[validate(nested)]
    pub models: ModelsConfig,

    /// Input validation behaviour
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Observability configuration
    #[serde(default)]
    #[validate(nested)]
    pub observability: ObservabilityConfig,
}

impl Config {
    /// Load configuration from the embedded defaults, an optional file and
    /// the environment
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("RISK_PREDICTOR_CONFIG")
            .unwrap_or_else(|_| "config/local.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Same as `load` with an explicit override file
    pub fn load_from(config_path: &Path) -> Result<Self> {
        let config: Config = config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::from(config_path).required(false))
            // Override with environment variables (RISK_PREDICTOR__SECTION__KEY)
            .add_source(
                config::Environment::with_prefix("RISK_PREDICTOR")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            models: ModelsConfig::default(),
            validation: ValidationConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ModelsConfig {
    /// Path of the artifact holding every scaler/model pair
    #[serde(default = "default_artifact_path")]
    #[validate(length(min = 1))]
    pub artifact_path: String,

    /// Force an artifact format instead of inferring it from the extension
    #[serde(default)]
    pub format: Option<ArtifactFormat>,
}

impl ModelsConfig {
    pub fn artifact_path(&self) -> PathBuf {
        PathBuf::from(&self.artifact_path)
    }
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            artifact_path: default_artifact_path(),
            format: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationConfig {
    /// Reject or clamp values outside a field's bounds
    #[serde(default)]
    pub range_policy: RangePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ObservabilityConfig {
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    #[validate(length(min = 1))]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,

    /// Record Prometheus metrics for each prediction
    #[serde(default = "default_true")]
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

// Default value functions
fn default_artifact_path() -> String {
    "models/all_disease_models.json".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}
