use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Main engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Model version stamped on every prediction
    #[serde(default = "default_model_version")]
    pub model_version: String,

    /// Training set provider configuration
    #[serde(default)]
    pub dataset: DatasetConfig,

    /// Ensemble model configuration
    #[serde(default)]
    pub model: ModelConfig,

    /// Observability configuration
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl EngineConfig {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: MISSION_ENGINE)
            .add_source(
                config::Environment::with_prefix("MISSION_ENGINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            model_version: default_model_version(),
            dataset: DatasetConfig::default(),
            model: ModelConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Training set provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    /// Optional path to a real mission CSV; any load failure falls back
    /// to the synthetic generator
    pub source_path: Option<PathBuf>,

    /// Number of rows the synthetic generator produces
    #[serde(default = "default_synthetic_samples")]
    pub synthetic_samples: usize,

    /// Seed for every random draw in data generation and splitting
    #[serde(default = "default_seed")]
    pub seed: u64,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            source_path: None,
            synthetic_samples: default_synthetic_samples(),
            seed: default_seed(),
        }
    }
}

/// Stacked ensemble hyperparameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Held-out fraction for evaluation
    #[serde(default = "default_test_fraction")]
    pub test_fraction: f64,

    /// Cross-validation folds feeding the meta-learner
    #[serde(default = "default_cv_folds")]
    pub cv_folds: usize,

    /// Random forest tree count
    #[serde(default = "default_forest_trees")]
    pub forest_trees: u16,

    /// Random forest depth cap
    #[serde(default = "default_forest_max_depth")]
    pub forest_max_depth: u16,

    /// Gradient boosting rounds
    #[serde(default = "default_boost_rounds")]
    pub boost_rounds: usize,

    /// Gradient boosting weak-learner depth cap
    #[serde(default = "default_boost_max_depth")]
    pub boost_max_depth: u16,

    /// Gradient boosting shrinkage
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Kernel ridge regularization strength
    #[serde(default = "default_kernel_lambda")]
    pub kernel_lambda: f64,

    /// RBF kernel width; defaults to 1 / n_features on scaled inputs
    pub kernel_gamma: Option<f64>,

    /// Ridge meta-learner regularization strength
    #[serde(default = "default_meta_alpha")]
    pub meta_alpha: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            test_fraction: default_test_fraction(),
            cv_folds: default_cv_folds(),
            forest_trees: default_forest_trees(),
            forest_max_depth: default_forest_max_depth(),
            boost_rounds: default_boost_rounds(),
            boost_max_depth: default_boost_max_depth(),
            learning_rate: default_learning_rate(),
            kernel_lambda: default_kernel_lambda(),
            kernel_gamma: None,
            meta_alpha: default_meta_alpha(),
        }
    }
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Enable JSON logging
    #[serde(default)]
    pub json_logs: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json_logs: false,
        }
    }
}

/// Initialize the tracing subscriber for hosts that do not bring their own
pub fn init_tracing(config: &ObservabilityConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("mission_risk_engine={}", config.log_level).into());

    if config.json_logs {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

// Default value functions
fn default_model_version() -> String {
    "1.0.0".to_string()
}

fn default_synthetic_samples() -> usize {
    200
}

fn default_seed() -> u64 {
    42
}

fn default_test_fraction() -> f64 {
    0.2
}

fn default_cv_folds() -> usize {
    5
}

fn default_forest_trees() -> u16 {
    100
}

fn default_forest_max_depth() -> u16 {
    10
}

fn default_boost_rounds() -> usize {
    100
}

fn default_boost_max_depth() -> u16 {
    6
}

fn default_learning_rate() -> f64 {
    0.1
}

fn default_kernel_lambda() -> f64 {
    1.0
}

fn default_meta_alpha() -> f64 {
    1.0
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_values() {
        let config = EngineConfig::default();
        assert_eq!(config.model_version, "1.0.0");
        assert_eq!(config.dataset.synthetic_samples, 200);
        assert_eq!(config.dataset.seed, 42);
        assert_eq!(config.model.cv_folds, 5);
        assert!(config.dataset.source_path.is_none());
    }

    #[test]
    fn test_embedded_defaults_parse() {
        let parsed: EngineConfig = config::Config::builder()
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(parsed.model.forest_trees, 100);
        assert_eq!(parsed.model.test_fraction, 0.2);
        assert_eq!(parsed.observability.log_level, "info");
    }
}
