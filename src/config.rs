//! TOML-based application configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::features::UnknownCityPolicy;

/// Top-level configuration parsed from TOML.
///
/// Every section is optional and falls back to its `Default`. Load from
/// TOML with [`AppConfig::from_toml_file`] or use [`AppConfig::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Model and metadata artifact locations.
    #[serde(default)]
    pub model: ModelConfig,
    /// Weather table and synthetic corpus generation.
    #[serde(default)]
    pub corpus: CorpusConfig,
    /// Random forest training parameters.
    #[serde(default)]
    pub training: TrainingConfig,
    /// Open-Meteo ingestion parameters.
    #[serde(default)]
    pub fetch: FetchConfig,
    /// HTTP prediction endpoint.
    #[serde(default)]
    pub server: ServerConfig,
    /// Feature vector construction.
    #[serde(default)]
    pub features: FeaturesConfig,
}

/// Model and metadata artifact locations.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ModelConfig {
    /// Serialized random forest.
    pub model_path: PathBuf,
    /// Metadata JSON written next to the model.
    pub metadata_path: PathBuf,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("solar_model.bin"),
            metadata_path: PathBuf::from("model_metadata.json"),
        }
    }
}

/// Weather table and synthetic corpus generation.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorpusConfig {
    /// Raw hourly weather CSV produced by `fetch`.
    pub weather_path: PathBuf,
    /// Labelled corpus CSV produced by `generate`.
    pub corpus_path: PathBuf,
    /// Candidate system capacities (W); every weather row is labelled once per capacity.
    pub capacities_w: Vec<f64>,
    /// Seed for the label noise.
    pub seed: u64,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            weather_path: PathBuf::from("india_weather_data.csv"),
            corpus_path: PathBuf::from("india_solar_training_data.csv"),
            capacities_w: vec![3000.0, 4500.0, 5000.0],
            seed: 7,
        }
    }
}

/// Random forest training parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    /// Number of trees (must be > 0).
    pub trees: usize,
    /// Optional depth limit; unlimited when absent.
    pub max_depth: Option<u16>,
    /// Share of rows held out for evaluation, in (0, 1).
    pub test_fraction: f64,
    /// Seed for the shuffle and the forest.
    pub seed: u64,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            trees: 20,
            max_depth: None,
            test_fraction: 0.2,
            seed: 42,
        }
    }
}

/// Open-Meteo ingestion parameters.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FetchConfig {
    /// Historical archive endpoint.
    pub archive_url: String,
    /// Forecast endpoint used for current conditions.
    pub forecast_url: String,
    /// Cities per archive request.
    pub chunk_size: usize,
    /// Attempts per chunk before giving up.
    pub retries: u32,
    /// Rate-limit backoff grows by this many seconds per attempt.
    pub backoff_step_secs: u64,
    /// Pause between chunks (seconds).
    pub pause_secs: u64,
    /// Length of the history window (days).
    pub history_days: u32,
    /// The window ends this many days before today; the archive lags behind.
    pub end_offset_days: u32,
    /// HTTP request timeout (seconds).
    pub timeout_secs: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            archive_url: "https://archive-api.open-meteo.com/v1/archive".to_string(),
            forecast_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            chunk_size: 8,
            retries: 3,
            backoff_step_secs: 10,
            pause_secs: 3,
            history_days: 3 * 365,
            end_offset_days: 2,
            timeout_secs: 120,
        }
    }
}

/// HTTP prediction endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Bind address.
    pub host: String,
    pub port: u16,
    /// Origins allowed by CORS.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost".to_string(),
                "http://localhost:5173".to_string(),
                "http://127.0.0.1".to_string(),
                "http://127.0.0.1:5173".to_string(),
            ],
        }
    }
}

/// Feature vector construction.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FeaturesConfig {
    /// What to do with a city the model was not trained on.
    pub unknown_city: UnknownCityPolicy,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, thiserror::Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"training.trees"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl ConfigError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

impl AppConfig {
    /// Parses a configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| {
            ConfigError::new("config", format!("cannot read \"{}\": {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid, contains unknown
    /// fields or names an unknown city policy.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError::new("toml", e.to_string()))
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let c = &self.corpus;
        if c.capacities_w.is_empty() {
            errors.push(ConfigError::new("corpus.capacities_w", "must not be empty"));
        }
        if c.capacities_w.iter().any(|w| !(w.is_finite() && *w > 0.0)) {
            errors.push(ConfigError::new(
                "corpus.capacities_w",
                "every capacity must be > 0",
            ));
        }

        let t = &self.training;
        if t.trees == 0 {
            errors.push(ConfigError::new("training.trees", "must be > 0"));
        }
        if !(t.test_fraction > 0.0 && t.test_fraction < 1.0) {
            errors.push(ConfigError::new(
                "training.test_fraction",
                format!("must be in (0.0, 1.0), got {}", t.test_fraction),
            ));
        }
        if t.max_depth == Some(0) {
            errors.push(ConfigError::new("training.max_depth", "must be > 0 when set"));
        }

        let f = &self.fetch;
        if f.chunk_size == 0 {
            errors.push(ConfigError::new("fetch.chunk_size", "must be > 0"));
        }
        if f.retries == 0 {
            errors.push(ConfigError::new("fetch.retries", "must be > 0"));
        }
        if f.history_days == 0 {
            errors.push(ConfigError::new("fetch.history_days", "must be > 0"));
        }

        if self.server.port == 0 {
            errors.push(ConfigError::new("server.port", "must be > 0"));
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_valid() {
        let errors = AppConfig::default().validate();
        assert!(errors.is_empty(), "defaults should be valid: {errors:?}");
    }

    #[test]
    fn defaults_match_collection_job() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.corpus.capacities_w, vec![3000.0, 4500.0, 5000.0]);
        assert_eq!(cfg.fetch.chunk_size, 8);
        assert_eq!(cfg.fetch.retries, 3);
        assert_eq!(cfg.training.trees, 20);
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.features.unknown_city, UnknownCityPolicy::Reject);
    }

    #[test]
    fn valid_toml_parses() {
        let toml = r#"
[model]
model_path = "out/model.bin"
metadata_path = "out/meta.json"

[corpus]
capacities_w = [2000.0, 6000.0]
seed = 3

[training]
trees = 50
max_depth = 12
test_fraction = 0.25

[fetch]
chunk_size = 4
pause_secs = 0

[server]
port = 9000
cors_origins = ["http://example.test"]

[features]
unknown_city = "zero"
"#;
        let cfg = AppConfig::from_toml_str(toml);
        assert!(cfg.is_ok(), "valid TOML should parse: {:?}", cfg.err());
        let cfg = cfg.ok();
        assert_eq!(cfg.as_ref().map(|c| c.training.trees), Some(50));
        assert_eq!(cfg.as_ref().and_then(|c| c.training.max_depth), Some(12));
        assert_eq!(cfg.as_ref().map(|c| c.fetch.chunk_size), Some(4));
        assert_eq!(
            cfg.as_ref().map(|c| c.features.unknown_city),
            Some(UnknownCityPolicy::Zero)
        );
    }

    #[test]
    fn invalid_toml_unknown_field() {
        let toml = r#"
[training]
trees = 10
bogus_field = true
"#;
        assert!(AppConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn unknown_city_policy_rejected_at_parse_time() {
        let toml = r#"
[features]
unknown_city = "guess"
"#;
        assert!(AppConfig::from_toml_str(toml).is_err());
    }

    #[test]
    fn validation_catches_empty_capacities() {
        let mut cfg = AppConfig::default();
        cfg.corpus.capacities_w.clear();
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "corpus.capacities_w"));
    }

    #[test]
    fn validation_catches_negative_capacity() {
        let mut cfg = AppConfig::default();
        cfg.corpus.capacities_w = vec![3000.0, -1.0];
        let errors = cfg.validate();
        assert!(errors.iter().any(|e| e.field == "corpus.capacities_w"));
    }

    #[test]
    fn validation_catches_bad_test_fraction() {
        for bad in [0.0, 1.0, -0.2, f64::NAN] {
            let mut cfg = AppConfig::default();
            cfg.training.test_fraction = bad;
            let errors = cfg.validate();
            assert!(
                errors.iter().any(|e| e.field == "training.test_fraction"),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn validation_catches_zero_trees_and_chunks() {
        let mut cfg = AppConfig::default();
        cfg.training.trees = 0;
        cfg.fetch.chunk_size = 0;
        cfg.fetch.retries = 0;
        let fields: Vec<_> = cfg.validate().into_iter().map(|e| e.field).collect();
        assert!(fields.contains(&"training.trees".to_string()));
        assert!(fields.contains(&"fetch.chunk_size".to_string()));
        assert!(fields.contains(&"fetch.retries".to_string()));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let toml = r#"
[training]
seed = 99
"#;
        let cfg = AppConfig::from_toml_str(toml).ok();
        // seed overridden
        assert_eq!(cfg.as_ref().map(|c| c.training.seed), Some(99));
        // trees kept default
        assert_eq!(cfg.as_ref().map(|c| c.training.trees), Some(20));
        // server kept default
        assert_eq!(cfg.as_ref().map(|c| c.server.port), Some(8000));
    }
}
