//! Ranker configuration
//!
//! Layered as defaults → optional TOML file → `KICKER_*` environment
//! variables, e.g. `KICKER_PIPELINE__RANK_BY=projected-points` or
//! `KICKER_LOGGING__FORMAT=json`.

use crate::error::{RankerError, Result};
use crate::pipeline::PipelineSettings;
use crate::profile::ScoringProfile;
use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "KICKER";

/// Largest accepted `export_decimals`
pub const MAX_EXPORT_DECIMALS: usize = 17;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankerConfig {
    /// Preset name or path to a profile TOML file
    pub profile: String,

    /// Pipeline settings
    pub pipeline: PipelineSettings,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (pretty, json, compact)
    pub format: String,
}

impl Default for RankerConfig {
    fn default() -> Self {
        Self {
            profile: "tiebreak".to_string(),
            pipeline: PipelineSettings::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl RankerConfig {
    /// Load defaults, then `path` if given, then the process environment
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, Environment::with_prefix(ENV_PREFIX))
    }

    /// Defaults overlaid with the process environment only
    pub fn from_env() -> Result<Self> {
        Self::load(None)
    }

    /// Load with an explicit environment source
    pub fn load_with_env(path: Option<&Path>, env: Environment) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = path {
            if !path.exists() {
                return Err(RankerError::config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            tracing::debug!("Loading configuration from file: {:?}", path);
            builder = builder.add_source(File::from(path).format(FileFormat::Toml));
        }
        builder = builder.add_source(env.prefix_separator("_").separator("__").try_parsing(true));

        let config: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| RankerError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save as TOML
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        let text = toml::to_string_pretty(self).map_err(|e| RankerError::config(e.to_string()))?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Resolve the configured profile
    pub fn scoring_profile(&self) -> Result<ScoringProfile> {
        ScoringProfile::resolve(&self.profile)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => return Err(RankerError::config(format!("Invalid log level: {}", other))),
        }

        match self.logging.format.as_str() {
            "json" | "pretty" | "compact" => {}
            other => return Err(RankerError::config(format!("Invalid log format: {}", other))),
        }

        let lambda = self.pipeline.ridge_lambda;
        if !lambda.is_finite() || lambda < 0.0 {
            return Err(RankerError::config(format!("Invalid ridge_lambda: {}", lambda)));
        }

        if let Some(decimals) = self.pipeline.export_decimals {
            if decimals > MAX_EXPORT_DECIMALS {
                return Err(RankerError::config(format!(
                    "export_decimals must be at most {}, got {}",
                    MAX_EXPORT_DECIMALS, decimals
                )));
            }
        }

        if self.pipeline.target_column.trim().is_empty() || self.pipeline.score_target_column.trim().is_empty() {
            return Err(RankerError::config("target columns must not be empty"));
        }

        self.scoring_profile().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RankBy;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Environment::with_prefix(ENV_PREFIX).source(Some(map))
    }

    #[test]
    fn test_defaults() {
        let config = RankerConfig::load_with_env(None, env(&[])).unwrap();
        assert_eq!(config, RankerConfig::default());
        assert_eq!(config.pipeline.rank_by, RankBy::RuleScore);
        assert_eq!(config.pipeline.target_column, "OutcomePoints");
        assert_eq!(config.profile, "tiebreak");
        assert_eq!(config.scoring_profile().unwrap(), ScoringProfile::default());
    }

    #[test]
    fn test_file_then_env_layering() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("kicker.toml");
        std::fs::write(
            &path,
            r#"
profile = "weighted"

[pipeline]
rank_by = "projected-points"
ridge_lambda = 2.5

[logging]
level = "debug"
"#,
        )
        .unwrap();

        let config = RankerConfig::load_with_env(
            Some(&path),
            env(&[("KICKER_LOGGING__FORMAT", "json"), ("KICKER_PIPELINE__RIDGE_LAMBDA", "0.5")]),
        )
        .unwrap();

        assert_eq!(config.profile, "weighted");
        assert_eq!(config.pipeline.rank_by, RankBy::ProjectedPoints);
        assert_eq!(config.pipeline.ridge_lambda, 0.5);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.format, "json");
        assert!(config.pipeline.include_rule_score);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("saved.toml");
        let mut config = RankerConfig::default();
        config.pipeline.export_decimals = Some(2);
        config.profile = "classic".to_string();
        config.to_file(&path).unwrap();

        let loaded = RankerConfig::load_with_env(Some(&path), env(&[])).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_validation() {
        let mut config = RankerConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = RankerConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = RankerConfig::default();
        config.profile = "no-such-profile".to_string();
        assert!(config.validate().is_err());

        let mut config = RankerConfig::default();
        config.pipeline.export_decimals = Some(40);
        assert!(config.validate().is_err());

        assert!(RankerConfig::default().validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = RankerConfig::load_with_env(Some(Path::new("/nonexistent/kicker.toml")), env(&[])).unwrap_err();
        assert!(matches!(err, RankerError::Config(_)));
    }
}
