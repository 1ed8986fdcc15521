//! Serializable run configuration.
//!
//! One TOML file captures everything needed to reproduce a run: the
//! seed, fold count, cache location, the submission roster, and the
//! data partition paths.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("fold count must be at least 2, got {0}")]
    TooFewFolds(usize),
    #[error("submission roster is empty")]
    EmptyRoster,
}

/// Complete configuration for one evaluation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvalConfig {
    pub evaluation: EvaluationSection,
    pub data: DataSection,
}

/// The `[evaluation]` section.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationSection {
    /// Master seed for the run; also the cache key.
    pub seed: u64,
    /// Number of cross-validation folds.
    #[serde(default = "default_n_folds")]
    pub n_folds: usize,
    /// Fan folds out across worker threads during training.
    #[serde(default)]
    pub parallel_folds: bool,
    /// Directory holding seed-keyed result files.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    /// Roster of registered submission names, evaluated in order.
    pub submissions: Vec<String>,
}

/// The `[data]` section: delimited feature tables for the original
/// train and test partitions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DataSection {
    pub train: PathBuf,
    pub test: PathBuf,
}

fn default_n_folds() -> usize {
    5
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("saved_outcomes")
}

impl EvalConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&raw)
    }

    pub fn from_toml(raw: &str) -> Result<Self, ConfigError> {
        let config: EvalConfig = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.evaluation.n_folds < 2 {
            return Err(ConfigError::TooFewFolds(self.evaluation.n_folds));
        }
        if self.evaluation.submissions.is_empty() {
            return Err(ConfigError::EmptyRoster);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[evaluation]
seed = 42
submissions = ["constant_positive"]

[data]
train = "data/train.csv"
test = "data/test.csv"
"#;

    #[test]
    fn minimal_config_applies_defaults() {
        let config = EvalConfig::from_toml(MINIMAL).unwrap();
        assert_eq!(config.evaluation.seed, 42);
        assert_eq!(config.evaluation.n_folds, 5);
        assert!(!config.evaluation.parallel_folds);
        assert_eq!(config.evaluation.cache_dir, PathBuf::from("saved_outcomes"));
    }

    #[test]
    fn explicit_fields_override_defaults() {
        let raw = r#"
[evaluation]
seed = 7
n_folds = 3
parallel_folds = true
cache_dir = "outcomes"
submissions = ["a", "b"]

[data]
train = "t.csv"
test = "e.csv"
"#;
        let config = EvalConfig::from_toml(raw).unwrap();
        assert_eq!(config.evaluation.n_folds, 3);
        assert!(config.evaluation.parallel_folds);
        assert_eq!(config.evaluation.submissions, vec!["a", "b"]);
    }

    #[test]
    fn rejects_single_fold() {
        let raw = MINIMAL.replace("seed = 42", "seed = 42\nn_folds = 1");
        assert!(matches!(
            EvalConfig::from_toml(&raw),
            Err(ConfigError::TooFewFolds(1))
        ));
    }

    #[test]
    fn rejects_empty_roster() {
        let raw = MINIMAL.replace("[\"constant_positive\"]", "[]");
        assert!(matches!(
            EvalConfig::from_toml(&raw),
            Err(ConfigError::EmptyRoster)
        ));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = EvalConfig::from_toml(MINIMAL).unwrap();
        let raw = toml::to_string(&config).unwrap();
        let reparsed = EvalConfig::from_toml(&raw).unwrap();
        assert_eq!(config, reparsed);
    }
}
