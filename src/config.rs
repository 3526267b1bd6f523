// Runtime configuration. Every field has a default, so the TOML file is optional.
use std::fs;
use std::path::{Path, PathBuf};
use serde::Deserialize;
use tracing::{debug, info};
use crate::error::{FraudError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "fraudscan.toml";
pub const CONFIG_ENV_VAR: &str = "FRAUDSCAN_CONFIG";

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    pub paths: PathsConfig,
    pub training: TrainingConfig,
    pub forest: ForestConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PathsConfig {
    pub dataset: PathBuf,
    pub model: PathBuf,
    pub metrics: PathBuf,
    pub export: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("creditcard.csv"),
            model: PathBuf::from("fraud_model.pkl"),
            metrics: PathBuf::from("metrics.txt"),
            export: PathBuf::from("fraud_data.csv"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrainingConfig {
    pub seed: u64,
    pub test_size: f64,
    pub stratify: bool,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            test_size: 0.2,
            stratify: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    // None means floor(sqrt(n_features))
    pub max_features: Option<usize>,
    // None means every available core
    pub n_jobs: Option<usize>,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: None,
            min_samples_split: 2,
            max_features: None,
            n_jobs: None,
        }
    }
}

impl AppConfig {
    // Resolves the config file: explicit path, then $FRAUDSCAN_CONFIG, then ./fraudscan.toml.
    // Only the implicit default file may be absent.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let requested = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from));

        match requested {
            Some(path) => Self::load_from_path(&path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::load_from_path(default_path)
                } else {
                    debug!("no {} found, using default configuration", DEFAULT_CONFIG_FILE);
                    Ok(Self::default())
                }
            }
        }
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| FraudError::Config(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_toml(&content)
            .map_err(|e| FraudError::Config(format!("{}: {}", path.display(), e)))?;
        info!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: AppConfig =
            toml::from_str(content).map_err(|e| FraudError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        let test_size = self.training.test_size;
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(FraudError::Config(format!(
                "training.test_size must be in (0, 1), got {}",
                test_size
            )));
        }
        if self.forest.n_trees == 0 {
            return Err(FraudError::Config("forest.n_trees must be at least 1".to_string()));
        }
        if self.forest.max_features == Some(0) {
            return Err(FraudError::Config("forest.max_features must be at least 1".to_string()));
        }
        if self.forest.n_jobs == Some(0) {
            return Err(FraudError::Config("forest.n_jobs must be at least 1".to_string()));
        }
        Ok(())
    }
}
