//! Classifier configuration
//!
//! Loaded from YAML. The config file location is resolved from the environment
//! first, then from the working directory, falling back to built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::ontology;

/// Env var naming the config file directly
pub const CONFIG_ENV: &str = "DOC_CLASSIFIER_CONFIG";
/// Env var naming a directory that holds `classifier.yaml`
pub const CONFIG_DIR_ENV: &str = "DOC_CLASSIFIER_CONFIG_DIR";

const CONFIG_FILE_NAME: &str = "classifier.yaml";

/// Runtime settings for the classification core
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Taxonomy document (YAML or JSON)
    pub taxonomy_path: PathBuf,

    /// Ontology graph (Turtle)
    pub ontology_path: PathBuf,

    /// Namespace of the ontology's own classes and properties
    pub ontology_namespace: String,

    /// Local name of the root document class
    pub ontology_root: String,

    /// Candidates returned by the taxonomy keyword phase
    pub taxonomy_top_n: usize,

    /// INTELLIGENT mode stops after the taxonomy phase at or above this confidence
    pub intelligent_threshold: f64,

    /// Characters of text handed to the ML classifier
    pub ml_text_limit: usize,

    /// Below this ML confidence the rule-based fallback is consulted
    pub ml_fallback_threshold: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            taxonomy_path: PathBuf::from("config/taxonomy/document_taxonomy.yaml"),
            ontology_path: PathBuf::from("config/ontology/document_ontology.ttl"),
            ontology_namespace: ontology::DEFAULT_NAMESPACE.to_string(),
            ontology_root: ontology::DEFAULT_ROOT.to_string(),
            taxonomy_top_n: 3,
            intelligent_threshold: 0.85,
            ml_text_limit: 2000,
            ml_fallback_threshold: 0.6,
        }
    }
}

impl ClassifierConfig {
    /// Load a config file. Relative data paths are resolved against the
    /// directory containing the file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;

        let mut config = Self::from_yaml(&content)?;
        if let Some(base) = path.parent() {
            config.taxonomy_path = rebase(base, &config.taxonomy_path);
            config.ontology_path = rebase(base, &config.ontology_path);
        }

        info!(path = %path.display(), "Loaded classifier config");
        Ok(config)
    }

    /// Parse and validate a YAML config string.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let config: ClassifierConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Resolve the config from the environment.
    ///
    /// Order: `DOC_CLASSIFIER_CONFIG`, `$DOC_CLASSIFIER_CONFIG_DIR/classifier.yaml`,
    /// `config/classifier.yaml`, then defaults.
    pub fn resolve() -> Result<Self, ConfigError> {
        match Self::config_path() {
            Some(path) => Self::load(path),
            None => {
                debug!("No classifier config found, using defaults");
                Ok(Self::default())
            }
        }
    }

    fn config_path() -> Option<PathBuf> {
        if let Ok(file) = std::env::var(CONFIG_ENV) {
            return Some(PathBuf::from(file));
        }

        if let Ok(dir) = std::env::var(CONFIG_DIR_ENV) {
            return Some(PathBuf::from(dir).join(CONFIG_FILE_NAME));
        }

        let relative = PathBuf::from("config").join(CONFIG_FILE_NAME);
        if relative.exists() {
            return Some(relative);
        }

        None
    }

    /// Reject values the pipeline cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.taxonomy_top_n == 0 {
            return Err(ConfigError::Invalid {
                field: "taxonomy_top_n",
                reason: "must be at least 1".to_string(),
            });
        }

        for (field, value) in [
            ("intelligent_threshold", self.intelligent_threshold),
            ("ml_fallback_threshold", self.ml_fallback_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("{} is outside [0, 1]", value),
                });
            }
        }

        if self.ontology_namespace.is_empty() {
            return Err(ConfigError::Invalid {
                field: "ontology_namespace",
                reason: "must not be empty".to_string(),
            });
        }

        Ok(())
    }
}

fn rebase(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
