//! Application configuration management.
//!
//! Settings are layered with `figment`, later layers winning:
//!
//! 1. built-in defaults
//! 2. a TOML file (the platform config dir, or an explicit `--config` path)
//! 3. environment variables prefixed `MOSTSIMILAR_` (e.g. `MOSTSIMILAR_THREADS=8`)
//!
//! Command-line flags are applied on top by the caller.
//!
//! ```toml
//! threads = 8
//! metric = "simhash"
//! dedup_threshold = 0.98
//! case_folding = "unicode-bmp"
//! extra_stop_words = ["lorem", "ipsum"]
//! parallel_scoring = true
//! duplicates_dir_name = "Duplicates"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::similarity::Metric;
use crate::text::{CaseFolding, TextRules};

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "MOSTSIMILAR_";

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A layer could not be parsed or a value has the wrong type.
    #[error("Invalid configuration: {0}")]
    Figment(#[from] figment::Error),

    /// A value parsed but is out of range.
    #[error("Invalid configuration value for {key}: {message}")]
    Invalid { key: &'static str, message: String },

    /// The platform config directory is unknown.
    #[error("Failed to determine project directories")]
    NoProjectDirs,

    /// Writing the config file failed.
    #[error("I/O error for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The configuration could not be encoded as TOML.
    #[error("Failed to encode configuration: {0}")]
    Encode(#[from] toml::ser::Error),
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Worker threads; unset means the machine's available parallelism.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
    /// Default similarity metric.
    pub metric: Metric,
    /// Minimum score for `--dedup` without an explicit threshold.
    pub dedup_threshold: f64,
    /// How tokens are case-folded.
    pub case_folding: CaseFolding,
    /// Stop words added to the built-in lists.
    pub extra_stop_words: Vec<String>,
    /// Score on the worker pool rather than the main thread.
    pub parallel_scoring: bool,
    /// Folder (under the scanned root) that receives duplicates.
    pub duplicates_dir_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            threads: None,
            metric: Metric::TfIdf,
            dedup_threshold: 1.0,
            case_folding: CaseFolding::Unicode,
            extra_stop_words: Vec::new(),
            parallel_scoring: true,
            duplicates_dir_name: "Duplicates".to_string(),
        }
    }
}

impl Config {
    /// Load the configuration from the default platform-specific path.
    ///
    /// A missing file is not an error.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a layer is malformed or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let path = match Self::config_path() {
            Ok(path) => Some(path),
            Err(e) => {
                log::debug!("No config directory ({}), using defaults and environment", e);
                None
            }
        };
        Self::load_from(path.as_deref())
    }

    /// Load the configuration with an explicit file in place of the
    /// platform default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a layer is malformed or a value is invalid.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        Self::load_from(Some(path))
    }

    fn load_from(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config: Self = Self::figment(path).extract()?;
        config.validate()?;
        if let Some(path) = path.filter(|p| p.exists()) {
            log::debug!("Loaded configuration from {}", path.display());
        }
        Ok(config)
    }

    /// The layered provider for `path`. A missing file contributes nothing.
    #[must_use]
    pub fn figment(path: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first bad key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.dedup_threshold) {
            return Err(ConfigError::Invalid {
                key: "dedup_threshold",
                message: format!("{} is outside [0, 1]", self.dedup_threshold),
            });
        }
        if self.threads == Some(0) {
            return Err(ConfigError::Invalid {
                key: "threads",
                message: "must be at least 1".to_string(),
            });
        }
        let name = self.duplicates_dir_name.as_str();
        if name.is_empty() || name.contains(['/', '\\']) || name == "." || name == ".." {
            return Err(ConfigError::Invalid {
                key: "duplicates_dir_name",
                message: format!("{name:?} is not a plain folder name"),
            });
        }
        Ok(())
    }

    /// The text rules these settings describe, with command-line overrides.
    ///
    /// `case_folding` replaces the configured mode; `stop_words` are added to
    /// the configured extra stop words.
    #[must_use]
    pub fn text_rules<'a>(
        &'a self,
        case_folding: Option<CaseFolding>,
        stop_words: impl IntoIterator<Item = &'a String>,
    ) -> TextRules {
        TextRules::new(
            case_folding.unwrap_or(self.case_folding),
            self.extra_stop_words.iter().chain(stop_words),
        )
    }

    /// The configuration as a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Encode` if a value cannot be represented.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save the configuration to the default platform-specific path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the directory is unknown or writing fails.
    pub fn save(&self) -> Result<PathBuf, ConfigError> {
        let path = Self::config_path()?;
        self.save_to_path(&path)?;
        Ok(path)
    }

    /// Save the configuration as TOML to `path`, creating parent folders.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if encoding or writing fails.
    pub fn save_to_path(&self, path: &Path) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_error)?;
        }
        let content = self.to_toml()?;
        fs::write(path, content).map_err(io_error)?;
        Ok(())
    }

    /// Get the default platform-specific configuration path.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NoProjectDirs` if no home directory is known.
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let project_dirs =
            ProjectDirs::from("com", "mostsimilar", "mostsimilar").ok_or(ConfigError::NoProjectDirs)?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }
}
