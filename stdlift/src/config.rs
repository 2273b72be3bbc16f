use log::warn;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants::{ALT_CONFIG_FILENAME, CONFIG_FILENAME};
use crate::version::{GoVersion, VersionError};

/// A configuration file could not be used.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("cannot read {path}: {source}")]
    Read {
        /// File path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// The file is not valid TOML or has wrongly typed keys.
    #[error("invalid config {path}: {source}")]
    Parse {
        /// File path.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// `go_version` does not parse.
    #[error("invalid go_version: {0}")]
    GoVersion(#[from] VersionError),
}

#[derive(Debug, Deserialize, Default, Clone)]
/// Top-level configuration struct.
pub struct Config {
    #[serde(default)]
    /// The `[stdlift]` section.
    pub stdlift: StdliftConfig,
    /// The file this was loaded from, `None` for defaults.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
/// Configuration options for stdlift.
pub struct StdliftConfig {
    /// Go version to assume when a file's module declares none, e.g. `"1.21"`.
    pub go_version: Option<String>,
    /// Folders to exclude, on top of the defaults.
    pub exclude_folders: Option<Vec<String>>,
    /// Whether to analyze `_test.go` files.
    pub include_tests: Option<bool>,
    /// Rule IDs, import paths or `path.Symbol` names to ignore.
    pub ignore: Option<Vec<String>>,
}

impl StdliftConfig {
    /// The parsed `go_version`, if set.
    pub fn go_version(&self) -> Result<Option<GoVersion>, ConfigError> {
        self.go_version
            .as_deref()
            .map(str::parse::<GoVersion>)
            .transpose()
            .map_err(ConfigError::from)
    }
}

impl Config {
    /// Loads configuration from the current directory upwards.
    #[must_use]
    pub fn load() -> Self {
        Self::load_from_path(Path::new("."))
    }

    /// Read one configuration file.
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.stdlift.go_version()?;
        config.config_file_path = Some(path.to_path_buf());
        Ok(config)
    }

    /// Loads configuration starting from a specific path and traversing up.
    ///
    /// The first config file found wins. A broken file is reported and yields
    /// defaults.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        let mut current = path.to_path_buf();
        if current.is_file() {
            current.pop();
        }

        loop {
            for name in [CONFIG_FILENAME, ALT_CONFIG_FILENAME] {
                let candidate = current.join(name);
                if !candidate.is_file() {
                    continue;
                }
                return match Self::read(&candidate) {
                    Ok(config) => config,
                    Err(err) => {
                        warn!("{err}; using defaults");
                        Self::default()
                    }
                };
            }

            if !current.pop() {
                break;
            }
        }

        Self::default()
    }
}
