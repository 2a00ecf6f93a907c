//! Layered settings for the dupefind binary.
//!
//! Settings are merged from, lowest priority first:
//!
//! 1. Built-in defaults ([`Settings::default`])
//! 2. A TOML file: `--config PATH`, else `config.toml` in the platform
//!    config directory (e.g. `~/.config/dupefind/` on Linux)
//! 3. Environment variables prefixed `DUPEFIND_`, with `__` for nesting
//!    (`DUPEFIND_FILTER__MIN_SIZE=2`)
//! 4. Explicit command-line flags, applied by the CLI layer
//!
//! The file is only read; nothing here writes settings back.
//!
//! # Example file
//!
//! ```toml
//! hash_threads = 4
//! unreadable = "exclude"
//! output = "csv"
//!
//! [filter]
//! min_size = 1.0
//! extensions = ["jpg", "png"]
//! include_subfolders = true
//!
//! [filter.modified]
//! operator = ">="
//! date = "2024-01-01"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::duplicates::UnreadablePolicy;
use crate::output::OutputFormat;
use crate::scanner::FilterConfig;
use crate::session::SessionConfig;

/// Prefix of environment variables read into [`Settings`].
pub const ENV_PREFIX: &str = "DUPEFIND_";

/// Errors raised while loading settings.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// A configuration file named on the command line does not exist.
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    /// Merging or deserializing the layers failed.
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// User settings profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default filter criteria.
    pub filter: FilterConfig,
    /// Threads used to hash one size bucket in duplicate search.
    pub hash_threads: usize,
    /// Handling of files that cannot be hashed.
    pub unreadable: UnreadablePolicy,
    /// Minimum milliseconds between progress updates.
    pub progress_interval_ms: u64,
    /// Default output format.
    pub output: OutputFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            filter: FilterConfig::default(),
            hash_threads: 1,
            unreadable: UnreadablePolicy::default(),
            progress_interval_ms: 50,
            output: OutputFormat::default(),
        }
    }
}

impl Settings {
    /// Platform config file location, if a home directory can be found.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "dupefind", "dupefind")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Build the layered figment without extracting it.
    ///
    /// `file` replaces the default config file location when given.
    #[must_use]
    pub fn figment(file: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));

        match file.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => {
                log::debug!("Reading settings from {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => log::debug!("No config directory available, skipping settings file"),
        }

        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load settings from every layer.
    ///
    /// A missing default config file is not an error; a missing file passed
    /// explicitly is.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the explicit file is missing or any layer
    /// fails to parse.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = file {
            if !path.is_file() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
        }
        Self::from_figment(&Self::figment(file))
    }

    /// Extract settings from an already built figment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] if extraction fails.
    pub fn from_figment(figment: &Figment) -> Result<Self, ConfigError> {
        let mut settings: Settings = figment.extract().map_err(Box::new)?;
        settings.filter = settings.filter.normalized();
        settings.hash_threads = settings.hash_threads.max(1);
        Ok(settings)
    }

    /// Progress throttle as a duration.
    #[must_use]
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    /// Engine settings derived from this profile.
    #[must_use]
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default()
            .with_progress_interval(self.progress_interval())
            .with_hash_threads(self.hash_threads)
            .with_unreadable(self.unreadable)
    }
}
