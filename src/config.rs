//! Server configuration: TOML file, then environment, then CLI overrides.

use std::path::Path;

use derive_getters::Getters;
use derive_more::{Display, Error};
use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

/// Environment variable overriding [`PickemConfig::database_path`].
pub const ENV_DATABASE_PATH: &str = "PICKEM_DATABASE_PATH";
/// Environment variable overriding [`PickemConfig::host`].
pub const ENV_HOST: &str = "PICKEM_HOST";
/// Environment variable overriding [`PickemConfig::port`].
pub const ENV_PORT: &str = "PICKEM_PORT";
/// Environment variable overriding [`PickemConfig::log_filter`].
pub const ENV_LOG: &str = "PICKEM_LOG";

/// Runtime configuration for the pick'em server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Setters, Serialize, Deserialize)]
#[setters(prefix = "with_", into)]
#[serde(default)]
pub struct PickemConfig {
    /// SQLite database file.
    database_path: String,

    /// Interface to bind.
    host: String,

    /// Port to bind.
    port: u16,

    /// `tracing_subscriber::EnvFilter` directive used when `RUST_LOG` is unset.
    log_filter: String,
}

impl Default for PickemConfig {
    fn default() -> Self {
        Self {
            database_path: "pickem.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            log_filter: "info,pickem=debug".to_string(),
        }
    }
}

impl PickemConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads `path` if given and present, falling back to defaults, then
    /// applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file is malformed or an override is invalid.
    #[instrument(skip(path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) if path.exists() => Self::from_file(path)?,
            Some(path) => {
                debug!(path = %path.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };
        let config = config.apply_env(|key| std::env::var(key).ok())?;
        debug!(
            database_path = %config.database_path,
            host = %config.host,
            port = config.port,
            "Configuration loaded"
        );
        Ok(config)
    }

    /// Applies overrides from `lookup`, which maps an environment variable
    /// name to its value.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if `PICKEM_PORT` is not a port number or an
    /// override leaves the configuration invalid.
    #[instrument(skip(self, lookup))]
    pub fn apply_env<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_DATABASE_PATH) {
            debug!(%path, "Overriding database path from environment");
            self.database_path = path;
        }
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port.parse().map_err(|e| {
                warn!(%port, "Invalid port in environment");
                ConfigError::new(format!("Invalid {}='{}': {}", ENV_PORT, port, e))
            })?;
        }
        if let Some(filter) = lookup(ENV_LOG) {
            self.log_filter = filter;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.trim().is_empty() {
            return Err(ConfigError::new("database_path must not be empty".to_string()));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::new("host must not be empty".to_string()));
        }
        Ok(())
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
