//! Vault configuration.
//!
//! Configuration can be loaded from:
//! - a TOML file (default: ~/.config/elo/vault.toml)
//! - environment variables (ELO_* prefixed)
//!
//! ```toml
//! [vault]
//! root = "${HOME}/Notes"
//! sidecar_extension = "json"
//!
//! [vault.places]
//! root_folder = "Lugares"
//! home_country = "España"
//! city_suffix = "(Ciudad)"
//! ```

use std::env;
use std::path::{Path, PathBuf};

use elo_core::defaults::SIDECAR_EXTENSION;
use elo_core::PlaceHierarchyConfig;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for elo_core::Error {
    fn from(err: ConfigError) -> Self {
        elo_core::Error::Config(err.to_string())
    }
}

static ENV_VAR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("env var pattern is valid"));

pub const ENV_VAULT_ROOT: &str = "ELO_VAULT_ROOT";
pub const ENV_PLACES_ROOT: &str = "ELO_PLACES_ROOT";
pub const ENV_HOME_COUNTRY: &str = "ELO_HOME_COUNTRY";
pub const ENV_CITY_SUFFIX: &str = "ELO_CITY_SUFFIX";

/// Settings for one vault.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Directory holding the vault's documents.
    pub root: PathBuf,
    #[serde(default)]
    pub places: PlaceHierarchyConfig,
    /// Extension of block metadata sidecars, without the dot.
    #[serde(default = "VaultConfig::default_sidecar_extension")]
    pub sidecar_extension: String,
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            places: PlaceHierarchyConfig::default(),
            sidecar_extension: Self::default_sidecar_extension(),
        }
    }
}

impl VaultConfig {
    fn default_sidecar_extension() -> String {
        SIDECAR_EXTENSION.to_string()
    }

    /// Get the default config file path.
    ///
    /// Returns: ~/.config/elo/vault.toml
    pub fn default_config_path() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        path.push("elo");
        path.push("vault.toml");
        path
    }

    /// Load configuration from the default path, falling back to environment variables.
    pub fn load() -> ConfigResult<Self> {
        let path = Self::default_config_path();

        if path.exists() {
            info!("Loading vault config from: {}", path.display());
            Self::from_file(&path)
        } else {
            debug!(
                "Config file not found at {}, using environment variables",
                path.display()
            );
            let config = Self::from_env();
            config.validate()?;
            Ok(config)
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse TOML text with a `[vault]` table.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let content = Self::substitute_env_vars(content);

        #[derive(Deserialize)]
        struct TomlRoot {
            vault: VaultConfig,
        }

        let root: TomlRoot = toml::from_str(&content)?;
        root.vault.validate()?;
        Ok(root.vault)
    }

    /// Build configuration from environment variables.
    ///
    /// Unset variables keep their defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(root) = env::var(ENV_VAULT_ROOT) {
            config.root = PathBuf::from(root);
        }
        if let Ok(folder) = env::var(ENV_PLACES_ROOT) {
            config.places.root_folder = folder;
        }
        if let Ok(country) = env::var(ENV_HOME_COUNTRY) {
            config.places.home_country = country;
        }
        if let Ok(suffix) = env::var(ENV_CITY_SUFFIX) {
            config.places.city_suffix = suffix;
        }

        config
    }

    /// Reject empty settings.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::Validation("vault root cannot be empty".to_string()));
        }
        let required = [
            ("places.root_folder", &self.places.root_folder),
            ("places.home_country", &self.places.home_country),
            ("places.city_suffix", &self.places.city_suffix),
            ("sidecar_extension", &self.sidecar_extension),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{} cannot be empty", name)));
            }
        }
        if self.sidecar_extension.starts_with('.') {
            return Err(ConfigError::Validation(
                "sidecar_extension must not start with a dot".to_string(),
            ));
        }
        Ok(())
    }

    /// Substitute environment variables in the format ${VAR_NAME}.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR_RE
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }
}
