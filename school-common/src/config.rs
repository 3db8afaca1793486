//! Service configuration loading
//!
//! Each setting is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ENV_CONFIG: &str = "SCHOOL_CONFIG";
pub const ENV_BIND_ADDR: &str = "SCHOOL_BIND_ADDR";
pub const ENV_DATABASE: &str = "SCHOOL_DATABASE";
pub const ENV_API_KEY: &str = "SCHOOL_API_KEY";
pub const ENV_MAX_UPLOAD_BYTES: &str = "SCHOOL_MAX_UPLOAD_BYTES";
pub const ENV_LOG_LEVEL: &str = "SCHOOL_LOG_LEVEL";

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// HTTP listen address
    pub bind_addr: SocketAddr,
    /// SQLite database file
    pub database_path: PathBuf,
    /// Shared secret for `/secure` routes. `None` means load or generate
    /// one from the settings table.
    pub api_key: Option<String>,
    /// Upper bound for `/upload-csv` request bodies
    pub max_upload_bytes: usize,
    /// Default tracing filter directive
    pub log_level: String,
}

/// Compiled defaults for the current platform
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
    pub max_upload_bytes: usize,
    pub log_level: String,
}

impl CompiledDefaults {
    pub fn for_current_platform() -> Self {
        let data_dir = dirs::data_local_dir()
            .map(|d| d.join("school"))
            .unwrap_or_else(|| PathBuf::from("./school_data"));

        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8000)),
            database_path: data_dir.join("school.db"),
            max_upload_bytes: 10 * 1024 * 1024,
            log_level: "info".to_string(),
        }
    }
}

/// Values given on the command line (all optional)
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub bind_addr: Option<String>,
    pub database_path: Option<PathBuf>,
    pub api_key: Option<String>,
    pub max_upload_bytes: Option<usize>,
    pub log_level: Option<String>,
}

/// On-disk TOML configuration. Every key is optional.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub bind_addr: Option<String>,
    pub database_path: Option<PathBuf>,
    pub api_key: Option<String>,
    pub max_upload_bytes: Option<usize>,
    pub log_level: Option<String>,
}

impl TomlConfig {
    /// Parse a TOML config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            Error::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }
}

impl ServiceConfig {
    /// Resolve configuration from CLI overrides, environment, TOML file and defaults
    pub fn resolve(cli: ConfigOverrides) -> Result<Self> {
        let file = match locate_config_file(cli.config_file.as_deref())? {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                TomlConfig::load(&path)?
            }
            None => {
                debug!("No config file found, using environment and defaults");
                TomlConfig::default()
            }
        };

        Self::merge(cli, file, CompiledDefaults::for_current_platform())
    }

    /// Merge the layers. Environment is read here so it sits between CLI and file.
    pub fn merge(
        cli: ConfigOverrides,
        file: TomlConfig,
        defaults: CompiledDefaults,
    ) -> Result<Self> {
        let bind_addr = match cli
            .bind_addr
            .or_else(|| env_string(ENV_BIND_ADDR))
            .or(file.bind_addr)
        {
            Some(raw) => raw
                .parse::<SocketAddr>()
                .map_err(|e| Error::Config(format!("Invalid bind address '{}': {}", raw, e)))?,
            None => defaults.bind_addr,
        };

        let database_path = cli
            .database_path
            .or_else(|| env_string(ENV_DATABASE).map(PathBuf::from))
            .or(file.database_path)
            .unwrap_or(defaults.database_path);

        let api_key = cli
            .api_key
            .or_else(|| env_string(ENV_API_KEY))
            .or(file.api_key)
            .filter(|key| !key.trim().is_empty());

        let max_upload_bytes = match cli.max_upload_bytes {
            Some(n) => n,
            None => match env_string(ENV_MAX_UPLOAD_BYTES) {
                Some(raw) => raw.parse::<usize>().map_err(|e| {
                    Error::Config(format!("Invalid {} '{}': {}", ENV_MAX_UPLOAD_BYTES, raw, e))
                })?,
                None => file.max_upload_bytes.unwrap_or(defaults.max_upload_bytes),
            },
        };

        let log_level = cli
            .log_level
            .or_else(|| env_string(ENV_LOG_LEVEL))
            .or(file.log_level)
            .unwrap_or(defaults.log_level);

        Ok(Self {
            bind_addr,
            database_path,
            api_key,
            max_upload_bytes,
            log_level,
        })
    }
}

/// Find the config file: explicit path, then `SCHOOL_CONFIG`, then the
/// per-user config directory. Explicit paths must exist.
fn locate_config_file(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        return require_exists(path.to_path_buf()).map(Some);
    }

    if let Some(path) = env_string(ENV_CONFIG) {
        return require_exists(PathBuf::from(path)).map(Some);
    }

    Ok(dirs::config_dir()
        .map(|d| d.join("school").join("config.toml"))
        .filter(|p| p.exists()))
}

fn require_exists(path: PathBuf) -> Result<PathBuf> {
    if path.exists() {
        Ok(path)
    } else {
        Err(Error::Config(format!("Config file not found: {}", path.display())))
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}
