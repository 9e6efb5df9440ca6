//! TOML configuration for the `input-sync` peer.
//!
//! Reads `AppConfig` from the platform-appropriate config file:
//! - Windows:  `%APPDATA%\InputSync\config.toml`
//! - Linux:    `$XDG_CONFIG_HOME/inputsync/config.toml` (or `~/.config/...`)
//! - macOS:    `~/Library/Application Support/InputSync/config.toml`
//!
//! Every table and field is optional; a missing file means all defaults.
//!
//! ```toml
//! log_level = "debug"
//!
//! [manager]
//! queue_warn_threshold = 1024
//!
//! [sync]
//! peer_address = "192.168.1.20"
//! port = 1211
//!
//! [devices]
//! pads = 2
//! ```

use std::path::{Path, PathBuf};

use input_core::ManagerConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::network::DEFAULT_PORT;

/// Error type for configuration file operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The platform config directory could not be determined.
    #[error("could not determine platform config directory")]
    NoPlatformConfigDir,

    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The config could not be serialized to TOML.
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

// ── Config schema types ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// `tracing` filter used when `RUST_LOG` is unset.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub manager: ManagerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub devices: DevicesConfig,
    #[serde(default)]
    pub frame: FrameConfig,
}

/// Network settings for both directions of state sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SyncConfig {
    /// Address `receive` binds to.  `"0.0.0.0"` binds all interfaces.
    #[serde(default = "default_listen_address")]
    pub listen_address: String,
    /// Host `send` connects to.
    #[serde(default = "default_peer_address")]
    pub peer_address: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Messages buffered for the socket before changes are dropped.
    #[serde(default = "default_outbound_capacity")]
    pub outbound_capacity: usize,
}

/// Which devices the peer creates at startup, in this order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DevicesConfig {
    #[serde(default = "default_true")]
    pub keyboard: bool,
    #[serde(default = "default_true")]
    pub mouse: bool,
    #[serde(default)]
    pub raw_mouse: bool,
    #[serde(default)]
    pub pads: u32,
    #[serde(default)]
    pub touch: bool,
    #[serde(default)]
    pub builtin: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameConfig {
    /// Updates per second.
    #[serde(default = "default_rate_hz")]
    pub rate_hz: u32,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_listen_address() -> String {
    "0.0.0.0".to_string()
}
fn default_peer_address() -> String {
    "127.0.0.1".to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_outbound_capacity() -> usize {
    1024
}
fn default_true() -> bool {
    true
}
fn default_rate_hz() -> u32 {
    60
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            manager: ManagerConfig::default(),
            sync: SyncConfig::default(),
            devices: DevicesConfig::default(),
            frame: FrameConfig::default(),
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            peer_address: default_peer_address(),
            port: default_port(),
            outbound_capacity: default_outbound_capacity(),
        }
    }
}

impl Default for DevicesConfig {
    fn default() -> Self {
        Self {
            keyboard: true,
            mouse: true,
            raw_mouse: false,
            pads: 0,
            touch: false,
            builtin: false,
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            rate_hz: default_rate_hz(),
        }
    }
}

// ── Config repository ─────────────────────────────────────────────────────────

/// Determines the platform-appropriate directory for the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] when the platform config base
/// directory cannot be determined from the environment.
pub fn config_dir() -> Result<PathBuf, ConfigError> {
    platform_config_dir().ok_or(ConfigError::NoPlatformConfigDir)
}

/// Resolves the full path to the config file.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformConfigDir`] if the base directory cannot be
/// determined.
pub fn config_file_path() -> Result<PathBuf, ConfigError> {
    Ok(config_dir()?.join("config.toml"))
}

/// Loads `AppConfig` from the platform config file.
///
/// # Errors
///
/// See [`load_config_from`].
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from(&config_file_path()?)
}

/// Loads `AppConfig` from `path`, returning `AppConfig::default()` if the
/// file does not exist.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors other than "not found",
/// and [`ConfigError::Parse`] if the TOML is malformed.
pub fn load_config_from(path: &Path) -> Result<AppConfig, ConfigError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(toml::from_str(&content)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(source) => Err(ConfigError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Persists `config` to the platform config file.
///
/// # Errors
///
/// See [`save_config_to`].
pub fn save_config(config: &AppConfig) -> Result<(), ConfigError> {
    save_config_to(config, &config_file_path()?)
}

/// Writes `config` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system failures or
/// [`ConfigError::Serialize`] if serialization fails.
pub fn save_config_to(config: &AppConfig, path: &Path) -> Result<(), ConfigError> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir).map_err(|source| ConfigError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn platform_config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        std::env::var_os("APPDATA").map(|p| PathBuf::from(p).join("InputSync"))
    }

    #[cfg(target_os = "linux")]
    {
        let base = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|h| PathBuf::from(h).join(".config")))?;
        Some(base.join("inputsync"))
    }

    #[cfg(target_os = "macos")]
    {
        std::env::var_os("HOME").map(|h| {
            PathBuf::from(h)
                .join("Library")
                .join("Application Support")
                .join("InputSync")
        })
    }

    #[cfg(not(any(target_os = "windows", target_os = "linux", target_os = "macos")))]
    {
        None
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
