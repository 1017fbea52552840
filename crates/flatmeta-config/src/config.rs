use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use flatmeta_utils::path::{default_cache_dir, default_config_file, resolve_path};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

pub const CONFIG_ENV: &str = "FLATPAK_REMOTE_METADATA_CONFIG";
pub const CACHE_ENV: &str = "FLATPAK_REMOTE_METADATA_CACHE";
pub const FLATPAK_ENV: &str = "FLATPAK_REMOTE_METADATA_FLATPAK";
pub const OSTREE_ENV: &str = "FLATPAK_REMOTE_METADATA_OSTREE";

const DEFAULT_FLATPAK_BIN: &str = "flatpak";
const DEFAULT_OSTREE_BIN: &str = "ostree";
const DEFAULT_POLL_INTERVAL_MS: u64 = 50;

/// Tool configuration, read from `config.toml`.
///
/// Every key is optional; environment variables take precedence over the file.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Private cache holding the Flatpak installation used for queries.
    /// Default: $XDG_CACHE_HOME/flatpak-remote-metadata
    pub cache_path: Option<String>,

    /// `flatpak` executable.
    /// Default: flatpak
    pub flatpak_bin: Option<String>,

    /// `ostree` executable.
    /// Default: ostree
    pub ostree_bin: Option<String>,

    /// How often a running subprocess is checked for completion or cancellation.
    /// Default: 50
    pub poll_interval_ms: Option<u64>,
}

/// Config file location: `$FLATPAK_REMOTE_METADATA_CONFIG`, else the XDG default.
pub fn config_path() -> PathBuf {
    match std::env::var(CONFIG_ENV) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => default_config_file(),
    }
}

impl Config {
    /// Loads the configuration from `path`, or from [`config_path`] when `None`.
    ///
    /// A missing file yields the defaults; an unreadable or malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = path.map(Path::to_path_buf).unwrap_or_else(config_path);

        let mut config = match fs::read_to_string(&path) {
            Ok(content) => {
                debug!("Loading configuration from {}", path.display());
                toml::from_str(&content).map_err(|source| {
                    ConfigError::TomlDeError {
                        path: path.clone(),
                        source,
                    }
                })?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                debug!("No configuration at {}, using defaults", path.display());
                Self::default()
            }
            Err(source) => {
                return Err(ConfigError::IoError {
                    path,
                    source,
                })
            }
        };

        config.resolve()?;
        Ok(config)
    }

    pub fn resolve(&mut self) -> Result<()> {
        if self.poll_interval_ms == Some(0) {
            return Err(ConfigError::InvalidPollInterval);
        }
        if self.flatpak_bin.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::EmptyValue("flatpak_bin"));
        }
        if self.ostree_bin.as_deref().is_some_and(str::is_empty) {
            return Err(ConfigError::EmptyValue("ostree_bin"));
        }

        self.poll_interval_ms.get_or_insert(DEFAULT_POLL_INTERVAL_MS);
        Ok(())
    }

    pub fn get_cache_path(&self) -> Result<PathBuf> {
        if let Some(env_path) = std::env::var(CACHE_ENV).ok().filter(|p| !p.is_empty()) {
            return Ok(resolve_path(&env_path)?);
        }
        match &self.cache_path {
            Some(cache_path) => Ok(resolve_path(cache_path)?),
            None => Ok(default_cache_dir()),
        }
    }

    /// Root of the private Flatpak installation, `<cache>/inst`.
    pub fn get_installation_path(&self) -> Result<PathBuf> {
        Ok(self.get_cache_path()?.join("inst"))
    }

    /// OSTree repository inside the private installation.
    pub fn get_repo_path(&self) -> Result<PathBuf> {
        Ok(self.get_installation_path()?.join("repo"))
    }

    pub fn flatpak_bin(&self) -> String {
        std::env::var(FLATPAK_ENV)
            .ok()
            .filter(|bin| !bin.is_empty())
            .or_else(|| self.flatpak_bin.clone())
            .unwrap_or_else(|| DEFAULT_FLATPAK_BIN.to_string())
    }

    pub fn ostree_bin(&self) -> String {
        std::env::var(OSTREE_ENV)
            .ok()
            .filter(|bin| !bin.is_empty())
            .or_else(|| self.ostree_bin.clone())
            .unwrap_or_else(|| DEFAULT_OSTREE_BIN.to_string())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.unwrap_or(DEFAULT_POLL_INTERVAL_MS))
    }
}
