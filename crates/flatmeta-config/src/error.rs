use std::path::PathBuf;

use flatmeta_utils::error::{FileSystemError, PathError, UtilsError};
use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration file {}: {source}", path.display())]
    #[diagnostic(
        code(flatmeta_config::toml_deserialize),
        help("Check your config.toml syntax and structure")
    )]
    TomlDeError {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to read configuration file {}", path.display())]
    #[diagnostic(code(flatmeta_config::io))]
    IoError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("poll_interval_ms must be greater than zero")]
    #[diagnostic(
        code(flatmeta_config::poll_interval),
        help("Remove the key to use the default of 50 milliseconds")
    )]
    InvalidPollInterval,

    #[error("{0} must not be empty")]
    #[diagnostic(code(flatmeta_config::empty_value))]
    EmptyValue(&'static str),

    #[error(transparent)]
    #[diagnostic(code(flatmeta_config::utils))]
    Utils(#[from] UtilsError),
}

impl From<PathError> for ConfigError {
    fn from(err: PathError) -> Self {
        Self::Utils(UtilsError::Path(err))
    }
}

impl From<FileSystemError> for ConfigError {
    fn from(err: FileSystemError) -> Self {
        Self::Utils(UtilsError::FileSystem(err))
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;
