//! Error types for flatmeta-core.

use std::process::ExitStatus;

use flatmeta_config::ConfigError;
use flatmeta_utils::error::FileSystemError;
use miette::Diagnostic;
use thiserror::Error;

use crate::keyfile::KeyfileError;

/// Everything that can go wrong while building a report.
///
/// [`MetaError::NotFound`] is the only variant the orchestration recovers from.
#[derive(Error, Diagnostic, Debug)]
pub enum MetaError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    #[diagnostic(code(flatmeta::filesystem), help("Check permissions of the cache directory"))]
    FileSystem(#[from] FileSystemError),

    #[error("Error while {action}")]
    #[diagnostic(code(flatmeta::io))]
    IoError {
        action: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0} not found")]
    #[diagnostic(code(flatmeta::not_found))]
    NotFound(String),

    #[error("Remote '{0}' not found")]
    #[diagnostic(
        code(flatmeta::remote_not_found),
        help("Pass --url to register the remote in the private installation")
    )]
    RemoteNotFound(String),

    #[error("Invalid remote URL '{url}'")]
    #[diagnostic(code(flatmeta::invalid_url))]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("Invalid ref '{0}'")]
    #[diagnostic(
        code(flatmeta::invalid_ref),
        help("Refs are written as kind/name/arch/branch, e.g. app/org.gnome.Maps/x86_64/stable")
    )]
    InvalidRef(String),

    #[error("Operation cancelled")]
    #[diagnostic(code(flatmeta::cancelled))]
    Cancelled,

    #[error("Failed to run `{command}`")]
    #[diagnostic(
        code(flatmeta::spawn),
        help("Make sure the tool is installed, or point flatpak_bin/ostree_bin at it")
    )]
    CommandSpawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("`{command}` failed ({status}): {stderr}")]
    #[diagnostic(code(flatmeta::command))]
    CommandFailed {
        command: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("Invalid metadata for {reference}")]
    #[diagnostic(code(flatmeta::metadata))]
    Metadata {
        reference: String,
        #[source]
        source: KeyfileError,
    },

    #[error("Invalid manifest for {reference}")]
    #[diagnostic(code(flatmeta::manifest))]
    Manifest {
        reference: String,
        #[source]
        source: serde_json::Error,
    },

    #[error(transparent)]
    #[diagnostic(code(flatmeta::json))]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    #[diagnostic(code(flatmeta::error))]
    Custom(String),
}

impl MetaError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Trait for adding context to IO errors.
pub trait ErrorContext<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, MetaError>
    where
        C: FnOnce() -> String;
}

impl<T> ErrorContext<T> for std::io::Result<T> {
    fn with_context<C>(self, context: C) -> std::result::Result<T, MetaError>
    where
        C: FnOnce() -> String,
    {
        self.map_err(|err| {
            MetaError::IoError {
                action: context(),
                source: err,
            }
        })
    }
}
