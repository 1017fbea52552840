use std::{fs, path::Path};

use crate::error::{FileSystemError, FileSystemResult};

/// Creates `path` and its parents unless it already is a directory.
///
/// # Errors
///
/// * [`FileSystemError::Io`] if the directory could not be created.
/// * [`FileSystemError::NotADirectory`] if something other than a directory is in the way.
pub fn ensure_dir_exists<P: AsRef<Path>>(path: P) -> FileSystemResult<()> {
    let path = path.as_ref();

    if path.is_dir() {
        return Ok(());
    }
    if path.exists() {
        return Err(FileSystemError::NotADirectory {
            path: path.to_path_buf(),
        });
    }

    fs::create_dir_all(path).map_err(|err| {
        FileSystemError::Io {
            path: path.to_path_buf(),
            action: "create directory",
            source: err,
        }
    })
}

/// Writes `contents` next to `path` and renames it into place, so readers
/// never observe a half-written file.
pub fn write_replace<P: AsRef<Path>>(path: P, contents: &[u8]) -> FileSystemResult<()> {
    let path = path.as_ref();
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let staging = path.with_file_name(format!(".{file_name}.partial"));

    fs::write(&staging, contents).map_err(|err| {
        FileSystemError::Io {
            path: staging.clone(),
            action: "write",
            source: err,
        }
    })?;

    fs::rename(&staging, path).map_err(|err| {
        let _ = fs::remove_file(&staging);
        FileSystemError::Io {
            path: path.to_path_buf(),
            action: "replace",
            source: err,
        }
    })
}
