//! Locating the BCP segment files of a table.

use std::path::{Path, PathBuf};

use tracing::warn;

use crate::error::SourceError;

/// File name pattern of row-data segments inside a table's data directory.
pub const SEGMENT_PATTERN: &str = "*BCP";

/// List the BCP segment files in a table data directory.
///
/// Returns the matching regular files sorted by path, which is the order the
/// export wrote them in. A directory that does not exist holds no data, so it
/// yields an empty list rather than an error.
///
/// # Errors
/// - `SourceError::FileSystemError` if the directory path is not valid UTF-8
///   or cannot be turned into a pattern
/// - `SourceError::PermissionDenied` / `SourceError::Io` if the directory
///   cannot be inspected
pub fn discover_segments(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, SourceError> {
    let dir = dir.as_ref();

    match std::fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => {
            return Err(SourceError::FileSystemError(format!(
                "{} is not a directory",
                dir.display()
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(SourceError::PermissionDenied(dir.display().to_string()))
        }
        Err(e) => return Err(SourceError::Io(e)),
    }

    let dir_str = dir.to_str().ok_or_else(|| {
        SourceError::FileSystemError(format!("Non UTF-8 directory path: {}", dir.display()))
    })?;
    let pattern = Path::new(&glob::Pattern::escape(dir_str))
        .join(SEGMENT_PATTERN)
        .to_string_lossy()
        .into_owned();

    let entries = glob::glob(&pattern).map_err(|e| {
        SourceError::FileSystemError(format!("Invalid segment pattern '{}': {}", pattern, e))
    })?;

    let mut segments = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) if path.is_file() => segments.push(path),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "Error accessing BCP segment"),
        }
    }

    segments.sort();
    Ok(segments)
}
