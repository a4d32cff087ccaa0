//! Output-file writers for review tables.
//!
//! Every writer follows the same rule: the caller either gets a complete file
//! at the target path or an error. Overwrites go through a sibling temp file
//! and a rename, so a failed write never leaves a truncated report behind.

mod csv_file;
mod markdown_file;

use std::path::{Path, PathBuf};

use reviewcrew_shared::{Result, ReviewCrewError};

pub use csv_file::{encode_csv, read_csv, write_csv};
pub use markdown_file::{WriteMode, write_markdown};

/// Metadata about a file that was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenArtifact {
    /// Where the file landed.
    pub path: PathBuf,
    /// Number of data rows written (header excluded).
    pub rows: usize,
    /// Bytes written by this call.
    pub bytes: usize,
}

/// Sibling temp path used for atomic replacement, e.g. `out.csv` → `.out.csv.tmp`.
fn temp_path_for(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    target.with_file_name(format!(".{name}.tmp"))
}

/// Move a finished temp file over the target, cleaning up on failure.
fn commit_temp(temp: &Path, target: &Path) -> Result<()> {
    std::fs::rename(temp, target).map_err(|e| {
        let _ = std::fs::remove_file(temp);
        ReviewCrewError::io(target, e)
    })
}

#[cfg(test)]
pub(crate) fn test_dir(prefix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("{prefix}-{}", uuid::Uuid::now_v7()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
