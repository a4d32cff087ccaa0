//! Markdown report files.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use tracing::{info, instrument};

use reviewcrew_shared::{Result, ReviewCrewError, Table};

use crate::{WrittenArtifact, commit_temp, temp_path_for};

/// How to treat an existing file at the target path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the file.
    #[default]
    Overwrite,
    /// Add to the end of the file, separated from prior content by a blank line.
    Append,
}

/// Render `table` as Markdown and write it to `path`.
#[instrument(skip(table), fields(path = %path.display(), rows = table.len(), ?mode))]
pub fn write_markdown(table: &Table, path: &Path, mode: WriteMode) -> Result<WrittenArtifact> {
    let rendered = reviewcrew_markdown::render_table(table);

    let bytes = match mode {
        WriteMode::Overwrite => overwrite(path, &rendered)?,
        WriteMode::Append => append(path, &rendered)?,
    };

    info!(bytes, "markdown table written");
    Ok(WrittenArtifact {
        path: path.to_path_buf(),
        rows: table.len(),
        bytes,
    })
}

fn overwrite(path: &Path, content: &str) -> Result<usize> {
    let temp = temp_path_for(path);
    if let Err(e) = std::fs::write(&temp, content) {
        let _ = std::fs::remove_file(&temp);
        return Err(ReviewCrewError::io(path, e));
    }
    commit_temp(&temp, path)?;
    Ok(content.len())
}

fn append(path: &Path, content: &str) -> Result<usize> {
    let has_content = std::fs::metadata(path).map(|m| m.len() > 0).unwrap_or(false);

    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| ReviewCrewError::io(path, e))?;

    let separator = if has_content && !content.is_empty() { "\n\n" } else { "" };
    file.write_all(separator.as_bytes())
        .and_then(|_| file.write_all(content.as_bytes()))
        .and_then(|_| file.flush())
        .map_err(|e| ReviewCrewError::io(path, e))?;

    Ok(separator.len() + content.len())
}
