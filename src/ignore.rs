//! Project ignore-file maintenance and runtime-directory hygiene.

use crate::asset::is_artifact;
use crate::error::LinksetError;
use std::fs;
use std::path::Path;

/// Ensure `pattern` appears in the ignore file, creating the file if needed.
///
/// Append-only and duplicate-free: matching is on trimmed whole lines.
/// Returns true when a line was added.
pub fn ensure_ignored(ignore_file: &Path, pattern: &str) -> Result<bool, LinksetError> {
    let existing = match fs::read_to_string(ignore_file) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    if existing.lines().any(|line| line.trim() == pattern) {
        return Ok(false);
    }
    let mut updated = existing;
    if !updated.is_empty() && !updated.ends_with('\n') {
        updated.push('\n');
    }
    updated.push_str(pattern);
    updated.push('\n');
    fs::write(ignore_file, updated)?;
    tracing::debug!(pattern, file = %ignore_file.display(), "added ignore pattern");
    Ok(true)
}

/// Remove resource-fork artifact files from a directory. Missing directory
/// is a no-op. Returns the number of files removed.
pub fn purge_artifacts(dir: &Path) -> Result<usize, LinksetError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e.into()),
    };
    let mut removed = 0;
    for entry in entries {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if is_artifact(name) && entry.file_type()?.is_file() {
            fs::remove_file(entry.path())?;
            removed += 1;
        }
    }
    Ok(removed)
}
