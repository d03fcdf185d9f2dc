//! Asset-kind rules: canonical enumeration, the skill marker file, command
//! frontmatter parsing, and the classification heuristics used by the
//! importer.
//!
//! All enumeration here is deterministic: entries are sorted by identity so
//! repeated runs produce identical orderings.

use crate::error::LinksetError;
use crate::types::{AssetClass, AssetKind, ClassifiedEntry};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Marker file whose presence at a directory's top level identifies a skill.
pub const SKILL_MARKER: &str = "SKILL.md";

/// Frontmatter delimiter line for command files.
const HEADER_DELIMITER: &str = "---";

/// Platform resource-fork artifacts that are never treated as assets.
pub fn is_artifact(name: &str) -> bool {
    name == ".DS_Store" || name.starts_with("._")
}

/// Hidden entries (dot-prefixed) are excluded from group discovery.
pub fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// A canonical entry of a group, as enumerated for linking.
#[derive(Debug, Clone)]
pub struct AssetEntry {
    /// Runtime-visible identity: file or directory name, no group prefix.
    pub identity: String,
    /// Canonical (group-qualified) path of the entry.
    pub path: PathBuf,
    pub is_dir: bool,
}

/// Enumerate the assets of a canonical group directory.
///
/// Commands are the regular files of the directory; skills are its immediate
/// subdirectories. Resource-fork artifacts are skipped. Entries with
/// non-UTF-8 names are skipped with a warning rather than failing the whole
/// enumeration.
pub fn enumerate(kind: AssetKind, group_dir: &Path) -> Result<Vec<AssetEntry>, LinksetError> {
    let mut entries = Vec::new();
    for entry in fs::read_dir(group_dir)? {
        let entry = entry?;
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(raw) => {
                tracing::warn!(entry = ?raw, "skipping non-UTF-8 canonical entry");
                continue;
            }
        };
        if is_artifact(&name) {
            continue;
        }
        let file_type = entry.file_type()?;
        let wanted = match kind {
            AssetKind::Command => file_type.is_file(),
            AssetKind::Skill => file_type.is_dir(),
        };
        if !wanted {
            continue;
        }
        entries.push(AssetEntry {
            identity: name,
            path: entry.path(),
            is_dir: file_type.is_dir(),
        });
    }
    entries.sort_by(|a, b| a.identity.cmp(&b.identity));
    Ok(entries)
}

/// Parsed command frontmatter: a `description` plus any other recognized
/// `key: value` fields between the two delimiter lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandHeader {
    pub description: String,
    pub fields: BTreeMap<String, String>,
}

impl CommandHeader {
    /// Parse the header block of a command file.
    ///
    /// Returns `None` for any malformed header (missing delimiters, no
    /// `description` field): classification treats such files as unknown,
    /// a hard error would make one stray byte poison a whole import.
    pub fn parse(text: &str) -> Option<CommandHeader> {
        let mut lines = text.lines();
        if lines.next()?.trim_end() != HEADER_DELIMITER {
            return None;
        }
        let mut fields = BTreeMap::new();
        let mut closed = false;
        for line in lines {
            if line.trim_end() == HEADER_DELIMITER {
                closed = true;
                break;
            }
            let (key, value) = line.split_once(':')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            fields.insert(key.to_string(), value.trim().to_string());
        }
        if !closed {
            return None;
        }
        let description = fields.get("description")?.clone();
        Some(CommandHeader {
            description,
            fields,
        })
    }
}

/// Classify a single filesystem entry using the marker-file / frontmatter
/// heuristics.
pub fn classify_path(path: &Path) -> AssetClass {
    if path.is_dir() {
        if path.join(SKILL_MARKER).is_file() {
            return AssetClass::Skill;
        }
        return AssetClass::Unknown;
    }
    if path.extension().and_then(|e| e.to_str()) != Some("md") {
        return AssetClass::Unknown;
    }
    match fs::read_to_string(path) {
        Ok(text) if CommandHeader::parse(&text).is_some() => AssetClass::Command,
        _ => AssetClass::Unknown,
    }
}

/// Classify the top-level contents of a directory (an imported repository
/// copy, typically) into skills, commands, and unknowns.
pub fn classify_entries(dir: &Path) -> Result<Vec<ClassifiedEntry>, LinksetError> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let name = match entry.file_name().into_string() {
            Ok(name) => name,
            Err(_) => continue,
        };
        if is_artifact(&name) || is_hidden(&name) {
            continue;
        }
        let path = entry.path();
        out.push(ClassifiedEntry {
            class: classify_path(&path),
            is_dir: path.is_dir(),
            identity: name,
        });
    }
    out.sort_by(|a, b| a.identity.cmp(&b.identity));
    Ok(out)
}
