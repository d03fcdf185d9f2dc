//! Core types for the linkset group/link-state engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The two asset kinds managed by the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    /// Single markdown file with a frontmatter header (`description:` at
    /// minimum). Identity is the file name including extension.
    Command,
    /// Directory with a `SKILL.md` marker at its top level. Identity is the
    /// directory name.
    Skill,
}

impl AssetKind {
    pub const ALL: [AssetKind; 2] = [AssetKind::Command, AssetKind::Skill];

    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Command => "command",
            AssetKind::Skill => "skill",
        }
    }
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-group counts computed by the state inspector.
///
/// `active < total` is a valid partial state: some assets were individually
/// removed or never linked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStatus {
    pub name: String,
    pub active: usize,
    pub total: usize,
    pub enabled: bool,
}

/// A real (non-link) entry found in a runtime directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrayAsset {
    pub kind: AssetKind,
    pub identity: String,
    pub is_dir: bool,
}

/// Result of a reconciler scan: stray assets plus the group names the caller
/// can organize them into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub strays: Vec<StrayAsset>,
    pub command_groups: Vec<String>,
    pub skill_groups: Vec<String>,
}

impl ScanReport {
    pub fn is_clean(&self) -> bool {
        self.strays.is_empty()
    }
}

/// Problems found by the link auditor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkIssueKind {
    /// The link target does not exist.
    Broken,
    /// The link resolves outside the canonical storage tree.
    Foreign,
}

/// A runtime-directory link flagged by the auditor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkIssue {
    pub kind: AssetKind,
    pub identity: String,
    pub issue: LinkIssueKind,
    pub target: String,
}

/// Classification of an unfamiliar entry by the import heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetClass {
    Skill,
    Command,
    Unknown,
}

/// A top-level entry of an external source classified for import.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifiedEntry {
    pub identity: String,
    pub class: AssetClass,
    pub is_dir: bool,
}
