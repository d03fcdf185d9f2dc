//! Group registry: the authoritative mapping from group name to canonical
//! storage path, per asset kind.
//!
//! Two strategies implement the same port. `DirRegistry` discovers groups by
//! enumerating the canonical root at call time, so a directory create is a
//! registration. `TomlRegistry` keeps an explicit enumeration persisted as
//! data (`groups.toml`); its file order drives status iteration order, so
//! registering a group updates resolution and iteration in one write.

use crate::asset::is_hidden;
use crate::config::WorkspaceLayout;
use crate::error::LinksetError;
use crate::types::AssetKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Validate a group name: non-empty, no path separators, no hidden-file
/// prefix (which also rules out the parent-directory token).
pub fn validate_group_name(name: &str) -> Result<(), LinksetError> {
    if name.is_empty()
        || name.contains('/')
        || name.contains('\\')
        || name.contains("..")
        || is_hidden(name)
    {
        return Err(LinksetError::InvalidName(name.to_string()));
    }
    Ok(())
}

/// Registry port: resolve group names, list known groups, record new ones.
pub trait GroupRegistry {
    /// Resolve a group name to its canonical path.
    fn resolve(&self, kind: AssetKind, group: &str) -> Result<PathBuf, LinksetError>;

    /// Known group names for one kind, in status iteration order.
    fn groups(&self, kind: AssetKind) -> Result<Vec<String>, LinksetError>;

    /// Record a group. Idempotent; directory creation is the caller's job.
    fn register(&mut self, kind: AssetKind, group: &str) -> Result<(), LinksetError>;
}

/// Dynamic-discovery registry: group membership is directory presence under
/// the canonical root. Resolution never fails for existence, only for name
/// validity.
pub struct DirRegistry {
    layout: WorkspaceLayout,
}

impl DirRegistry {
    pub fn new(layout: WorkspaceLayout) -> Self {
        Self { layout }
    }
}

impl GroupRegistry for DirRegistry {
    fn resolve(&self, kind: AssetKind, group: &str) -> Result<PathBuf, LinksetError> {
        validate_group_name(group)?;
        Ok(self.layout.group_dir(kind, group))
    }

    fn groups(&self, kind: AssetKind) -> Result<Vec<String>, LinksetError> {
        let root = self.layout.kind_root(kind);
        let entries = match fs::read_dir(&root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if is_hidden(&name) {
                continue;
            }
            names.push(name);
        }
        names.sort();
        Ok(names)
    }

    fn register(&mut self, _kind: AssetKind, group: &str) -> Result<(), LinksetError> {
        // Directory presence alone satisfies resolution.
        validate_group_name(group)
    }
}

/// On-disk shape of the static registry file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct GroupsFile {
    #[serde(default)]
    commands: Vec<String>,
    #[serde(default)]
    skills: Vec<String>,
}

impl GroupsFile {
    fn list(&self, kind: AssetKind) -> &Vec<String> {
        match kind {
            AssetKind::Command => &self.commands,
            AssetKind::Skill => &self.skills,
        }
    }

    fn list_mut(&mut self, kind: AssetKind) -> &mut Vec<String> {
        match kind {
            AssetKind::Command => &mut self.commands,
            AssetKind::Skill => &mut self.skills,
        }
    }
}

/// Static-enumeration registry persisted as a `groups.toml` data file.
pub struct TomlRegistry {
    layout: WorkspaceLayout,
    path: PathBuf,
    groups: GroupsFile,
}

impl TomlRegistry {
    /// Load the registry file, or start empty when it does not exist yet.
    pub fn load(layout: WorkspaceLayout) -> Result<Self, LinksetError> {
        let path = layout.groups_file();
        let groups = match fs::read_to_string(&path) {
            Ok(content) => toml::from_str(&content)
                .map_err(|e| LinksetError::Config(format!("invalid {}: {}", path.display(), e)))?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => GroupsFile::default(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            layout,
            path,
            groups,
        })
    }

    fn save(&self) -> Result<(), LinksetError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(&self.groups)
            .map_err(|e| LinksetError::Config(format!("failed to serialize registry: {}", e)))?;
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl GroupRegistry for TomlRegistry {
    fn resolve(&self, kind: AssetKind, group: &str) -> Result<PathBuf, LinksetError> {
        validate_group_name(group)?;
        if !self.groups.list(kind).iter().any(|g| g == group) {
            return Err(LinksetError::UnknownGroup {
                kind,
                group: group.to_string(),
            });
        }
        Ok(self.layout.group_dir(kind, group))
    }

    fn groups(&self, kind: AssetKind) -> Result<Vec<String>, LinksetError> {
        Ok(self.groups.list(kind).clone())
    }

    fn register(&mut self, kind: AssetKind, group: &str) -> Result<(), LinksetError> {
        validate_group_name(group)?;
        let list = self.groups.list_mut(kind);
        if list.iter().any(|g| g == group) {
            return Ok(());
        }
        list.push(group.to_string());
        self.save()
    }
}
