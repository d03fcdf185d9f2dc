//! Reconciler: moves stray runtime assets into canonical storage, registers
//! new groups, and imports external content.
//!
//! Every operation checks its preconditions before mutating anything. The
//! mutation phase itself is best-effort sequential: when link creation fails
//! after a successful relocation the asset already lives canonically and a
//! later `enable` re-establishes the link.

use crate::asset::{self, is_artifact};
use crate::config::WorkspaceLayout;
use crate::error::LinksetError;
use crate::links::{self, relative_target, Materializer};
use crate::registry::{validate_group_name, GroupRegistry};
use crate::types::{AssetKind, ScanReport, StrayAsset};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use walkdir::WalkDir;

pub struct Reconciler;

impl Reconciler {
    /// List real (non-link, non-artifact) entries in both runtime
    /// directories, plus the known group names to organize them into.
    pub fn scan(
        layout: &WorkspaceLayout,
        registry: &dyn GroupRegistry,
    ) -> Result<ScanReport, LinksetError> {
        let mut strays = Vec::new();
        for kind in AssetKind::ALL {
            let runtime = layout.runtime_dir(kind);
            let entries = match fs::read_dir(runtime) {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };
            for entry in entries {
                let entry = entry?;
                let file_type = entry.file_type()?;
                if file_type.is_symlink() {
                    continue;
                }
                let Ok(name) = entry.file_name().into_string() else {
                    continue;
                };
                if is_artifact(&name) {
                    continue;
                }
                strays.push(StrayAsset {
                    kind,
                    identity: name,
                    is_dir: file_type.is_dir(),
                });
            }
        }
        strays.sort_by(|a, b| (a.kind.as_str(), &a.identity).cmp(&(b.kind.as_str(), &b.identity)));
        Ok(ScanReport {
            strays,
            command_groups: registry.groups(AssetKind::Command)?,
            skill_groups: registry.groups(AssetKind::Skill)?,
        })
    }

    /// Relocate a stray runtime asset into canonical storage for `group`,
    /// then immediately re-link it at its original location.
    ///
    /// Distinct precondition failures: `NotFound` (no such runtime entry),
    /// `NotAsset` (entry is already a link), `UnknownGroup` (destination
    /// group directory absent), `Collision` (identity occupied at the
    /// destination). Returns the new canonical path.
    pub fn relocate(
        layout: &WorkspaceLayout,
        registry: &dyn GroupRegistry,
        kind: AssetKind,
        identity: &str,
        group: &str,
    ) -> Result<PathBuf, LinksetError> {
        validate_identity(identity)?;
        let runtime = layout.runtime_dir(kind);
        let source = runtime.join(identity);
        let meta = fs::symlink_metadata(&source)
            .map_err(|_| LinksetError::NotFound(identity.to_string()))?;
        if meta.file_type().is_symlink() {
            return Err(LinksetError::NotAsset(identity.to_string()));
        }
        let group_dir = links::resolve_group_dir(registry, kind, group)?;
        let dest = group_dir.join(identity);
        if fs::symlink_metadata(&dest).is_ok() {
            return Err(LinksetError::Collision {
                identity: identity.to_string(),
                group: group.to_string(),
            });
        }

        fs::rename(&source, &dest)?;
        let target = relative_target(runtime, &dest);
        create_link(&target, &source, meta.is_dir())?;
        info!(kind = %kind, identity, group, "relocated stray asset into canonical storage");
        Ok(dest)
    }

    /// Create and register a group, then auto-enable it so any assets
    /// already present in its canonical directory are linked. Registering an
    /// existing group is a no-op, not an error. Returns the links created.
    pub fn register_group(
        layout: &WorkspaceLayout,
        registry: &mut dyn GroupRegistry,
        kind: AssetKind,
        name: &str,
    ) -> Result<usize, LinksetError> {
        validate_group_name(name)?;
        fs::create_dir_all(layout.group_dir(kind, name))?;
        registry.register(kind, name)?;
        let created = Materializer::enable(layout, &*registry, kind, name)?;
        info!(kind = %kind, group = name, created, "registered group");
        Ok(created)
    }

    /// Copy an external asset into canonical storage for `group`. No linking
    /// happens here; callers run `enable` (or `register_group`) afterward.
    ///
    /// `identity` defaults to the source's file name. Directory sources are
    /// copied whole, minus resource-fork artifacts.
    pub fn import(
        registry: &dyn GroupRegistry,
        kind: AssetKind,
        source: &Path,
        identity: Option<&str>,
        group: &str,
    ) -> Result<PathBuf, LinksetError> {
        let meta = fs::symlink_metadata(source)
            .map_err(|_| LinksetError::NotFound(source.display().to_string()))?;
        let identity = match identity {
            Some(identity) => identity.to_string(),
            None => source
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| LinksetError::InvalidName(source.display().to_string()))?
                .to_string(),
        };
        validate_identity(&identity)?;
        let group_dir = links::resolve_group_dir(registry, kind, group)?;
        let dest = group_dir.join(&identity);
        if fs::symlink_metadata(&dest).is_ok() {
            return Err(LinksetError::Collision {
                identity,
                group: group.to_string(),
            });
        }

        if meta.is_dir() {
            copy_dir(source, &dest)?;
        } else {
            fs::copy(source, &dest)?;
        }
        info!(kind = %kind, identity = %identity, group, "imported asset into canonical storage");
        Ok(dest)
    }
}

/// Identities are bare file names; reject separators and traversal.
fn validate_identity(identity: &str) -> Result<(), LinksetError> {
    if identity.is_empty()
        || identity.contains('/')
        || identity.contains('\\')
        || identity == "."
        || identity == ".."
    {
        return Err(LinksetError::InvalidName(identity.to_string()));
    }
    Ok(())
}

fn copy_dir(source: &Path, dest: &Path) -> Result<(), LinksetError> {
    for entry in WalkDir::new(source) {
        let entry = entry.map_err(|e| {
            LinksetError::Io(e.into_io_error().unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::Other, "walkdir loop")
            }))
        })?;
        if let Some(name) = entry.file_name().to_str() {
            if is_artifact(name) {
                continue;
            }
        }
        let Ok(rel) = entry.path().strip_prefix(source) else {
            continue;
        };
        let target = dest.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

#[cfg(unix)]
fn create_link(target: &Path, link: &Path, _is_dir: bool) -> Result<(), LinksetError> {
    std::os::unix::fs::symlink(target, link)?;
    Ok(())
}

#[cfg(windows)]
fn create_link(target: &Path, link: &Path, is_dir: bool) -> Result<(), LinksetError> {
    if is_dir {
        std::os::windows::fs::symlink_dir(target, link)?;
    } else {
        std::os::windows::fs::symlink_file(target, link)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::SKILL_MARKER;
    use crate::config::LayoutConfig;
    use crate::registry::DirRegistry;

    fn setup() -> (tempfile::TempDir, WorkspaceLayout, DirRegistry) {
        let temp = tempfile::tempdir().unwrap();
        let layout = WorkspaceLayout::resolve(temp.path(), &LayoutConfig::default()).unwrap();
        let registry = DirRegistry::new(layout.clone());
        (temp, layout, registry)
    }

    #[test]
    fn scan_reports_strays_and_groups() {
        let (_temp, layout, registry) = setup();
        fs::create_dir_all(layout.group_dir(AssetKind::Command, "demo")).unwrap();
        let runtime = layout.runtime_dir(AssetKind::Command).to_path_buf();
        fs::create_dir_all(&runtime).unwrap();
        fs::write(runtime.join("stray.md"), "x").unwrap();
        fs::write(runtime.join(".DS_Store"), "x").unwrap();

        let report = Reconciler::scan(&layout, &registry).unwrap();
        assert_eq!(
            report.strays,
            vec![StrayAsset {
                kind: AssetKind::Command,
                identity: "stray.md".to_string(),
                is_dir: false,
            }]
        );
        assert_eq!(report.command_groups, vec!["demo".to_string()]);
        assert!(report.skill_groups.is_empty());
    }

    #[test]
    fn relocate_moves_and_links() {
        let (_temp, layout, registry) = setup();
        fs::create_dir_all(layout.group_dir(AssetKind::Command, "demo")).unwrap();
        let runtime = layout.runtime_dir(AssetKind::Command).to_path_buf();
        fs::create_dir_all(&runtime).unwrap();
        fs::write(runtime.join("stray.md"), "content").unwrap();

        let dest =
            Reconciler::relocate(&layout, &registry, AssetKind::Command, "stray.md", "demo")
                .unwrap();
        assert_eq!(dest, layout.group_dir(AssetKind::Command, "demo").join("stray.md"));
        assert_eq!(fs::read_to_string(&dest).unwrap(), "content");

        let link = runtime.join("stray.md");
        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&link).unwrap(), "content");

        // Second scan reports nothing unorganized.
        let report = Reconciler::scan(&layout, &registry).unwrap();
        assert!(report.is_clean());
    }

    #[test]
    fn relocate_preserves_skill_directory_contents() {
        let (_temp, layout, registry) = setup();
        fs::create_dir_all(layout.group_dir(AssetKind::Skill, "grp")).unwrap();
        let runtime = layout.runtime_dir(AssetKind::Skill).to_path_buf();
        let stray = runtime.join("research");
        fs::create_dir_all(stray.join("references")).unwrap();
        fs::write(stray.join(SKILL_MARKER), "# skill").unwrap();
        fs::write(stray.join("references").join("notes.md"), "notes").unwrap();

        Reconciler::relocate(&layout, &registry, AssetKind::Skill, "research", "grp").unwrap();

        let dest = layout.group_dir(AssetKind::Skill, "grp").join("research");
        assert!(dest.join(SKILL_MARKER).is_file());
        assert_eq!(
            fs::read_to_string(dest.join("references").join("notes.md")).unwrap(),
            "notes"
        );
        // The runtime entry is now a link into the canonical tree.
        assert!(fs::symlink_metadata(runtime.join("research"))
            .unwrap()
            .file_type()
            .is_symlink());
    }

    #[test]
    fn relocate_precondition_failures_are_distinct() {
        let (_temp, layout, registry) = setup();
        fs::create_dir_all(layout.group_dir(AssetKind::Command, "demo")).unwrap();
        let runtime = layout.runtime_dir(AssetKind::Command).to_path_buf();
        fs::create_dir_all(&runtime).unwrap();

        // NotFound
        assert!(matches!(
            Reconciler::relocate(&layout, &registry, AssetKind::Command, "missing.md", "demo"),
            Err(LinksetError::NotFound(_))
        ));

        // NotAsset: the entry is already a link.
        fs::write(runtime.join("real.md"), "x").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink("real.md", runtime.join("linked.md")).unwrap();
        assert!(matches!(
            Reconciler::relocate(&layout, &registry, AssetKind::Command, "linked.md", "demo"),
            Err(LinksetError::NotAsset(_))
        ));

        // UnknownGroup: destination directory absent.
        assert!(matches!(
            Reconciler::relocate(&layout, &registry, AssetKind::Command, "real.md", "ghost"),
            Err(LinksetError::UnknownGroup { .. })
        ));
    }

    #[test]
    fn relocate_collision_leaves_both_sides_untouched() {
        let (_temp, layout, registry) = setup();
        let group_dir = layout.group_dir(AssetKind::Command, "demo");
        fs::create_dir_all(&group_dir).unwrap();
        fs::write(group_dir.join("x.md"), "canonical").unwrap();
        let runtime = layout.runtime_dir(AssetKind::Command).to_path_buf();
        fs::create_dir_all(&runtime).unwrap();
        fs::write(runtime.join("x.md"), "stray").unwrap();

        let result = Reconciler::relocate(&layout, &registry, AssetKind::Command, "x.md", "demo");
        assert!(matches!(result, Err(LinksetError::Collision { .. })));
        assert_eq!(fs::read_to_string(runtime.join("x.md")).unwrap(), "stray");
        assert_eq!(fs::read_to_string(group_dir.join("x.md")).unwrap(), "canonical");
    }

    #[test]
    fn register_group_creates_resolves_and_enables() {
        let (_temp, layout, mut registry) = setup();
        let created =
            Reconciler::register_group(&layout, &mut registry, AssetKind::Skill, "newgrp").unwrap();
        assert_eq!(created, 0);
        assert!(layout.group_dir(AssetKind::Skill, "newgrp").is_dir());
        assert!(registry.resolve(AssetKind::Skill, "newgrp").is_ok());
        assert_eq!(
            registry.groups(AssetKind::Skill).unwrap(),
            vec!["newgrp".to_string()]
        );
    }

    #[test]
    fn register_group_links_preexisting_assets() {
        let (_temp, layout, mut registry) = setup();
        let dir = layout.group_dir(AssetKind::Command, "demo");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("a.md"), "x").unwrap();

        let created =
            Reconciler::register_group(&layout, &mut registry, AssetKind::Command, "demo").unwrap();
        assert_eq!(created, 1);
        assert!(layout.runtime_dir(AssetKind::Command).join("a.md").exists());
    }

    #[test]
    fn register_group_rejects_invalid_names() {
        let (_temp, layout, mut registry) = setup();
        for bad in ["", "a/b", "..", ".hidden"] {
            assert!(matches!(
                Reconciler::register_group(&layout, &mut registry, AssetKind::Command, bad),
                Err(LinksetError::InvalidName(_))
            ));
        }
    }

    #[test]
    fn import_copies_file_and_directory() {
        let (temp, layout, registry) = setup();
        fs::create_dir_all(layout.group_dir(AssetKind::Command, "demo")).unwrap();
        fs::create_dir_all(layout.group_dir(AssetKind::Skill, "demo")).unwrap();

        let external = temp.path().join("external");
        fs::create_dir_all(external.join("pack").join("references")).unwrap();
        fs::write(external.join("go.md"), "---\ndescription: d\n---\n").unwrap();
        fs::write(external.join("pack").join(SKILL_MARKER), "# skill").unwrap();
        fs::write(external.join("pack").join("references").join("r.md"), "r").unwrap();
        fs::write(external.join("pack").join(".DS_Store"), "junk").unwrap();

        let dest = Reconciler::import(
            &registry,
            AssetKind::Command,
            &external.join("go.md"),
            None,
            "demo",
        )
        .unwrap();
        assert!(dest.ends_with("library/commands/demo/go.md"));

        let dest = Reconciler::import(
            &registry,
            AssetKind::Skill,
            &external.join("pack"),
            Some("imported"),
            "demo",
        )
        .unwrap();
        assert!(dest.join(SKILL_MARKER).is_file());
        assert!(dest.join("references").join("r.md").is_file());
        assert!(!dest.join(".DS_Store").exists());

        // Original source is untouched; import copies.
        assert!(external.join("pack").join(SKILL_MARKER).is_file());
    }

    #[test]
    fn import_collision_is_rejected() {
        let (temp, layout, registry) = setup();
        let group_dir = layout.group_dir(AssetKind::Command, "demo");
        fs::create_dir_all(&group_dir).unwrap();
        fs::write(group_dir.join("go.md"), "existing").unwrap();
        let source = temp.path().join("go.md");
        fs::write(&source, "incoming").unwrap();

        let result = Reconciler::import(&registry, AssetKind::Command, &source, None, "demo");
        assert!(matches!(result, Err(LinksetError::Collision { .. })));
        assert_eq!(fs::read_to_string(group_dir.join("go.md")).unwrap(), "existing");
    }
}
