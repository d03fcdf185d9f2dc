//! Link Materializer: creates and removes the filesystem links that expose
//! canonical assets in the runtime-visible tree.
//!
//! Enable and disable are idempotent. Link/group association is an exact
//! structural comparison: a link belongs to a group when its resolved
//! target's parent directory equals the group's canonical directory. A
//! substring test would misattribute links between groups whose names prefix
//! each other (`bmad` vs `bmad-extra`).

use crate::asset;
use crate::config::WorkspaceLayout;
use crate::error::LinksetError;
use crate::ignore;
use crate::registry::GroupRegistry;
use crate::types::AssetKind;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};

/// What `enable` does when the runtime identity is already occupied.
///
/// The default, `ReplaceReal`, is the last-enabled-wins rule: a real file or
/// directory at the identity is removed and replaced by the link; an
/// existing link is skipped untouched, even when its target is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwritePolicy {
    #[default]
    ReplaceReal,
    /// Never remove anything: occupied identities are skipped whether they
    /// are links or real entries.
    SkipExisting,
}

/// Materializes and removes links for whole groups.
pub struct Materializer;

impl Materializer {
    /// Link every canonical asset of `group` into the runtime directory.
    ///
    /// Returns the number of links created; pre-existing links do not count.
    /// Per-entry filesystem failures are logged and skipped, matching the
    /// continue-on-missing semantics of the enumeration loop.
    pub fn enable(
        layout: &WorkspaceLayout,
        registry: &dyn GroupRegistry,
        kind: AssetKind,
        group: &str,
    ) -> Result<usize, LinksetError> {
        Self::enable_with_policy(layout, registry, kind, group, OverwritePolicy::default())
    }

    pub fn enable_with_policy(
        layout: &WorkspaceLayout,
        registry: &dyn GroupRegistry,
        kind: AssetKind,
        group: &str,
        policy: OverwritePolicy,
    ) -> Result<usize, LinksetError> {
        let canonical = resolve_group_dir(registry, kind, group)?;
        prepare_runtime_dir(layout, kind)?;

        let runtime = layout.runtime_dir(kind);
        let mut created = 0;
        for entry in asset::enumerate(kind, &canonical)? {
            let link_path = runtime.join(&entry.identity);
            match fs::symlink_metadata(&link_path) {
                Ok(meta) if meta.file_type().is_symlink() => {
                    // Idempotence rule: never rewrite an existing link, even
                    // if it points at another group's copy.
                    debug!(identity = %entry.identity, "link already present, skipping");
                    continue;
                }
                Ok(meta) => {
                    if policy == OverwritePolicy::SkipExisting {
                        debug!(identity = %entry.identity, "occupied by real entry, skipping");
                        continue;
                    }
                    let removed = if meta.is_dir() {
                        fs::remove_dir_all(&link_path)
                    } else {
                        fs::remove_file(&link_path)
                    };
                    if let Err(e) = removed {
                        warn!(identity = %entry.identity, error = %e, "failed to replace real entry");
                        continue;
                    }
                    warn!(identity = %entry.identity, group, "replaced real entry with link");
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => {
                    warn!(identity = %entry.identity, error = %e, "failed to stat runtime entry");
                    continue;
                }
            }
            let target = relative_target(runtime, &entry.path);
            match create_link(&target, &link_path, entry.is_dir) {
                Ok(()) => created += 1,
                Err(e) => warn!(identity = %entry.identity, error = %e, "failed to create link"),
            }
        }
        debug!(kind = %kind, group, created, "enable complete");
        Ok(created)
    }

    /// Remove every runtime link that belongs to `group`. Non-link entries
    /// are never touched. Returns the number of links removed.
    pub fn disable(
        layout: &WorkspaceLayout,
        registry: &dyn GroupRegistry,
        kind: AssetKind,
        group: &str,
    ) -> Result<usize, LinksetError> {
        let canonical = registry.resolve(kind, group)?;
        prepare_runtime_dir(layout, kind)?;

        let runtime = layout.runtime_dir(kind);
        let mut removed = 0;
        for entry in fs::read_dir(runtime)? {
            let entry = entry?;
            if !entry.file_type()?.is_symlink() {
                continue;
            }
            let link_path = entry.path();
            if target_parent_matches(runtime, &link_path, &canonical) {
                fs::remove_file(&link_path)?;
                removed += 1;
            }
        }
        debug!(kind = %kind, group, removed, "disable complete");
        Ok(removed)
    }
}

/// Resolve a group and require its canonical directory to exist.
///
/// With the dynamic registry, directory presence *is* registration, so a
/// missing directory is an unknown group regardless of strategy.
pub(crate) fn resolve_group_dir(
    registry: &dyn GroupRegistry,
    kind: AssetKind,
    group: &str,
) -> Result<PathBuf, LinksetError> {
    let canonical = registry.resolve(kind, group)?;
    if !canonical.is_dir() {
        return Err(LinksetError::UnknownGroup {
            kind,
            group: group.to_string(),
        });
    }
    Ok(canonical)
}

/// Shared side effects of enable/disable: the runtime directory exists, it
/// is excluded from version tracking, and artifact files are purged.
pub(crate) fn prepare_runtime_dir(
    layout: &WorkspaceLayout,
    kind: AssetKind,
) -> Result<(), LinksetError> {
    let runtime = layout.runtime_dir(kind);
    fs::create_dir_all(runtime)?;
    ignore::ensure_ignored(&layout.ignore_file(), layout.ignore_pattern(kind))?;
    ignore::purge_artifacts(runtime)?;
    Ok(())
}

/// Relative path from `from_dir` to `to`, via the deepest common ancestor.
pub(crate) fn relative_target(from_dir: &Path, to: &Path) -> PathBuf {
    let from: Vec<Component> = from_dir.components().collect();
    let to: Vec<Component> = to.components().collect();
    let common = from
        .iter()
        .zip(to.iter())
        .take_while(|(a, b)| a == b)
        .count();
    let mut out = PathBuf::new();
    for _ in common..from.len() {
        out.push("..");
    }
    for component in &to[common..] {
        out.push(component.as_os_str());
    }
    if out.as_os_str().is_empty() {
        out.push(".");
    }
    out
}

/// Collapse `.` and `..` components without touching the filesystem, so
/// dangling link targets still normalize.
pub(crate) fn normalize_lexical(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Resolve a link's target to a normalized absolute path. Relative targets
/// resolve against the runtime directory the link lives in.
pub(crate) fn resolved_target(runtime_dir: &Path, link_path: &Path) -> Option<PathBuf> {
    let target = fs::read_link(link_path).ok()?;
    let absolute = if target.is_absolute() {
        target
    } else {
        runtime_dir.join(target)
    };
    Some(normalize_lexical(&absolute))
}

/// Exact structural link/group association: the resolved target's parent
/// directory must equal the group's canonical directory.
pub(crate) fn target_parent_matches(
    runtime_dir: &Path,
    link_path: &Path,
    group_dir: &Path,
) -> bool {
    resolved_target(runtime_dir, link_path)
        .and_then(|target| target.parent().map(|p| p == normalize_lexical(group_dir)))
        .unwrap_or(false)
}

#[cfg(unix)]
fn create_link(target: &Path, link: &Path, _is_dir: bool) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_link(target: &Path, link: &Path, is_dir: bool) -> std::io::Result<()> {
    if is_dir {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}
