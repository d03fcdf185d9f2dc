//! State Inspector: computes active/total counts per group from existing
//! links and audits runtime directories for drift.

use crate::asset;
use crate::config::WorkspaceLayout;
use crate::error::LinksetError;
use crate::links::{normalize_lexical, resolved_target, target_parent_matches};
use crate::registry::GroupRegistry;
use crate::types::{AssetKind, GroupStatus, LinkIssue, LinkIssueKind};
use std::fs;

pub struct Inspector;

impl Inspector {
    /// Number of runtime links whose resolved target lives in the group's
    /// canonical directory. A missing runtime directory counts as zero.
    pub fn count_active(
        layout: &WorkspaceLayout,
        registry: &dyn GroupRegistry,
        kind: AssetKind,
        group: &str,
    ) -> Result<usize, LinksetError> {
        let canonical = registry.resolve(kind, group)?;
        let runtime = layout.runtime_dir(kind);
        let entries = match fs::read_dir(runtime) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };
        let mut active = 0;
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_symlink() {
                continue;
            }
            if target_parent_matches(runtime, &entry.path(), &canonical) {
                active += 1;
            }
        }
        Ok(active)
    }

    /// Number of canonical entries in the group, using the same enumeration
    /// rule as the materializer. A missing group directory counts as zero.
    pub fn count_total(
        registry: &dyn GroupRegistry,
        kind: AssetKind,
        group: &str,
    ) -> Result<usize, LinksetError> {
        let canonical = registry.resolve(kind, group)?;
        if !canonical.is_dir() {
            return Ok(0);
        }
        Ok(asset::enumerate(kind, &canonical)?.len())
    }

    /// Status of every known group of a kind, in registry order.
    pub fn status(
        layout: &WorkspaceLayout,
        registry: &dyn GroupRegistry,
        kind: AssetKind,
    ) -> Result<Vec<GroupStatus>, LinksetError> {
        let mut out = Vec::new();
        for name in registry.groups(kind)? {
            let active = Self::count_active(layout, registry, kind, &name)?;
            let total = Self::count_total(registry, kind, &name)?;
            out.push(GroupStatus {
                enabled: active > 0,
                name,
                active,
                total,
            });
        }
        Ok(out)
    }

    /// Find broken links (dangling target) and foreign links (target outside
    /// this kind's canonical subtree) in the runtime directory. Read-only.
    pub fn audit(layout: &WorkspaceLayout, kind: AssetKind) -> Result<Vec<LinkIssue>, LinksetError> {
        let runtime = layout.runtime_dir(kind);
        let entries = match fs::read_dir(runtime) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let kind_root = normalize_lexical(&layout.kind_root(kind));
        let mut issues = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_symlink() {
                continue;
            }
            let link_path = entry.path();
            let Some(target) = resolved_target(runtime, &link_path) else {
                continue;
            };
            let issue = if fs::metadata(&link_path).is_err() {
                Some(LinkIssueKind::Broken)
            } else if !target.starts_with(&kind_root) {
                Some(LinkIssueKind::Foreign)
            } else {
                None
            };
            if let Some(issue) = issue {
                issues.push(LinkIssue {
                    kind,
                    identity: entry.file_name().to_string_lossy().into_owned(),
                    issue,
                    target: target.display().to_string(),
                });
            }
        }
        issues.sort_by(|a, b| a.identity.cmp(&b.identity));
        Ok(issues)
    }
}
