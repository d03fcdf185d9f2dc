//! Configuration loading and workspace layout resolution.
//!
//! Precedence (highest to lowest): `LINKSET_*` environment variables,
//! `linkset.toml` at the workspace root, built-in defaults. The resolved
//! layout carries every root path explicitly so components never assume
//! process-wide constants and can be tested against temporary directories.

use crate::error::LinksetError;
use crate::logging::LoggingConfig;
use crate::types::AssetKind;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the workspace configuration file.
pub const CONFIG_FILE: &str = "linkset.toml";

/// Directory names making up the canonical and runtime trees, relative to
/// the workspace root.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Canonical storage root holding one subtree per asset kind.
    #[serde(default = "default_library_dir")]
    pub library_dir: String,
    /// Runtime-visible commands directory.
    #[serde(default = "default_commands_dir")]
    pub commands_dir: String,
    /// Runtime-visible skills directory.
    #[serde(default = "default_skills_dir")]
    pub skills_dir: String,
}

fn default_library_dir() -> String {
    "library".to_string()
}

fn default_commands_dir() -> String {
    "commands".to_string()
}

fn default_skills_dir() -> String {
    "skills".to_string()
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            library_dir: default_library_dir(),
            commands_dir: default_commands_dir(),
            skills_dir: default_skills_dir(),
        }
    }
}

/// Which registry strategy to use for group resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistryMode {
    /// Group registration is directory presence under the canonical root.
    Dynamic,
    /// Groups are enumerated in a `groups.toml` data file.
    Static,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default = "default_registry_mode")]
    pub mode: RegistryMode,
}

fn default_registry_mode() -> RegistryMode {
    RegistryMode::Dynamic
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            mode: default_registry_mode(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinksetConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Configuration loader facade.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration for a workspace: defaults, then `linkset.toml` at
    /// the workspace root if present, then `LINKSET_*` environment overrides
    /// (e.g. `LINKSET_LAYOUT__LIBRARY_DIR`).
    pub fn load(workspace_root: &Path) -> Result<LinksetConfig, LinksetError> {
        Self::build(Some(&workspace_root.join(CONFIG_FILE)), false)
    }

    /// Load configuration from a specific file (must exist).
    pub fn load_from_file(path: &Path) -> Result<LinksetConfig, LinksetError> {
        Self::build(Some(path), true)
    }

    fn build(file: Option<&Path>, required: bool) -> Result<LinksetConfig, LinksetError> {
        let mut builder = Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(required));
        }
        builder
            .add_source(Environment::with_prefix("LINKSET").separator("__"))
            .build()
            .and_then(Config::try_deserialize)
            .map_err(|e| LinksetError::Config(e.to_string()))
    }
}

/// Resolved absolute paths for the canonical and runtime trees of one
/// workspace.
#[derive(Debug, Clone)]
pub struct WorkspaceLayout {
    workspace_root: PathBuf,
    library_root: PathBuf,
    commands_runtime: PathBuf,
    skills_runtime: PathBuf,
    commands_pattern: String,
    skills_pattern: String,
}

impl WorkspaceLayout {
    /// Resolve a layout against an existing workspace root.
    ///
    /// The root is canonicalized up front so link-target comparisons are not
    /// confused by symlinked parents (`/tmp` on macOS, for one).
    pub fn resolve(workspace_root: &Path, layout: &LayoutConfig) -> Result<Self, LinksetError> {
        let workspace_root = dunce::canonicalize(workspace_root)?;
        Ok(Self {
            library_root: workspace_root.join(&layout.library_dir),
            commands_runtime: workspace_root.join(&layout.commands_dir),
            skills_runtime: workspace_root.join(&layout.skills_dir),
            commands_pattern: format!("{}/", layout.commands_dir),
            skills_pattern: format!("{}/", layout.skills_dir),
            workspace_root,
        })
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn library_root(&self) -> &Path {
        &self.library_root
    }

    /// Canonical subtree for one asset kind (`library/commands`, ...).
    pub fn kind_root(&self, kind: AssetKind) -> PathBuf {
        match kind {
            AssetKind::Command => self.library_root.join("commands"),
            AssetKind::Skill => self.library_root.join("skills"),
        }
    }

    /// Canonical directory of a group. Callers validate the name first.
    pub fn group_dir(&self, kind: AssetKind, group: &str) -> PathBuf {
        self.kind_root(kind).join(group)
    }

    /// Runtime-visible directory for one asset kind.
    pub fn runtime_dir(&self, kind: AssetKind) -> &Path {
        match kind {
            AssetKind::Command => &self.commands_runtime,
            AssetKind::Skill => &self.skills_runtime,
        }
    }

    /// Ignore-file pattern for a runtime directory (`commands/`, ...).
    pub fn ignore_pattern(&self, kind: AssetKind) -> &str {
        match kind {
            AssetKind::Command => &self.commands_pattern,
            AssetKind::Skill => &self.skills_pattern,
        }
    }

    /// Project ignore file (`.gitignore` at the workspace root).
    pub fn ignore_file(&self) -> PathBuf {
        self.workspace_root.join(".gitignore")
    }

    /// Static registry data file (`groups.toml` under the library root).
    pub fn groups_file(&self) -> PathBuf {
        self.library_root.join("groups.toml")
    }
}
