//! CLI Tooling
//!
//! Command-line interface for all linkset operations. Provides
//! workspace-scoped operations with idempotent execution.

use crate::config::{ConfigLoader, LinksetConfig, RegistryMode, WorkspaceLayout};
use crate::error::LinksetError;
use crate::format::{
    format_audit_text, format_classify_text, format_scan_text, format_status_text,
};
use crate::inspect::Inspector;
use crate::links::Materializer;
use crate::organize::Reconciler;
use crate::registry::{DirRegistry, GroupRegistry, TomlRegistry};
use crate::types::{AssetKind, LinkIssue};
use crate::{asset, logging};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::path::PathBuf;

/// Linkset CLI - toggleable asset groups exposed through filesystem links
#[derive(Parser)]
#[command(name = "linkset")]
#[command(about = "Toggleable asset groups exposed through filesystem links")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Workspace root directory
    #[arg(long, default_value = ".")]
    pub workspace: PathBuf,

    /// Configuration file path (overrides default config loading)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Log format (json, text)
    #[arg(long)]
    pub log_format: Option<String>,

    /// Log output (stdout, stderr, file, file+stderr)
    #[arg(long)]
    pub log_output: Option<String>,

    /// Log file path (if output includes "file")
    #[arg(long)]
    pub log_file: Option<PathBuf>,
}

/// Asset kind as a CLI argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum KindArg {
    Command,
    Skill,
}

impl From<KindArg> for AssetKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Command => AssetKind::Command,
            KindArg::Skill => AssetKind::Skill,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Enable a group: link its assets into the runtime directory
    On {
        /// Asset kind
        kind: KindArg,
        /// Group name
        group: String,
    },
    /// Disable a group: remove its links from the runtime directory
    Off {
        /// Asset kind
        kind: KindArg,
        /// Group name
        group: String,
    },
    /// Show active/total counts for every known group
    List {
        /// Restrict to one asset kind
        kind: Option<KindArg>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// List unorganized (real, non-link) runtime entries
    Scan {
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Relocate a stray command into a canonical group and re-link it
    MoveCommand {
        /// Runtime identity (file name) of the stray command
        identity: String,
        /// Destination group (prompts interactively when omitted)
        #[arg(long)]
        group: Option<String>,
    },
    /// Relocate a stray skill into a canonical group and re-link it
    MoveSkill {
        /// Runtime identity (directory name) of the stray skill
        identity: String,
        /// Destination group (prompts interactively when omitted)
        #[arg(long)]
        group: Option<String>,
    },
    /// Create and register a command group, linking any existing assets
    RegisterCommandGroup {
        /// Group name
        name: String,
    },
    /// Create and register a skill group, linking any existing assets
    RegisterSkillGroup {
        /// Group name
        name: String,
    },
    /// Audit runtime links for broken or foreign targets
    Doctor {
        /// Restrict to one asset kind
        kind: Option<KindArg>,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
    /// Copy an external asset into a canonical group (link with `on`)
    Import {
        /// Asset kind
        kind: KindArg,
        /// Path to the source file or directory
        source: PathBuf,
        /// Destination group
        group: String,
        /// Canonical identity (defaults to the source file name)
        #[arg(long)]
        identity: Option<String>,
    },
    /// Classify a directory's top-level entries as skills/commands/unknown
    Classify {
        /// Directory to classify
        source: PathBuf,
        /// Output format (text or json)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

/// CLI context for managing workspace state
pub struct CliContext {
    layout: WorkspaceLayout,
    config: LinksetConfig,
    registry: Box<dyn GroupRegistry>,
}

impl CliContext {
    /// Create a new CLI context
    pub fn new(workspace_root: PathBuf, config_path: Option<PathBuf>) -> Result<Self, LinksetError> {
        let config = match &config_path {
            Some(path) => ConfigLoader::load_from_file(path)?,
            None => ConfigLoader::load(&workspace_root)?,
        };
        let layout = WorkspaceLayout::resolve(&workspace_root, &config.layout)?;
        let registry: Box<dyn GroupRegistry> = match config.registry.mode {
            RegistryMode::Dynamic => Box::new(DirRegistry::new(layout.clone())),
            RegistryMode::Static => Box::new(TomlRegistry::load(layout.clone())?),
        };
        Ok(Self {
            layout,
            config,
            registry,
        })
    }

    /// Get the loaded configuration (for logging setup in the binary)
    pub fn config(&self) -> &LinksetConfig {
        &self.config
    }

    /// Resolve the effective logging configuration with CLI overrides.
    pub fn logging_config(&self, cli: &Cli) -> logging::LoggingConfig {
        let mut logging = self.config.logging.clone();
        if let Some(ref level) = cli.log_level {
            logging.level = level.clone();
        }
        if let Some(ref format) = cli.log_format {
            logging.format = format.clone();
        }
        if let Some(ref output) = cli.log_output {
            logging.output = output.clone();
        }
        if let Some(ref file) = cli.log_file {
            logging.file = Some(file.clone());
        }
        logging
    }

    /// Execute a CLI command
    pub fn execute(&mut self, command: &Commands) -> Result<String, LinksetError> {
        match command {
            Commands::On { kind, group } => {
                let kind = AssetKind::from(*kind);
                let created = Materializer::enable(&self.layout, self.registry.as_ref(), kind, group)?;
                Ok(format!(
                    "Enabled {} group '{}' ({} links created)",
                    kind, group, created
                ))
            }
            Commands::Off { kind, group } => {
                let kind = AssetKind::from(*kind);
                let removed = Materializer::disable(&self.layout, self.registry.as_ref(), kind, group)?;
                Ok(format!(
                    "Disabled {} group '{}' ({} links removed)",
                    kind, group, removed
                ))
            }
            Commands::List { kind, format } => self.handle_list(kind.map(AssetKind::from), format),
            Commands::Scan { format } => {
                let report = Reconciler::scan(&self.layout, self.registry.as_ref())?;
                if format == "json" {
                    to_json(&report)
                } else {
                    Ok(format_scan_text(&report))
                }
            }
            Commands::MoveCommand { identity, group } => {
                self.handle_move(AssetKind::Command, identity, group.as_deref())
            }
            Commands::MoveSkill { identity, group } => {
                self.handle_move(AssetKind::Skill, identity, group.as_deref())
            }
            Commands::RegisterCommandGroup { name } => {
                self.handle_register(AssetKind::Command, name)
            }
            Commands::RegisterSkillGroup { name } => self.handle_register(AssetKind::Skill, name),
            Commands::Doctor { kind, format } => {
                self.handle_doctor(kind.map(AssetKind::from), format)
            }
            Commands::Import {
                kind,
                source,
                group,
                identity,
            } => {
                let kind = AssetKind::from(*kind);
                let dest = Reconciler::import(
                    self.registry.as_ref(),
                    kind,
                    source,
                    identity.as_deref(),
                    group,
                )?;
                Ok(format!(
                    "Imported {} into group '{}': {}\nRun `linkset on {} {}` to activate it.",
                    kind,
                    group,
                    dest.display(),
                    kind,
                    group
                ))
            }
            Commands::Classify { source, format } => {
                let entries = asset::classify_entries(source)?;
                if format == "json" {
                    to_json(&entries)
                } else {
                    Ok(format_classify_text(&entries))
                }
            }
        }
    }

    /// Handle the list command
    fn handle_list(&self, kind: Option<AssetKind>, format: &str) -> Result<String, LinksetError> {
        let kinds: Vec<AssetKind> = match kind {
            Some(kind) => vec![kind],
            None => AssetKind::ALL.to_vec(),
        };
        if format == "json" {
            let mut out = serde_json::Map::new();
            for kind in kinds {
                let status = Inspector::status(&self.layout, self.registry.as_ref(), kind)?;
                out.insert(format!("{}s", kind), json!(status));
            }
            to_json(&out)
        } else {
            let mut out = String::new();
            for kind in kinds {
                let status = Inspector::status(&self.layout, self.registry.as_ref(), kind)?;
                let heading = match kind {
                    AssetKind::Command => "Command groups",
                    AssetKind::Skill => "Skill groups",
                };
                out.push_str(&format_status_text(heading, &status));
            }
            Ok(out)
        }
    }

    /// Handle move-command / move-skill
    fn handle_move(
        &self,
        kind: AssetKind,
        identity: &str,
        group: Option<&str>,
    ) -> Result<String, LinksetError> {
        let group = match group {
            Some(group) => group.to_string(),
            None => self.pick_group_interactive(kind)?,
        };
        let dest = Reconciler::relocate(
            &self.layout,
            self.registry.as_ref(),
            kind,
            identity,
            &group,
        )?;
        Ok(format!(
            "Moved {} '{}' into group '{}': {}",
            kind,
            identity,
            group,
            dest.display()
        ))
    }

    /// Interactive group selection
    fn pick_group_interactive(&self, kind: AssetKind) -> Result<String, LinksetError> {
        use dialoguer::Select;

        let groups = self.registry.groups(kind)?;
        if groups.is_empty() {
            return Err(LinksetError::Config(format!(
                "no {} groups registered; run `linkset register-{}-group <name>` first",
                kind, kind
            )));
        }
        let selection = Select::new()
            .with_prompt(format!("Destination {} group", kind))
            .items(&groups)
            .default(0)
            .interact()
            .map_err(|e| LinksetError::Config(format!("failed to get user input: {}", e)))?;
        Ok(groups[selection].clone())
    }

    /// Handle register-command-group / register-skill-group
    fn handle_register(&mut self, kind: AssetKind, name: &str) -> Result<String, LinksetError> {
        let created =
            Reconciler::register_group(&self.layout, self.registry.as_mut(), kind, name)?;
        Ok(format!(
            "Registered {} group '{}' ({} links created)",
            kind, name, created
        ))
    }

    /// Handle the doctor command
    fn handle_doctor(&self, kind: Option<AssetKind>, format: &str) -> Result<String, LinksetError> {
        let kinds: Vec<AssetKind> = match kind {
            Some(kind) => vec![kind],
            None => AssetKind::ALL.to_vec(),
        };
        let mut issues: Vec<LinkIssue> = Vec::new();
        for kind in kinds {
            issues.extend(Inspector::audit(&self.layout, kind)?);
        }
        if format == "json" {
            to_json(&issues)
        } else {
            Ok(format_audit_text(&issues))
        }
    }
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, LinksetError> {
    serde_json::to_string_pretty(value).map_err(|e| LinksetError::Config(e.to_string()))
}
