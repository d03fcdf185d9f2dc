//! Error taxonomy for linkset operations.
//!
//! Precondition failures (`UnknownGroup`, `NotFound`, `NotAsset`, `Collision`,
//! `InvalidName`) abort an operation before any mutation. Filesystem errors
//! raised mid-mutation are surfaced as `Io`.

use crate::types::AssetKind;
use thiserror::Error;

/// Errors surfaced by registry, materializer, inspector, and reconciler
/// operations.
#[derive(Debug, Error)]
pub enum LinksetError {
    /// The group name does not resolve to a canonical directory.
    #[error("unknown {kind} group '{group}'")]
    UnknownGroup { kind: AssetKind, group: String },

    /// The source asset does not exist.
    #[error("no such asset: {0}")]
    NotFound(String),

    /// The source is already a link; there is nothing to organize.
    #[error("'{0}' is already a link, not a relocatable asset")]
    NotAsset(String),

    /// The destination identity is already occupied.
    #[error("'{identity}' already exists in group '{group}'")]
    Collision { identity: String, group: String },

    /// Group or asset name contains path traversal or a reserved prefix.
    #[error("invalid name '{0}'")]
    InvalidName(String),

    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem error during a mutation phase.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LinksetError {
    /// Whether this error is a precondition failure (no mutation happened).
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            LinksetError::UnknownGroup { .. }
                | LinksetError::NotFound(_)
                | LinksetError::NotAsset(_)
                | LinksetError::Collision { .. }
                | LinksetError::InvalidName(_)
        )
    }
}
