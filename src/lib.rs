//! Linkset: Toggleable Asset-Group Link Management
//!
//! Manages named groups of command and skill assets under a canonical
//! storage tree and selectively exposes them through filesystem links in a
//! runtime-visible tree, without moving or duplicating the underlying files.

pub mod asset;
pub mod config;
pub mod error;
pub mod format;
pub mod ignore;
pub mod inspect;
pub mod links;
pub mod logging;
pub mod organize;
pub mod registry;
pub mod tooling;
pub mod types;
