// src/config/mod.rs

//! Configuration loading, model and validation.
//!
//! - [`model`] mirrors the TOML file structure.
//! - [`loader`] reads + parses a file.
//! - [`validate`] performs semantic checks on top of deserialization.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{ConfigFile, ConfigSection, EngineSection, WatchSection};
