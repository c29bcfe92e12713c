// src/errors.rs

//! Crate-wide error types.
//!
//! Most internal plumbing uses `anyhow` directly; this enum exists for the
//! cases where callers want to match on the failure class (config loading,
//! watch backend recreation).

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScriptwatchError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("watch backend error: {0}")]
    Watch(String),

    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, ScriptwatchError>;
