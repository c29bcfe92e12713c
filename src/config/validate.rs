// src/config/validate.rs

use std::path::{Component, Path};

use globset::Glob;

use crate::config::model::ConfigFile;
use crate::errors::{Result, ScriptwatchError};

/// Run semantic validation against a loaded configuration.
///
/// This checks:
/// - `poll_interval_ms >= 1`
/// - `script_dir` is non-empty
/// - all `[watch].paths` are plain relative paths (no `..`, no absolute paths)
/// - all `[watch].exclude` entries are valid glob patterns
pub fn validate_config(cfg: &ConfigFile) -> Result<()> {
    validate_global_config(cfg)?;
    validate_watch_paths(cfg)?;
    validate_exclude_globs(cfg)?;
    Ok(())
}

fn validate_global_config(cfg: &ConfigFile) -> Result<()> {
    if cfg.config.poll_interval_ms == 0 {
        return Err(ScriptwatchError::Config(
            "[config].poll_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    if cfg.config.script_dir.trim().is_empty() {
        return Err(ScriptwatchError::Config(
            "[config].script_dir must not be empty".to_string(),
        ));
    }

    Ok(())
}

fn validate_watch_paths(cfg: &ConfigFile) -> Result<()> {
    for raw in cfg.watch.paths.iter() {
        let path = Path::new(raw);

        if path.is_absolute() {
            return Err(ScriptwatchError::Config(format!(
                "[watch].paths entry '{raw}' must be relative to script_dir"
            )));
        }

        let escapes = path
            .components()
            .any(|c| matches!(c, Component::ParentDir));
        if escapes {
            return Err(ScriptwatchError::Config(format!(
                "[watch].paths entry '{raw}' must not contain '..'"
            )));
        }
    }

    Ok(())
}

fn validate_exclude_globs(cfg: &ConfigFile) -> Result<()> {
    for pat in cfg.watch.exclude.iter() {
        if let Err(err) = Glob::new(pat) {
            return Err(ScriptwatchError::Config(format!(
                "[watch].exclude pattern '{pat}' is not a valid glob: {err}"
            )));
        }
    }

    Ok(())
}
