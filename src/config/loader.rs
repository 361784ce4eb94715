use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::ConfigFile;
use crate::config::validate::validate_config;
use crate::errors::Result;

/// Load a configuration file from a given path and return the raw `ConfigFile`.
///
/// This only performs TOML deserialization; it does **not** perform semantic
/// validation. Use [`load_and_validate`] for that.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: ConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and run validation.
///
/// This is the recommended entry point for the rest of the application.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let config = load_from_path(&path)?;
    validate_config(&config)?;
    Ok(config)
}

/// Directory jobs run in.
///
/// - An explicit `[server].project_root` wins; a relative one is resolved
///   against the config file's directory.
/// - Otherwise the config file's directory is used, falling back to the
///   current working directory for a bare filename like `Jobtower.toml`.
pub fn resolve_project_root(cfg: &ConfigFile, config_path: &Path) -> PathBuf {
    let config_dir = match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };

    match &cfg.server.project_root {
        Some(root) if root.is_absolute() => root.clone(),
        Some(root) => config_dir.join(root),
        None => config_dir,
    }
}
