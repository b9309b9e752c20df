//! Settings file path resolution
//!
//! Precedence (highest to lowest):
//! 1. Explicit path (the `--config` flag)
//! 2. `AUGMENTA_CONFIG` environment variable
//! 3. `augmenta.yaml` in the working directory

use std::path::{Path, PathBuf};

/// Environment variable overriding the settings file location
pub const CONFIG_ENV: &str = "AUGMENTA_CONFIG";

/// File name used when nothing else is configured
pub const DEFAULT_FILE_NAME: &str = "augmenta.yaml";

/// Resolve the settings file path
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    match explicit {
        Some(path) => path.to_path_buf(),
        None => default_config_path(),
    }
}

/// Get the settings file path when no explicit path was given
pub fn default_config_path() -> PathBuf {
    std::env::var(CONFIG_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_NAME))
}

/// Whether a path carries an extension accepted for import/export
pub fn is_yaml_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"))
        .unwrap_or(false)
}

/// Directory a file lives in, `.` for bare file names
pub fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
