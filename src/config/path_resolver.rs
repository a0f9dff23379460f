//! Path helpers for ragconsole
//!
//! Config and preset files live under the XDG directories; user-supplied
//! paths accept `~` and environment variables and are made absolute against
//! the current directory.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};

const APP_DIR: &str = "ragconsole";

/// Expand tilde (~) and environment variables in a path
pub fn expand_home(path: &str) -> Result<PathBuf> {
    let expanded = shellexpand::full(path)
        .map_err(|e| anyhow!("Failed to expand path {}: {}", path, e))?;
    Ok(PathBuf::from(expanded.as_ref()))
}

/// Resolve a path to an absolute path
///
/// Resolution order:
/// 1. Expand ~ to home directory
/// 2. If absolute, return as-is
/// 3. If relative, resolve from current directory
pub fn resolve_path(path: &str) -> Result<PathBuf> {
    let expanded = expand_home(path)?;

    if expanded.is_absolute() {
        Ok(expanded)
    } else {
        let current_dir = std::env::current_dir()
            .map_err(|e| anyhow!("Failed to get current directory: {}", e))?;
        Ok(current_dir.join(expanded))
    }
}

fn xdg_dir(var: &str, home_suffix: &[&str]) -> PathBuf {
    if let Ok(dir) = std::env::var(var) {
        return PathBuf::from(dir).join(APP_DIR);
    }
    let mut base = match std::env::var("HOME") {
        Ok(home) => PathBuf::from(home),
        Err(_) => PathBuf::new(),
    };
    for part in home_suffix {
        base.push(part);
    }
    base.join(APP_DIR)
}

/// Get the XDG config directory for ragconsole
///
/// Returns: $XDG_CONFIG_HOME/ragconsole or ~/.config/ragconsole
pub fn get_config_dir() -> PathBuf {
    xdg_dir("XDG_CONFIG_HOME", &[".config"])
}

/// Get the XDG data directory for ragconsole
///
/// Returns: $XDG_DATA_HOME/ragconsole or ~/.local/share/ragconsole
pub fn get_data_dir() -> PathBuf {
    xdg_dir("XDG_DATA_HOME", &[".local", "share"])
}

/// Get the default config file path
pub fn get_default_config_path() -> PathBuf {
    get_config_dir().join("config.toml")
}

/// Get the default experiment preset file path
pub fn get_default_presets_path() -> PathBuf {
    get_data_dir().join("presets.json")
}

/// Write `contents` to `path` via a sibling temp file and rename
pub fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .map_err(|e| anyhow!("Failed to create {}: {}", parent.display(), e))?;
        }
    }
    let tmp_path = path.with_extension("tmp");
    std::fs::write(&tmp_path, contents)
        .map_err(|e| anyhow!("Failed to write {}: {}", tmp_path.display(), e))?;
    std::fs::rename(&tmp_path, path)
        .map_err(|e| anyhow!("Failed to replace {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_home_with_tilde() {
        let result = expand_home("~").unwrap();
        assert!(!result.to_str().unwrap().contains('~'));
    }

    #[test]
    fn test_expand_home_with_subdir() {
        let result = expand_home("~/test").unwrap();
        assert!(result.to_str().unwrap().ends_with("/test"));
    }

    #[test]
    fn test_expand_home_absolute() {
        let result = expand_home("/absolute/path").unwrap();
        assert_eq!(result.to_str().unwrap(), "/absolute/path");
    }

    #[test]
    fn test_get_config_dir_contains_app_name() {
        let dir = get_config_dir();
        assert!(dir.to_str().unwrap().contains("ragconsole"));
    }

    #[test]
    fn test_presets_path_is_json() {
        let path = get_default_presets_path();
        assert_eq!(path.file_name().unwrap(), "presets.json");
    }

    #[test]
    fn test_resolve_absolute_path() {
        let result = resolve_path("/tmp").unwrap();
        assert_eq!(result.to_str().unwrap(), "/tmp");
    }

    #[test]
    fn test_write_atomic_creates_parent() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("nested").join("file.json");
        write_atomic(&path, "{}").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{}");
        assert!(!path.with_extension("tmp").exists());
    }
}
