//! Centralized configuration paths for keyseq
//!
//! All config files live under:
//! - Unix/macOS: `~/.config/keyseq/`
//! - Windows: `%APPDATA%\keyseq\`

use std::{
    env, fs,
    path::{Path, PathBuf},
};

const APP_DIR: &str = "keyseq";

/// Prefix of the daily-rotated log files
pub const LOG_FILE_PREFIX: &str = "keyseq.log";

/// Base config directory for keyseq
///
/// Unix/macOS:
///   - If XDG_CONFIG_HOME is set: `$XDG_CONFIG_HOME/keyseq`
///   - Else: `~/.config/keyseq`
///
/// Windows:
///   - `%APPDATA%\keyseq`
pub fn config_dir() -> Option<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        env::var("APPDATA")
            .ok()
            .map(|appdata| PathBuf::from(appdata).join(APP_DIR))
    }

    #[cfg(not(target_os = "windows"))]
    {
        env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".config")))
            .map(|config| config.join(APP_DIR))
    }
}

/// `~/.config/keyseq/keymap.yaml`
pub fn keymap_file() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("keymap.yaml"))
}

/// `~/.config/keyseq/logs/`
pub fn logs_dir() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("logs"))
}

/// Returns the most recent log file in `~/.config/keyseq/logs/`
/// (e.g., `keyseq.log.2026-01-07`)
pub fn log_file() -> Option<PathBuf> {
    let logs_dir = logs_dir()?;
    newest_log_in(&logs_dir).or_else(|| Some(logs_dir.join(LOG_FILE_PREFIX)))
}

/// Newest `keyseq.log*` file in `dir`; date suffixes sort naturally
fn newest_log_in(dir: &Path) -> Option<PathBuf> {
    fs::read_dir(dir)
        .ok()?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(LOG_FILE_PREFIX))
        })
        .max()
}

fn ensure_dir(path: &Path) -> Result<(), String> {
    fs::create_dir_all(path)
        .map_err(|e| format!("Failed to create directory {}: {}", path.display(), e))
}

/// Ensure the base config dir exists, returning it
pub fn ensure_config_dir() -> Result<PathBuf, String> {
    let dir = config_dir().ok_or_else(|| "No config directory available".to_string())?;
    ensure_dir(&dir)?;
    Ok(dir)
}

/// Ensure logs dir exists, returning it
pub fn ensure_logs_dir() -> Result<PathBuf, String> {
    let logs = ensure_config_dir()?.join("logs");
    ensure_dir(&logs)?;
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_config_dir() {
        if let Some(dir) = config_dir() {
            assert!(dir.ends_with(APP_DIR));
            assert_eq!(keymap_file(), Some(dir.join("keymap.yaml")));
            assert_eq!(logs_dir(), Some(dir.join("logs")));
        }
    }

    #[test]
    fn test_newest_log_in() {
        let dir = tempfile::tempdir().unwrap();
        for name in [
            "keyseq.log.2026-01-05",
            "keyseq.log.2026-01-07",
            "keyseq.log.2026-01-06",
            "other.log",
        ] {
            fs::write(dir.path().join(name), "").unwrap();
        }

        assert_eq!(
            newest_log_in(dir.path()),
            Some(dir.path().join("keyseq.log.2026-01-07"))
        );
    }

    #[test]
    fn test_newest_log_in_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(newest_log_in(dir.path()), None);
        assert_eq!(newest_log_in(&dir.path().join("missing")), None);
    }
}
