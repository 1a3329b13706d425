//! Platform-appropriate locations for config and logs.
//!
//! In development mode (cargo run), paths resolve to the working directory.
//! Installed builds use:
//! - Windows: `%APPDATA%\Masquerade\`
//! - macOS: `~/Library/Application Support/Masquerade/`
//! - Linux: `~/.config/masquerade/` (config), `~/.local/share/masquerade/` (data)

use std::path::PathBuf;

/// Returns true when running in development mode.
///
/// Either the `CARGO` env var is set (cargo run) or debug assertions are on.
pub fn is_dev_mode() -> bool {
    std::env::var("CARGO").is_ok() || cfg!(debug_assertions)
}

/// Directory holding `config.json`.
pub fn config_dir() -> Option<PathBuf> {
    if is_dev_mode() {
        return Some(PathBuf::from("."));
    }

    #[cfg(target_os = "linux")]
    {
        dirs::config_dir().map(|p| p.join("masquerade"))
    }

    #[cfg(not(target_os = "linux"))]
    {
        data_dir()
    }
}

/// Directory holding logs and other per-user data.
pub fn data_dir() -> Option<PathBuf> {
    if is_dev_mode() {
        return Some(PathBuf::from("."));
    }

    dirs::data_dir().map(|p| p.join("masquerade"))
}

pub fn config_file() -> PathBuf {
    config_dir()
        .map(|p| p.join("config.json"))
        .unwrap_or_else(|| PathBuf::from("config.json"))
}

pub fn logs_dir() -> PathBuf {
    data_dir()
        .map(|p| p.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

/// Starting directory for image dialogs when nothing was opened yet.
pub fn pictures_dir() -> Option<PathBuf> {
    dirs::picture_dir().or_else(dirs::home_dir)
}

/// Create config and data directories on first run.
pub fn ensure_directories() -> std::io::Result<()> {
    if is_dev_mode() {
        return Ok(());
    }

    if let Some(config) = config_dir() {
        std::fs::create_dir_all(&config)?;
    }
    if let Some(data) = data_dir() {
        std::fs::create_dir_all(data.join("logs"))?;
    }
    Ok(())
}
