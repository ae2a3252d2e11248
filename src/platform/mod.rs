// Armrest platform paths
// Config and data directories resolved per OS through `directories`.
//
// `ARMREST_DATA_DIR` overrides both and places them under one root.

use std::env;
use std::path::PathBuf;

use directories::ProjectDirs;

/// Environment variable that relocates every Armrest directory.
pub const DATA_DIR_ENV: &str = "ARMREST_DATA_DIR";

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("dev", "Armrest", "armrest")
}

fn override_root() -> Option<PathBuf> {
    env::var_os(DATA_DIR_ENV)
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Falls back to a relative `.armrest` directory when no home directory is known.
fn fallback_root() -> PathBuf {
    PathBuf::from(".armrest")
}

/// Returns the configuration directory.
///
/// - **Linux**: `~/.config/armrest`
/// - **macOS**: `~/Library/Application Support/dev.Armrest.armrest`
/// - **Windows**: `%APPDATA%\Armrest\armrest\config`
pub fn get_config_dir() -> PathBuf {
    if let Some(root) = override_root() {
        return root.join("config");
    }
    project_dirs()
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| fallback_root().join("config"))
}

/// Returns the data directory holding the storage database.
pub fn get_data_dir() -> PathBuf {
    if let Some(root) = override_root() {
        return root;
    }
    project_dirs()
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(fallback_root)
}

/// Path of the storage database inside `data_dir`.
pub fn storage_db_path(data_dir: &std::path::Path) -> PathBuf {
    data_dir.join("armrest.db")
}
