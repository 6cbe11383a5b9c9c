//! Path utilities

use std::path::PathBuf;

/// Data directory (~/.zaprelay), falling back to the working directory
/// when no home directory can be located.
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .map(|home| home.join(".zaprelay"))
        .unwrap_or_else(|| PathBuf::from(".zaprelay"))
}

/// Config file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}
