//! Filesystem locations used by bizdash

use std::path::PathBuf;

use crate::constants::fs::{CONFIG_DIR_NAME, CONFIG_FILE_NAME, LOGS_DIR_NAME};

/// Root config directory: `~/.bizdash`
///
/// Falls back to the current directory when no home directory can be found.
pub fn config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CONFIG_DIR_NAME)
}

/// Config file path: `~/.bizdash/config.toml`
pub fn config_file() -> PathBuf {
    config_dir().join(CONFIG_FILE_NAME)
}

/// Log directory: `~/.bizdash/logs`
pub fn logs_dir() -> PathBuf {
    config_dir().join(LOGS_DIR_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_share_config_root() {
        let root = config_dir();
        assert!(config_file().starts_with(&root));
        assert!(logs_dir().starts_with(&root));
        assert_eq!(config_file().file_name().unwrap(), CONFIG_FILE_NAME);
    }
}
