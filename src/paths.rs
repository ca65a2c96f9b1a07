use std::path::PathBuf;

/// Returns the root directory holding config and local identity.
///
/// Resolution order:
/// 1. `REELSYNC_HOME` environment variable (if set)
/// 2. Platform config directory for `reelsync`
/// 3. Current working directory + `.reelsync`
pub fn reelsync_root() -> PathBuf {
    if let Ok(root) = std::env::var("REELSYNC_HOME")
        && !root.is_empty()
    {
        return PathBuf::from(root);
    }

    directories::ProjectDirs::from("app", "reelsync", "reelsync")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from(".reelsync"))
}

/// Returns the path to the configuration file.
pub fn config_path() -> PathBuf {
    reelsync_root().join("config.yaml")
}

/// Returns the path to the persisted identity file.
pub fn identity_path() -> PathBuf {
    reelsync_root().join("identity.json")
}
