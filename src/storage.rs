// SPDX-License-Identifier: MPL-2.0

//! Storage utilities for snapshots, recordings and exported results

use crate::config::Config;
use crate::constants::files;
use crate::errors::AppResult;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Build a file name like `snapshot_20240131_235959.png`
pub fn timestamped_name(prefix: &str, extension: &str) -> String {
    let timestamp = chrono::Local::now().format(files::TIMESTAMP_FORMAT);
    format!("{}_{}.{}", prefix, timestamp, extension)
}

/// Destination directory for everything the app writes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputDirs {
    root: PathBuf,
}

impl OutputDirs {
    /// Use an explicit directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolve the output directory from the configuration.
    ///
    /// Without an override, files go to the current working directory.
    pub fn resolve(config: &Config) -> Self {
        let root = config
            .output_dir
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));
        debug!(path = %root.display(), "Resolved output directory");
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Make sure the directory exists and return a fresh timestamped path in it
    pub fn next_path(&self, prefix: &str, extension: &str) -> AppResult<PathBuf> {
        ensure_directory(&self.root)?;
        Ok(self.root.join(timestamped_name(prefix, extension)))
    }
}

impl Default for OutputDirs {
    fn default() -> Self {
        Self::resolve(&Config::default())
    }
}

/// Create a directory (and parents) if it does not exist yet
pub fn ensure_directory(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
        info!(path = %path.display(), "Created output directory");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamped_name_shape() {
        let name = timestamped_name("snapshot", "png");
        assert!(name.starts_with("snapshot_"));
        assert!(name.ends_with(".png"));
        // snapshot_YYYYMMDD_HHMMSS.png
        assert_eq!(name.len(), "snapshot_".len() + 15 + ".png".len());
    }

    #[test]
    fn test_next_path_creates_directory() {
        let dir = std::env::temp_dir().join(format!("vislab-storage-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        let outputs = OutputDirs::new(&dir);
        let path = outputs.next_path("recording", "avi").unwrap();
        assert!(dir.is_dir());
        assert_eq!(path.parent(), Some(dir.as_path()));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
