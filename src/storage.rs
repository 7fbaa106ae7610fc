//! On-disk layout under the storage root.

use crate::error::{DdnsError, Result};
use std::path::{Path, PathBuf};

const LOGS_DIR: &str = "logs";
const CACHE_DIR: &str = "cache";
const CACHE_FILE: &str = "current.ip";

/// The storage root: `logs/` for the log files, `cache/current.ip` for the last pushed address.
#[derive(Debug, Clone)]
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Platform data directory, falling back to `./storage`.
    pub fn default_root() -> PathBuf {
        dirs::data_local_dir()
            .map(|p| p.join("route53-ddns"))
            .unwrap_or_else(|| PathBuf::from("storage"))
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.root.join(LOGS_DIR)
    }

    pub fn cache_file(&self) -> PathBuf {
        self.root.join(CACHE_DIR).join(CACHE_FILE)
    }
}

/// Create `path` (and parents) unless it already is a directory.
///
/// Losing a creation race to another process is not an error as long as the
/// directory exists afterwards.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if path.is_dir() {
        return Ok(());
    }

    let mut builder = std::fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o755);
    }

    match builder.create(path) {
        Ok(()) => {
            tracing::debug!("Created directory {}", path.display());
            Ok(())
        }
        Err(_) if path.is_dir() => Ok(()),
        Err(source) => Err(DdnsError::FilesystemSetupFailed {
            path: path.to_path_buf(),
            source,
        }),
    }
}
