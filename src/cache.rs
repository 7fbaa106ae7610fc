//! Last-pushed address cache.

use crate::error::Result;
use crate::storage::ensure_dir;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Value reported when nothing has been pushed yet.
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Single-value flat file holding the last address submitted to Route 53.
///
/// There is no locking; overlapping runs must be prevented by whoever
/// schedules them.
#[derive(Debug, Clone)]
pub struct AddressCache {
    path: PathBuf,
}

impl AddressCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cached address, or [`DEFAULT_ADDRESS`] if the file does not exist yet.
    ///
    /// The containing directory is created when missing. Contents are returned raw.
    pub fn load(&self) -> Result<String> {
        self.ensure_parent()?;

        match std::fs::read_to_string(&self.path) {
            Ok(cached) => Ok(cached),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!("No cached address at {}", self.path.display());
                Ok(DEFAULT_ADDRESS.to_string())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrite the cached address. Written to a sibling file first, then renamed into place.
    pub fn store(&self, address: &str) -> Result<()> {
        self.ensure_parent()?;

        let tmp = self.path.with_extension("ip.tmp");
        std::fs::write(&tmp, address)?;
        if let Err(e) = std::fs::rename(&tmp, &self.path) {
            let _ = std::fs::remove_file(&tmp);
            return Err(e.into());
        }

        Ok(())
    }

    fn ensure_parent(&self) -> Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => ensure_dir(parent),
            _ => Ok(()),
        }
    }
}
