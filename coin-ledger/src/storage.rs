//! File-backed chain persistence
//!
//! The store only moves bytes. Encoding and verification belong to
//! [`crate::ledger`], so nothing read from disk is trusted until
//! `load_chain` has re-verified it.

use crate::{Config, Result};
use std::path::{Path, PathBuf};

/// Chain file on local disk
#[derive(Debug, Clone)]
pub struct FileChainStore {
    path: PathBuf,
}

impl FileChainStore {
    /// Store at the configured chain file
    pub fn open(config: &Config) -> Result<Self> {
        Self::at(&config.chain_file)
    }

    /// Store at an explicit path, creating parent directories
    pub fn at(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self { path })
    }

    /// Chain file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persist chain bytes atomically (temp file + rename)
    pub fn save(&self, bytes: &[u8]) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, bytes)?;
        std::fs::rename(&tmp, &self.path)?;

        tracing::info!(path = ?self.path, bytes = bytes.len(), "Chain saved");
        Ok(())
    }

    /// Read persisted bytes, `None` if nothing was saved yet
    pub fn load(&self) -> Result<Option<Vec<u8>>> {
        match std::fs::read(&self.path) {
            Ok(bytes) => {
                tracing::debug!(path = ?self.path, bytes = bytes.len(), "Chain file read");
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}
