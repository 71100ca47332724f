//! On-disk cache layout for extracted image metadata.
//!
//! One directory per image id under a per-application cache root. Entries are
//! append-only and never invalidated: a cached extraction for an image id is
//! reused as-is on later runs.

use std::io;
use std::path::{Path, PathBuf};

/// Directory name under the platform cache root.
pub const APP_NAME: &str = "minipaas";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no cache directory available on this platform")]
    NoCacheDir,
    #[error("failed to create cache directory `{path}`: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Root of the per-application metadata cache.
#[derive(Debug, Clone)]
pub struct CacheDir {
    root: PathBuf,
}

impl CacheDir {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Resolves the cache root under the platform cache directory, e.g.
    /// `~/.cache/minipaas` on Linux.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCacheDir`] if the platform exposes no cache
    /// directory.
    pub fn default_location() -> Result<Self> {
        dirs::cache_dir()
            .map(|dir| Self::new(dir.join(APP_NAME)))
            .ok_or(Error::NoCacheDir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the cache directory for the given image id, creating it if
    /// absent. This is the only disk side effect shared across runs.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Create`] if the directory cannot be created.
    pub fn container_path(&self, image_id: &str) -> Result<PathBuf> {
        let dir = self.root.join(image_id);
        std::fs::create_dir_all(&dir).map_err(|source| Error::Create {
            path: dir.clone(),
            source,
        })?;
        Ok(dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_path_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = CacheDir::new(tmp.path());

        let dir = cache.container_path("sha256:6950f0abc123").unwrap();
        assert!(dir.is_dir());
        assert_eq!(dir, tmp.path().join("sha256:6950f0abc123"));
    }

    #[test]
    fn test_container_path_is_idempotent() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = CacheDir::new(tmp.path());

        let first = cache.container_path("abc").unwrap();
        let second = cache.container_path("abc").unwrap();
        assert_eq!(first, second);
    }
}
