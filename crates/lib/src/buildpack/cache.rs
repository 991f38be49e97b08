//! Persistent per-buildpack cache directory.
//!
//! Every buildpack gets `<buildpack>/_cache`, passed to `bin/compile` so the
//! buildpack can keep downloaded dependencies between builds. The directory
//! is created on demand and never cleared; its contents belong to the
//! buildpack.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;

use super::ResolvedBuildpack;
use crate::lock::{LockError, PathLock};

#[derive(Debug, Error)]
pub enum CacheError {
  #[error("failed to create cache directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to resolve cache directory '{path}': {source}")]
  Canonicalize {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error(transparent)]
  Lock(#[from] LockError),
}

/// An existing, exclusively locked cache directory.
#[derive(Debug)]
pub struct BuildCache {
  dir: PathBuf,
  _lock: PathLock,
}

impl BuildCache {
  /// Create the buildpack's cache directory if needed and lock it.
  ///
  /// The returned directory is absolute. `holder` is recorded in the lock
  /// file for diagnostics.
  pub fn ensure(buildpack: &ResolvedBuildpack, holder: &str) -> Result<Self, CacheError> {
    let dir = buildpack.cache_dir();
    let lock = PathLock::acquire(&dir, holder)?;

    if !dir.exists() {
      debug!(path = %dir.display(), "creating buildpack cache");
      std::fs::create_dir_all(&dir).map_err(|source| CacheError::CreateDir {
        path: dir.clone(),
        source,
      })?;
    }

    let dir = dunce::canonicalize(&dir).map_err(|source| CacheError::Canonicalize { path: dir, source })?;
    Ok(BuildCache { dir, _lock: lock })
  }

  pub fn dir(&self) -> &Path {
    &self.dir
  }
}
