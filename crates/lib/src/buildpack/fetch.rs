//! Cloning of remote buildpacks.
//!
//! Remote buildpacks are always cloned from scratch into an empty location;
//! there is no incremental fetch.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum FetchError {
  /// Failed to clone a git repository.
  #[error("failed to clone repository '{url}': {source}")]
  Clone {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },

  /// Failed to check out the cloned worktree.
  #[error("failed to check out '{url}': {source}")]
  Checkout {
    url: String,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

/// Clones a remote repository into a local directory.
pub trait Cloner {
  /// Clone `url` into `dest`. `dest` does not exist; its parent does.
  fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), FetchError>;
}

/// Clones with gix over the network.
#[derive(Debug, Clone, Copy, Default)]
pub struct GitCloner;

impl Cloner for GitCloner {
  fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
    debug!(url, path = %dest.display(), "cloning with gix");

    let mut prepared = gix::prepare_clone(url, dest).map_err(|e| FetchError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })?;

    let (mut checkout, _outcome) = prepared
      .fetch_then_checkout(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
      .map_err(|e| FetchError::Clone {
        url: url.to_string(),
        source: Box::new(e),
      })?;

    checkout
      .main_worktree(gix::progress::Discard, &gix::interrupt::IS_INTERRUPTED)
      .map_err(|e| FetchError::Checkout {
        url: url.to_string(),
        source: Box::new(e),
      })?;

    Ok(())
  }
}
