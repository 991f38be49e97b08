//! Buildpack resolution.
//!
//! A buildpack reference is resolved, in order, as:
//! 1. a remote git URL (`http(s)://…/*.git` or `git://…`), cloned fresh into
//!    `{download_root}/{host}/{path}`;
//! 2. a literal filesystem path that exists;
//! 3. a name found in one of the search path directories.

pub mod cache;
pub mod fetch;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use url::Url;
use walkdir::WalkDir;

use crate::config::Settings;
use crate::consts::BUILDPACK_CACHE_DIR;
use crate::lock::{LockError, PathLock};
use crate::util::fs::join_path;

pub use cache::{BuildCache, CacheError};
pub use fetch::{Cloner, FetchError, GitCloner};

#[derive(Debug, Error)]
pub enum ResolveError {
  /// No remote, literal or search path match.
  #[error("no such buildpack: '{reference}'{}", format_searched(.searched))]
  BuildpackNotFound { reference: String, searched: Vec<PathBuf> },

  #[error("failed to clone buildpack '{reference}': {source}")]
  CloneFailed {
    reference: String,
    #[source]
    source: FetchError,
  },

  #[error("failed to remove previous clone '{path}': {source}")]
  RemoveStale {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to create download directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  /// A remote URL without a repository path would claim a whole host directory.
  #[error("remote buildpack '{reference}' has no repository path")]
  EmptyRemotePath { reference: String },

  #[error(transparent)]
  Lock(#[from] LockError),
}

fn format_searched(searched: &[PathBuf]) -> String {
  if searched.is_empty() {
    return " (search path is empty)".to_string();
  }
  let list: Vec<String> = searched.iter().map(|p| p.display().to_string()).collect();
  format!(" (searched: {})", list.join(", "))
}

/// A buildpack reference that points at a remote git repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteRef {
  pub url: String,
  pub host: String,
  pub path: String,
}

impl RemoteRef {
  /// Classify `reference`; `None` means it is not a remote reference.
  pub fn parse(reference: &str) -> Option<Self> {
    let url = Url::parse(reference).ok()?;
    let remote = match url.scheme() {
      "http" | "https" => url.path().ends_with(".git"),
      "git" => true,
      _ => false,
    };
    if !remote {
      return None;
    }

    Some(RemoteRef {
      url: reference.to_string(),
      host: url.host_str()?.to_string(),
      path: url.path().trim_matches('/').to_string(),
    })
  }

  /// Download location for this reference under `root`.
  pub fn cache_path(&self, root: &Path) -> PathBuf {
    join_path([root, Path::new(&self.host), Path::new(&self.path)])
  }
}

/// How a reference was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
  Remote,
  Literal,
  SearchPath,
}

impl fmt::Display for Origin {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Origin::Remote => write!(f, "remote"),
      Origin::Literal => write!(f, "path"),
      Origin::SearchPath => write!(f, "search path"),
    }
  }
}

/// A buildpack available as a local directory.
///
/// For remote buildpacks the download location stays locked until this value
/// is dropped, so another invocation cannot re-clone it mid-build.
#[derive(Debug)]
pub struct ResolvedBuildpack {
  pub reference: String,
  pub dir: PathBuf,
  pub origin: Origin,
  _lock: Option<PathLock>,
}

impl ResolvedBuildpack {
  pub(crate) fn local(reference: &str, dir: PathBuf) -> Self {
    ResolvedBuildpack {
      reference: reference.to_string(),
      dir,
      origin: Origin::Literal,
      _lock: None,
    }
  }

  pub fn compile_path(&self) -> PathBuf {
    self.dir.join("bin").join("compile")
  }

  /// `bin/release`, if the buildpack has one.
  pub fn release_path(&self) -> Option<PathBuf> {
    let path = self.dir.join("bin").join("release");
    path.is_file().then_some(path)
  }

  pub fn cache_dir(&self) -> PathBuf {
    self.dir.join(BUILDPACK_CACHE_DIR)
  }
}

/// Resolves buildpack references using the configured search path and
/// download root.
#[derive(Debug, Clone)]
pub struct Resolver<C = GitCloner> {
  settings: Settings,
  cloner: C,
}

impl Resolver<GitCloner> {
  pub fn new(settings: Settings) -> Self {
    Self::with_cloner(settings, GitCloner)
  }
}

impl<C: Cloner> Resolver<C> {
  pub fn with_cloner(settings: Settings, cloner: C) -> Self {
    Resolver { settings, cloner }
  }

  pub fn settings(&self) -> &Settings {
    &self.settings
  }

  /// Resolve `reference` to a local buildpack directory.
  pub fn resolve(&self, reference: &str) -> Result<ResolvedBuildpack, ResolveError> {
    if let Some(remote) = RemoteRef::parse(reference) {
      return self.resolve_remote(&remote);
    }

    let literal = Path::new(reference);
    if literal.exists() {
      debug!(buildpack = reference, "using literal path");
      return Ok(ResolvedBuildpack::local(reference, literal.to_path_buf()));
    }

    let mut searched = Vec::with_capacity(self.settings.search_path.len());
    for entry in &self.settings.search_path {
      let candidate = entry.join(reference);
      debug!(path = %candidate.display(), "checking search path");
      if candidate.exists() {
        return Ok(ResolvedBuildpack {
          reference: reference.to_string(),
          dir: candidate,
          origin: Origin::SearchPath,
          _lock: None,
        });
      }
      searched.push(candidate);
    }

    Err(ResolveError::BuildpackNotFound {
      reference: reference.to_string(),
      searched,
    })
  }

  /// Replace any previous clone of `remote` with a fresh one.
  ///
  /// Remote paths can nest (`packs` and `packs/ruby`), so clones enclosing
  /// or enclosed by the download location are locked too, outermost first,
  /// while the old tree is removed and the new one cloned. Only the lock on
  /// the clone itself outlives this call.
  fn resolve_remote(&self, remote: &RemoteRef) -> Result<ResolvedBuildpack, ResolveError> {
    if remote.path.is_empty() {
      return Err(ResolveError::EmptyRemotePath {
        reference: remote.url.clone(),
      });
    }

    let root = &self.settings.download_root;
    let dest = remote.cache_path(root);
    let holder = format!("clone {}", remote.url);

    let mut overlapping = Vec::new();
    for outer in enclosing_clones(root, &dest) {
      debug!(path = %outer.display(), "locking enclosing clone");
      overlapping.push(PathLock::acquire(&outer, &holder)?);
    }
    let lock = PathLock::acquire(&dest, &holder)?;
    for inner in nested_clones(&dest) {
      debug!(path = %inner.display(), "locking nested clone");
      overlapping.push(PathLock::acquire(&inner, &holder)?);
    }

    if dest.exists() {
      debug!(path = %dest.display(), "removing previous clone");
      std::fs::remove_dir_all(&dest).map_err(|source| ResolveError::RemoveStale {
        path: dest.clone(),
        source,
      })?;
    }

    if let Some(parent) = dest.parent() {
      std::fs::create_dir_all(parent).map_err(|source| ResolveError::CreateDir {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    info!(url = %remote.url, path = %dest.display(), "cloning buildpack");
    self
      .cloner
      .clone_repo(&remote.url, &dest)
      .map_err(|source| ResolveError::CloneFailed {
        reference: remote.url.clone(),
        source,
      })?;
    drop(overlapping);

    Ok(ResolvedBuildpack {
      reference: remote.url.clone(),
      dir: dest,
      origin: Origin::Remote,
      _lock: Some(lock),
    })
  }
}

/// Directories between `root` and `dest` that are guarded clones, outermost first.
fn enclosing_clones(root: &Path, dest: &Path) -> Vec<PathBuf> {
  let mut found: Vec<PathBuf> = dest
    .ancestors()
    .skip(1)
    .take_while(|dir| dir.starts_with(root) && *dir != root)
    .filter(|dir| PathLock::lock_path_for(dir).is_file())
    .map(Path::to_path_buf)
    .collect();
  found.reverse();
  found
}

/// Guarded directories inside `dest` (nested clones and build caches): those
/// with a sibling `.lock` file, outermost first. Git metadata is not searched.
fn nested_clones(dest: &Path) -> Vec<PathBuf> {
  if !dest.is_dir() {
    return Vec::new();
  }

  let mut found: Vec<PathBuf> = WalkDir::new(dest)
    .min_depth(1)
    .into_iter()
    .filter_entry(|entry| entry.file_name() != ".git")
    .flatten()
    .filter(|entry| entry.file_type().is_file())
    .filter_map(|entry| {
      let name = entry.file_name().to_str()?;
      let clone = name.strip_suffix(".lock").filter(|stem| !stem.is_empty())?;
      let dir = entry.path().with_file_name(clone);
      dir.is_dir().then_some(dir)
    })
    .collect();
  found.sort_by_key(|dir| dir.components().count());
  found
}
