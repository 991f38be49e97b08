//! Filesystem helpers: path joining, recursive copy and executable files.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum FsError {
  #[error("source directory does not exist: {0}")]
  SourceNotFound(PathBuf),

  #[error("destination already exists: {0}")]
  DestinationExists(PathBuf),

  #[error("failed to resolve path '{path}': {source}")]
  Canonicalize {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to walk '{path}': {source}")]
  Walk {
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  #[error("failed to create directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to copy '{from}' to '{to}': {source}")]
  Copy {
    from: PathBuf,
    to: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write '{path}': {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Join a sequence of path segments into one path.
///
/// An absolute segment replaces everything before it, as with [`PathBuf::push`].
pub fn join_path<I, P>(segments: I) -> PathBuf
where
  I: IntoIterator<Item = P>,
  P: AsRef<Path>,
{
  segments.into_iter().fold(PathBuf::new(), |mut path, segment| {
    path.push(segment);
    path
  })
}

/// Recursively copy the directory `src` to `dst`.
///
/// `dst` must not exist. Paths listed in `exclude` (and `dst` itself, when it
/// lives inside `src`) are skipped. Regular files keep their permissions;
/// symlinks are recreated rather than followed on unix.
pub fn copy_tree(src: &Path, dst: &Path, exclude: &[&Path]) -> Result<(), FsError> {
  if !src.is_dir() {
    return Err(FsError::SourceNotFound(src.to_path_buf()));
  }
  if dst.exists() {
    return Err(FsError::DestinationExists(dst.to_path_buf()));
  }

  info!(src = %src.display(), dst = %dst.display(), "copying directory");

  let root = dunce::canonicalize(src).map_err(|source| FsError::Canonicalize {
    path: src.to_path_buf(),
    source,
  })?;

  fs::create_dir_all(dst).map_err(|source| FsError::CreateDir {
    path: dst.to_path_buf(),
    source,
  })?;

  // Paths that don't exist can't show up in the walk.
  let excluded: Vec<PathBuf> = exclude
    .iter()
    .copied()
    .chain(std::iter::once(dst))
    .filter_map(|path| dunce::canonicalize(path).ok())
    .collect();

  let walker = WalkDir::new(&root)
    .min_depth(1)
    .into_iter()
    .filter_entry(|entry| !excluded.iter().any(|skip| skip == entry.path()));

  for entry in walker {
    let entry = entry.map_err(|source| FsError::Walk {
      path: root.clone(),
      source,
    })?;
    let Ok(relative) = entry.path().strip_prefix(&root) else {
      continue;
    };
    let target = dst.join(relative);
    let file_type = entry.file_type();

    if file_type.is_dir() {
      fs::create_dir_all(&target).map_err(|source| FsError::CreateDir {
        path: target.clone(),
        source,
      })?;
    } else if file_type.is_symlink() {
      copy_symlink(entry.path(), &target)?;
    } else {
      fs::copy(entry.path(), &target).map_err(|source| FsError::Copy {
        from: entry.path().to_path_buf(),
        to: target.clone(),
        source,
      })?;
    }
  }

  debug!(dst = %dst.display(), "copy complete");
  Ok(())
}

#[cfg(unix)]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), FsError> {
  let copy_err = |source| FsError::Copy {
    from: from.to_path_buf(),
    to: to.to_path_buf(),
    source,
  };
  let link_target = fs::read_link(from).map_err(copy_err)?;
  std::os::unix::fs::symlink(&link_target, to).map_err(copy_err)
}

#[cfg(windows)]
fn copy_symlink(from: &Path, to: &Path) -> Result<(), FsError> {
  fs::copy(from, to).map(|_| ()).map_err(|source| FsError::Copy {
    from: from.to_path_buf(),
    to: to.to_path_buf(),
    source,
  })
}

/// Write `contents` to `path` and mark it executable, creating parent directories.
pub fn write_executable(path: &Path, contents: &[u8]) -> Result<(), FsError> {
  if let Some(parent) = path.parent() {
    fs::create_dir_all(parent).map_err(|source| FsError::CreateDir {
      path: parent.to_path_buf(),
      source,
    })?;
  }

  let write_err = |source| FsError::Write {
    path: path.to_path_buf(),
    source,
  };
  fs::write(path, contents).map_err(write_err)?;
  set_executable(path).map_err(write_err)
}

#[cfg(unix)]
fn set_executable(path: &Path) -> io::Result<()> {
  use std::os::unix::fs::PermissionsExt;
  fs::set_permissions(path, fs::Permissions::from_mode(0o755))
}

#[cfg(windows)]
fn set_executable(_path: &Path) -> io::Result<()> {
  Ok(())
}
