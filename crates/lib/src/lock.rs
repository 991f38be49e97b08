//! Advisory file locks guarding shared cache directories.
//!
//! Remote buildpack clones and buildpack `_cache` directories outlive a single
//! invocation, so two concurrent builds could otherwise delete a clone while
//! the other is compiling from it. Each guarded path gets a sibling lock file
//! holding JSON metadata about the current holder.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Serialize, Deserialize)]
pub struct LockMetadata {
  pub version: u32,
  pub pid: u32,
  pub started_at_unix: u64,
  pub command: String,
  pub path: PathBuf,
}

#[derive(Debug, Error)]
pub enum LockError {
  #[error("failed to create lock directory '{path}': {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to open lock file '{path}': {source}")]
  OpenFile {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write lock metadata to '{path}': {source}")]
  WriteMetadata {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to acquire lock '{path}': {source}")]
  LockFailed {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// An exclusive lock on a path, released on drop.
#[derive(Debug)]
pub struct PathLock {
  file: File,
  lock_path: PathBuf,
}

impl PathLock {
  /// Lock file used to guard `guarded`: the same path with `.lock` appended.
  pub fn lock_path_for(guarded: &Path) -> PathBuf {
    let mut name = guarded.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
  }

  /// Take the exclusive lock guarding `guarded`, waiting if another process holds it.
  ///
  /// `command` is recorded in the lock file so a waiting process can report
  /// who it is waiting on.
  pub fn acquire(guarded: &Path, command: &str) -> Result<Self, LockError> {
    let lock_path = Self::lock_path_for(guarded);

    if let Some(parent) = lock_path.parent()
      && !parent.as_os_str().is_empty()
      && !parent.exists()
    {
      std::fs::create_dir_all(parent).map_err(|source| LockError::CreateDir {
        path: parent.to_path_buf(),
        source,
      })?;
    }

    let file = OpenOptions::new()
      .read(true)
      .write(true)
      .create(true)
      .truncate(false)
      .open(&lock_path)
      .map_err(|source| LockError::OpenFile {
        path: lock_path.clone(),
        source,
      })?;

    match lock(&file, false) {
      Ok(()) => {}
      Err(err) if err.kind() == io::ErrorKind::WouldBlock => {
        match read_holder(&lock_path) {
          Some(holder) => info!(
            path = %guarded.display(),
            pid = holder.pid,
            command = %holder.command,
            started_at_unix = holder.started_at_unix,
            "waiting for lock"
          ),
          None => info!(path = %guarded.display(), "waiting for lock"),
        }
        lock(&file, true).map_err(|source| LockError::LockFailed {
          path: lock_path.clone(),
          source,
        })?;
      }
      Err(source) => {
        return Err(LockError::LockFailed {
          path: lock_path,
          source,
        });
      }
    }

    write_metadata(&file, command, guarded).map_err(|source| LockError::WriteMetadata {
      path: lock_path.clone(),
      source,
    })?;

    debug!(path = %lock_path.display(), "lock acquired");
    Ok(PathLock { file, lock_path })
  }

  /// Reads the lock metadata from the held file handle.
  pub fn read_metadata(&self) -> io::Result<LockMetadata> {
    let mut file = &self.file;
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).map_err(io::Error::other)
  }

  pub fn lock_path(&self) -> &Path {
    &self.lock_path
  }
}

fn write_metadata(file: &File, command: &str, guarded: &Path) -> io::Result<()> {
  let metadata = LockMetadata {
    version: 1,
    pid: std::process::id(),
    started_at_unix: SystemTime::now()
      .duration_since(UNIX_EPOCH)
      .unwrap_or_default()
      .as_secs(),
    command: command.to_string(),
    path: guarded.to_path_buf(),
  };

  file.set_len(0)?;
  let mut writer = io::BufWriter::new(file);
  writer.seek(SeekFrom::Start(0))?;
  serde_json::to_writer_pretty(&mut writer, &metadata).map_err(io::Error::other)?;
  writer.flush()
}

fn read_holder(lock_path: &Path) -> Option<LockMetadata> {
  let contents = std::fs::read_to_string(lock_path).ok()?;
  serde_json::from_str(&contents).ok()
}

/// Whether some handle currently holds the lock guarding `guarded`.
#[cfg(test)]
pub(crate) fn is_locked(guarded: &Path) -> bool {
  let Ok(file) = File::open(PathLock::lock_path_for(guarded)) else {
    return false;
  };
  matches!(lock(&file, false), Err(err) if err.kind() == io::ErrorKind::WouldBlock)
}

#[cfg(unix)]
fn lock(file: &File, blocking: bool) -> io::Result<()> {
  use rustix::fs::{FlockOperation, flock};
  use std::os::unix::io::AsFd;

  let operation = if blocking {
    FlockOperation::LockExclusive
  } else {
    FlockOperation::NonBlockingLockExclusive
  };

  flock(file.as_fd(), operation).map_err(|e| io::Error::from_raw_os_error(e.raw_os_error()))
}

#[cfg(windows)]
fn lock(file: &File, blocking: bool) -> io::Result<()> {
  use std::os::windows::io::AsRawHandle;
  use windows_sys::Win32::Foundation::HANDLE;
  use windows_sys::Win32::Storage::FileSystem::{LOCKFILE_EXCLUSIVE_LOCK, LOCKFILE_FAIL_IMMEDIATELY, LockFileEx};

  let handle = file.as_raw_handle() as HANDLE;
  let flags = if blocking {
    LOCKFILE_EXCLUSIVE_LOCK
  } else {
    LOCKFILE_FAIL_IMMEDIATELY | LOCKFILE_EXCLUSIVE_LOCK
  };

  // SAFETY: OVERLAPPED is a plain data struct that is valid when zero-initialized.
  // LockFileEx is safe to call with a valid file handle and zeroed OVERLAPPED.
  let result = unsafe {
    let mut overlapped = std::mem::zeroed();
    LockFileEx(handle, flags, 0, 1, 0, &mut overlapped)
  };

  if result == 0 {
    let err = io::Error::last_os_error();
    // ERROR_LOCK_VIOLATION
    if err.raw_os_error() == Some(33) {
      return Err(io::Error::from(io::ErrorKind::WouldBlock));
    }
    Err(err)
  } else {
    Ok(())
  }
}
