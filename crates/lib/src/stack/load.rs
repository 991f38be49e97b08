use std::path::{Path, PathBuf};

use tracing::debug;

use super::{Stack, StackError};
use crate::consts::STACKFILE_NAMES;

/// Return the first stack descriptor that exists in `dir`, by priority.
pub fn find_stackfile(dir: &Path) -> Option<PathBuf> {
  STACKFILE_NAMES
    .iter()
    .map(|name| dir.join(name))
    .find(|path| path.is_file())
}

/// Load the stack descriptor from an application directory.
pub fn load_stack(dir: &Path) -> Result<Stack, StackError> {
  let path = find_stackfile(dir).ok_or_else(|| StackError::NotFound {
    dir: dir.to_path_buf(),
    candidates: STACKFILE_NAMES.join(", "),
  })?;

  debug!(path = %path.display(), "loading stack descriptor");

  let text = std::fs::read_to_string(&path).map_err(|source| StackError::Read {
    path: path.clone(),
    source,
  })?;

  Stack::parse(&text, &path)
}
