//! Runtime settings for buildpack resolution.

use std::path::PathBuf;

use crate::consts::{APP_NAME, BUILDPACK_PATH_ENV, CACHE_DIR_ENV};

/// Where buildpacks are looked up and where remote buildpacks are cloned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
  /// Ordered directories searched for named buildpacks.
  pub search_path: Vec<PathBuf>,
  /// Root of the remote download cache (`{root}/{host}/{path}`).
  pub download_root: PathBuf,
}

impl Settings {
  /// Build settings from an optional colon-separated search path and an
  /// optional download root. Missing values fall back to the defaults.
  pub fn new(search_path: Option<&str>, download_root: Option<PathBuf>) -> Self {
    Settings {
      search_path: search_path.map(parse_search_path).unwrap_or_default(),
      download_root: download_root.unwrap_or_else(default_download_root),
    }
  }

  /// Read `BUILDPACK_PATH` and `STACKBREW_CACHE_DIR` from the environment.
  pub fn from_env() -> Self {
    let search_path = std::env::var(BUILDPACK_PATH_ENV).ok();
    let download_root = std::env::var_os(CACHE_DIR_ENV)
      .filter(|v| !v.is_empty())
      .map(PathBuf::from);
    Self::new(search_path.as_deref(), download_root)
  }
}

impl Default for Settings {
  fn default() -> Self {
    Self::new(None, None)
  }
}

/// Split a colon-separated search path, dropping empty entries.
pub fn parse_search_path(value: &str) -> Vec<PathBuf> {
  value
    .split(':')
    .filter(|entry| !entry.is_empty())
    .map(PathBuf::from)
    .collect()
}

pub fn default_download_root() -> PathBuf {
  std::env::temp_dir().join(APP_NAME)
}
