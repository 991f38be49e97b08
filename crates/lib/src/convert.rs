//! Conversion of a custom service into a standalone buildpack.
//!
//! A custom service carries its own build script in the application tree.
//! Converting it produces a directory that satisfies the buildpack contract:
//!
//! ```text
//! <dest>/            copy of the service's approot
//! <dest>/bin/compile the service's build script, verbatim
//! <dest>/bin/release prints the service configuration as YAML
//! ```

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::stack::{StackError, load_stack};
use crate::util::fs::{FsError, copy_tree, write_executable};

#[derive(Debug, Error)]
pub enum ConvertError {
  #[error(transparent)]
  Stack(#[from] StackError),

  /// Only services without a type, or of type `custom`, can be converted.
  #[error("service '{service}' has type '{kind}'; only custom services can be converted to a buildpack")]
  NotCustomService { service: String, kind: String },

  #[error("destination already exists: {0}")]
  DestinationExists(PathBuf),

  #[error("failed to read build script '{path}': {source}")]
  ReadBuildscript {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to serialize configuration of service '{service}': {source}")]
  Serialize {
    service: String,
    #[source]
    source: serde_yaml::Error,
  },

  #[error(transparent)]
  Fs(#[from] FsError),
}

/// Read the raw build script declared by `service`.
pub fn read_buildscript(source_dir: &Path, service: &str) -> Result<Vec<u8>, ConvertError> {
  let stack = load_stack(source_dir)?;
  let path = stack.service(service)?.buildscript_path(source_dir)?;
  std::fs::read(&path).map_err(|source| ConvertError::ReadBuildscript { path, source })
}

/// Turn the custom service `service` of the stack in `source_dir` into a
/// buildpack at `dest_dir`.
///
/// All checks run before anything is written, so a rejected conversion
/// leaves `dest_dir` untouched.
pub fn materialize(source_dir: &Path, service: &str, dest_dir: &Path) -> Result<(), ConvertError> {
  let stack = load_stack(source_dir)?;
  let entry = stack.service(service)?;

  if !entry.config.is_custom() {
    return Err(ConvertError::NotCustomService {
      service: service.to_string(),
      kind: entry.config.kind.clone().unwrap_or_default(),
    });
  }

  let buildscript_path = entry.buildscript_path(source_dir)?;
  if dest_dir.symlink_metadata().is_ok() {
    return Err(ConvertError::DestinationExists(dest_dir.to_path_buf()));
  }

  let buildscript = std::fs::read(&buildscript_path).map_err(|source| ConvertError::ReadBuildscript {
    path: buildscript_path.clone(),
    source,
  })?;
  let config = entry.config.to_yaml().map_err(|source| ConvertError::Serialize {
    service: service.to_string(),
    source,
  })?;

  copy_tree(&entry.root(source_dir), dest_dir, &[])?;

  info!(service, path = %dest_dir.join("bin/compile").display(), "copying build script");
  write_executable(&dest_dir.join("bin").join("compile"), &buildscript)?;

  info!(service, path = %dest_dir.join("bin/release").display(), "writing release script");
  write_executable(&dest_dir.join("bin").join("release"), release_script(&config).as_bytes())?;

  Ok(())
}

/// A `bin/release` that prints `config` verbatim.
fn release_script(config: &str) -> String {
  let mut delimiter = String::from("STACKBREW_CONFIG");
  while config.lines().any(|line| line == delimiter) {
    delimiter.push('_');
  }

  let mut body = config.to_string();
  if !body.ends_with('\n') {
    body.push('\n');
  }

  format!(
    "#!/bin/sh\n\
     \n\
     # Generated by stackbrew from a custom service definition.\n\
     # Prints the service configuration as release metadata.\n\
     \n\
     cat <<'{delimiter}'\n\
     {body}\
     {delimiter}\n"
  )
}
