//! Stack descriptor model and loader.
//!
//! A stack descriptor (`Stackfile`) is a YAML mapping from service name to
//! service configuration:
//!
//! ```yaml
//! web:
//!   type: python
//!   approot: web
//! worker:
//!   type: custom
//!   buildscript: builder/build.sh
//! ```
//!
//! Service order follows the file, so builds and `deploy.json` are
//! deterministic across runs.

mod load;
mod types;

use std::path::PathBuf;

use thiserror::Error;

pub use load::{find_stackfile, load_stack};
pub use types::{Service, ServiceConfig, Stack};

/// Errors that can occur while loading or querying a stack.
#[derive(Debug, Error)]
pub enum StackError {
  /// None of the recognized descriptor files exist.
  #[error("no stack descriptor found in '{dir}' (looked for {candidates})")]
  NotFound { dir: PathBuf, candidates: String },

  #[error("failed to read stack descriptor '{path}': {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse stack descriptor '{path}': {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("stack descriptor '{path}' is not a mapping of services")]
  NotAMapping { path: PathBuf },

  #[error("stack descriptor '{path}' has a non-string service name: {key}")]
  InvalidServiceName { path: PathBuf, key: String },

  #[error("invalid configuration for service '{service}' in '{path}': {source}")]
  InvalidService {
    path: PathBuf,
    service: String,
    #[source]
    source: serde_yaml::Error,
  },

  #[error("no such service: {0}")]
  ServiceNotFound(String),

  #[error("service '{0}' does not declare a buildscript")]
  MissingBuildscript(String),
}
