//! Whole-stack builds.
//!
//! Every service gets a full copy of the source tree at
//! `<build_dir>/<service>/`, is built in place by its buildpack, and
//! contributes its release metadata to `<build_dir>/deploy.json`.

use std::io;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::build::service::ServiceBuilder;
use crate::build::types::{BuildError, DeployDescriptor};
use crate::buildpack::Cloner;
use crate::consts::DEPLOY_FILENAME;
use crate::process::StepRunner;
use crate::stack::{StackError, load_stack};
use crate::util::fs::{FsError, copy_tree};

#[derive(Debug, Error)]
pub enum StackBuildError {
  /// The target build directory must not exist yet.
  #[error("build directory already exists: {0}")]
  BuildDirExists(PathBuf),

  #[error(transparent)]
  Stack(#[from] StackError),

  /// A service has no `type` to pick a buildpack with.
  #[error("service '{0}' does not declare a type")]
  MissingServiceType(String),

  /// A service name can't be used as a directory name.
  #[error("service name '{0}' is not a valid directory name")]
  InvalidServiceName(String),

  /// A service name collides with a file the build writes next to the services.
  #[error("service name '{0}' is reserved")]
  ReservedServiceName(String),

  #[error("failed to create build directory '{path}': {source}")]
  CreateBuildDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to stage service '{service}': {source}")]
  Stage {
    service: String,
    #[source]
    source: FsError,
  },

  #[error("build of service '{service}' failed: {source}")]
  ServiceFailed {
    service: String,
    #[source]
    source: BuildError,
  },

  #[error("failed to write deploy descriptor '{path}': {source}")]
  WriteDeploy {
    path: PathBuf,
    #[source]
    source: io::Error,
  },
}

/// Build every service of the stack in `source_dir` into `build_dir`.
///
/// Services are built one at a time in descriptor order. The first failure
/// aborts the build; directories already staged are left in place.
pub fn build_stack<C: Cloner, R: StepRunner>(
  builder: &ServiceBuilder<C, R>,
  source_dir: &Path,
  build_dir: &Path,
) -> Result<DeployDescriptor, StackBuildError> {
  if build_dir.symlink_metadata().is_ok() {
    return Err(StackBuildError::BuildDirExists(build_dir.to_path_buf()));
  }

  let stack = load_stack(source_dir)?;

  // Reject bad services up front so nothing is staged for a stack that can't finish.
  let mut plan = Vec::with_capacity(stack.len());
  for service in stack.services() {
    if !is_plain_name(&service.name) {
      return Err(StackBuildError::InvalidServiceName(service.name.clone()));
    }
    if service.name == DEPLOY_FILENAME {
      return Err(StackBuildError::ReservedServiceName(service.name.clone()));
    }
    let buildpack = service
      .config
      .kind
      .as_deref()
      .ok_or_else(|| StackBuildError::MissingServiceType(service.name.clone()))?;
    plan.push((service.name.as_str(), buildpack));
  }

  std::fs::create_dir_all(build_dir).map_err(|source| StackBuildError::CreateBuildDir {
    path: build_dir.to_path_buf(),
    source,
  })?;
  let build_root = dunce::canonicalize(build_dir).map_err(|source| StackBuildError::CreateBuildDir {
    path: build_dir.to_path_buf(),
    source,
  })?;

  info!(
    source = %source_dir.display(),
    build_dir = %build_root.display(),
    services = plan.len(),
    "building stack"
  );

  let mut deploy = DeployDescriptor::default();
  for (service, buildpack) in plan {
    info!(service, buildpack, "staging service");
    let service_dir = build_root.join(service);
    copy_tree(source_dir, &service_dir, &[&build_root]).map_err(|source| StackBuildError::Stage {
      service: service.to_string(),
      source,
    })?;

    let metadata = builder
      .build(service, &service_dir, buildpack)
      .map_err(|source| StackBuildError::ServiceFailed {
        service: service.to_string(),
        source,
      })?;
    deploy.insert(service, metadata);
  }

  let deploy_path = build_root.join(DEPLOY_FILENAME);
  let json = deploy.to_json().map_err(|e| StackBuildError::WriteDeploy {
    path: deploy_path.clone(),
    source: io::Error::other(e),
  })?;
  std::fs::write(&deploy_path, format!("{}\n", json)).map_err(|source| StackBuildError::WriteDeploy {
    path: deploy_path.clone(),
    source,
  })?;

  info!(path = %deploy_path.display(), services = deploy.len(), "deploy descriptor written");
  Ok(deploy)
}

/// A single normal path component: no separators, `.` or `..`.
fn is_plain_name(name: &str) -> bool {
  let mut components = Path::new(name).components();
  matches!(
    (components.next(), components.next()),
    (Some(Component::Normal(_)), None)
  )
}
