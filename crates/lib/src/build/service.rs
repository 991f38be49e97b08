//! Single service build.
//!
//! Runs a buildpack's compile/release contract against a staged build
//! directory:
//!
//! ```text
//! bin/compile <build_dir> <cache_dir>   # required, stdio inherited
//! bin/release <build_dir>               # optional, stdout = YAML mapping
//! ```

use std::path::Path;

use tracing::{debug, info};

use crate::build::types::{BuildError, ReleaseFailure, ReleaseMetadata, parse_release};
use crate::buildpack::{BuildCache, Cloner, GitCloner, Resolver};
use crate::config::Settings;
use crate::process::{Output, StepRunner, SystemRunner};

/// Builds services with a resolver and a process runner.
#[derive(Debug, Clone)]
pub struct ServiceBuilder<C = GitCloner, R = SystemRunner> {
  resolver: Resolver<C>,
  runner: R,
}

impl ServiceBuilder {
  /// A builder that clones with git and spawns real processes.
  pub fn new(settings: Settings) -> Self {
    Self::with_parts(Resolver::new(settings), SystemRunner)
  }
}

impl<C: Cloner, R: StepRunner> ServiceBuilder<C, R> {
  pub fn with_parts(resolver: Resolver<C>, runner: R) -> Self {
    ServiceBuilder { resolver, runner }
  }

  pub fn resolver(&self) -> &Resolver<C> {
    &self.resolver
  }

  /// Build `service` in place at `build_dir` using `buildpack`.
  ///
  /// Returns the release metadata, or an empty mapping when the buildpack
  /// has no `bin/release`. A non-zero compile exit aborts the build.
  pub fn build(&self, service: &str, build_dir: &Path, buildpack: &str) -> Result<ReleaseMetadata, BuildError> {
    let resolved = self.resolver.resolve(buildpack)?;

    let compile = resolved.compile_path();
    if !compile.is_file() {
      return Err(BuildError::InvalidBuildpack {
        buildpack: buildpack.to_string(),
        dir: resolved.dir.clone(),
      });
    }

    let cache = BuildCache::ensure(&resolved, &format!("compile {}", service))?;

    info!(
      service,
      buildpack,
      origin = %resolved.origin,
      build_dir = %build_dir.display(),
      cache_dir = %cache.dir().display(),
      "compiling service"
    );

    let compiled = self
      .runner
      .run(
        &compile,
        &[build_dir.as_os_str(), cache.dir().as_os_str()],
        Output::Inherit,
      )
      .map_err(|source| BuildError::Spawn {
        program: compile.clone(),
        source,
      })?;

    if !compiled.success() {
      return Err(BuildError::CompileFailed {
        service: service.to_string(),
        buildpack: buildpack.to_string(),
        code: compiled.code,
      });
    }
    drop(cache);

    let Some(release) = resolved.release_path() else {
      debug!(service, buildpack, "buildpack has no release step");
      return Ok(ReleaseMetadata::new());
    };

    let released = self
      .runner
      .run(&release, &[build_dir.as_os_str()], Output::Capture)
      .map_err(|source| BuildError::Spawn {
        program: release.clone(),
        source,
      })?;

    let release_failed = |reason| BuildError::ReleaseFailed {
      service: service.to_string(),
      buildpack: buildpack.to_string(),
      reason,
    };

    if !released.success() {
      return Err(release_failed(ReleaseFailure::Exit(released.code)));
    }

    let metadata = parse_release(&released.stdout).map_err(release_failed)?;
    debug!(service, keys = metadata.len(), "release metadata parsed");
    Ok(metadata)
  }
}
