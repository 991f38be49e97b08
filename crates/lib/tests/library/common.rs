//! Shared helpers for library integration tests.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use stackbrew_lib::build::ServiceBuilder;
use stackbrew_lib::config::Settings;
use tempfile::TempDir;

/// Compile script that records its arguments and drops a marker in the build dir.
pub const RECORDING_COMPILE: &str = r#"#!/bin/sh
set -e
echo "$1" > "$2/last-build"
touch "$1/compiled"
"#;

/// Scratch layout: `app/` (source), `packs/` (search path), `out/` (build dir).
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  pub fn new(stackfile: &str) -> Self {
    let temp = TempDir::new().unwrap();
    fs::create_dir_all(temp.path().join("app")).unwrap();
    fs::create_dir_all(temp.path().join("packs")).unwrap();
    fs::write(temp.path().join("app/Stackfile"), stackfile).unwrap();
    TestEnv { temp }
  }

  pub fn source(&self) -> PathBuf {
    self.temp.path().join("app")
  }

  pub fn build_dir(&self) -> PathBuf {
    self.temp.path().join("out")
  }

  pub fn packs(&self) -> PathBuf {
    self.temp.path().join("packs")
  }

  pub fn write_source(&self, relative: &str, content: &str) {
    let path = self.source().join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
  }

  /// Create `packs/<name>` with the given scripts.
  pub fn buildpack(&self, name: &str, compile: &str, release: Option<&str>) -> PathBuf {
    let dir = self.packs().join(name);
    write_script(&dir.join("bin/compile"), compile);
    if let Some(release) = release {
      write_script(&dir.join("bin/release"), release);
    }
    dir
  }

  pub fn builder(&self) -> ServiceBuilder {
    ServiceBuilder::new(Settings {
      search_path: vec![self.packs()],
      download_root: self.temp.path().join("downloads"),
    })
  }
}

pub fn write_script(path: &Path, content: &str) {
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
  fs::set_permissions(path, fs::Permissions::from_mode(0o755)).unwrap();
}
