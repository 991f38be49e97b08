//! Test utilities for stackbrew-lib.
//!
//! Fakes for the process and clone seams, plus a helper to lay out buildpack
//! directories on disk.

use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::buildpack::{Cloner, FetchError};
use crate::process::{Output, StepOutput, StepRunner};

/// A single invocation seen by [`FakeRunner`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
  pub program: PathBuf,
  pub args: Vec<OsString>,
  pub output: Output,
}

impl RecordedCall {
  /// File name of the program (`compile`, `release`, ...).
  pub fn step(&self) -> String {
    self
      .program
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default()
  }
}

#[derive(Debug, Default)]
struct RunnerState {
  calls: Vec<RecordedCall>,
  responses: HashMap<String, StepOutput>,
}

/// Records invocations and answers with canned outputs keyed by program file name.
///
/// Unconfigured steps exit 0 with empty output.
#[derive(Debug, Clone, Default)]
pub struct FakeRunner {
  state: Arc<Mutex<RunnerState>>,
}

impl FakeRunner {
  pub fn respond(self, step: &str, code: Option<i32>, stdout: &str) -> Self {
    self.state.lock().unwrap().responses.insert(
      step.to_string(),
      StepOutput {
        code,
        stdout: stdout.as_bytes().to_vec(),
      },
    );
    self
  }

  pub fn calls(&self) -> Vec<RecordedCall> {
    self.state.lock().unwrap().calls.clone()
  }
}

impl StepRunner for FakeRunner {
  fn run(&self, program: &Path, args: &[&OsStr], output: Output) -> io::Result<StepOutput> {
    let call = RecordedCall {
      program: program.to_path_buf(),
      args: args.iter().map(|a| a.to_os_string()).collect(),
      output,
    };
    let mut state = self.state.lock().unwrap();
    let mut response = state.responses.get(&call.step()).cloned().unwrap_or(StepOutput {
      code: Some(0),
      stdout: Vec::new(),
    });
    state.calls.push(call);

    if output == Output::Inherit {
      response.stdout.clear();
    }
    Ok(response)
  }
}

/// Pretends to clone by writing a minimal buildpack and a `CLONE` file
/// holding the clone's sequence number.
#[derive(Debug, Clone, Default)]
pub struct FakeCloner {
  count: Arc<AtomicUsize>,
  fail: bool,
}

impl FakeCloner {
  pub fn failing() -> Self {
    FakeCloner {
      fail: true,
      ..Default::default()
    }
  }

  pub fn clone_count(&self) -> usize {
    self.count.load(Ordering::SeqCst)
  }
}

impl Cloner for FakeCloner {
  fn clone_repo(&self, url: &str, dest: &Path) -> Result<(), FetchError> {
    if self.fail {
      return Err(FetchError::Clone {
        url: url.to_string(),
        source: "remote unreachable".into(),
      });
    }

    let n = self.count.fetch_add(1, Ordering::SeqCst) + 1;
    let write = || -> io::Result<()> {
      fs::create_dir_all(dest.join("bin"))?;
      fs::write(dest.join("bin").join("compile"), "#!/bin/sh\n")?;
      fs::write(dest.join("CLONE"), n.to_string())
    };
    write().map_err(|e| FetchError::Clone {
      url: url.to_string(),
      source: Box::new(e),
    })
  }
}

/// Create a buildpack directory `dir/name` with `bin/compile` and, optionally,
/// `bin/release`. Script bodies are only meaningful to real runners.
pub fn buildpack_dir(dir: &Path, name: &str, compile: &str, release: Option<&str>) -> PathBuf {
  let root = dir.join(name);
  crate::util::fs::write_executable(&root.join("bin").join("compile"), compile.as_bytes()).unwrap();
  if let Some(release) = release {
    crate::util::fs::write_executable(&root.join("bin").join("release"), release.as_bytes()).unwrap();
  }
  root
}
