//! Process execution for buildpack steps.
//!
//! Buildpack executables are run through the [`StepRunner`] trait so the
//! builder's exit-code and output handling can be exercised without spawning
//! real processes. [`SystemRunner`] is the real implementation.

use std::ffi::OsStr;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

use tracing::debug;

/// What to do with a step's standard output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
  /// Pass through to our own stdout so progress stays visible.
  Inherit,
  /// Collect into [`StepOutput::stdout`].
  Capture,
}

/// Outcome of a finished step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOutput {
  /// Exit code, or `None` when the process was killed by a signal.
  pub code: Option<i32>,
  /// Captured stdout; empty when output was inherited.
  pub stdout: Vec<u8>,
}

impl StepOutput {
  pub fn success(&self) -> bool {
    self.code == Some(0)
  }
}

/// Runs an executable to completion.
pub trait StepRunner {
  /// Run `program` with `args`, blocking until it exits.
  ///
  /// Stdin is closed and stderr is always inherited. Only a failure to spawn
  /// or wait is an `Err`; a non-zero exit is reported through [`StepOutput`].
  fn run(&self, program: &Path, args: &[&OsStr], output: Output) -> io::Result<StepOutput>;
}

/// Spawns real processes with [`std::process::Command`].
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl StepRunner for SystemRunner {
  fn run(&self, program: &Path, args: &[&OsStr], output: Output) -> io::Result<StepOutput> {
    debug!(program = %program.display(), ?args, ?output, "spawning process");

    let mut command = Command::new(program);
    command.args(args).stdin(Stdio::null()).stderr(Stdio::inherit());

    match output {
      Output::Inherit => {
        let status = command.stdout(Stdio::inherit()).status()?;
        Ok(StepOutput {
          code: status.code(),
          stdout: Vec::new(),
        })
      }
      Output::Capture => {
        let result = command.stdout(Stdio::piped()).output()?;
        Ok(StepOutput {
          code: result.status.code(),
          stdout: result.stdout,
        })
      }
    }
  }
}
