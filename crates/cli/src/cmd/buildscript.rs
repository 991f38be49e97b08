use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use stackbrew_lib::convert::read_buildscript;

/// Print the raw build script of `service`.
pub fn cmd_buildscript(source_dir: &Path, service: &str) -> Result<()> {
  let script = read_buildscript(source_dir, service)?;
  let mut stdout = std::io::stdout().lock();
  stdout.write_all(&script).context("failed to write build script")?;
  stdout.flush().context("failed to write build script")?;
  Ok(())
}
