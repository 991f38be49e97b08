//! Implementation of the `stackbrew convert` command.

use std::path::Path;

use anyhow::Result;
use stackbrew_lib::convert::materialize;

use crate::output::{print_stat, print_success};

/// Extract a custom service from an application and turn it into a buildpack.
pub fn cmd_convert(source_dir: &Path, service: &str, dest_dir: &Path) -> Result<()> {
  materialize(source_dir, service, dest_dir)?;

  print_success(&format!("Converted service '{}' to a buildpack", service));
  print_stat("Compile", &dest_dir.join("bin").join("compile").display().to_string());
  print_stat("Release", &dest_dir.join("bin").join("release").display().to_string());
  Ok(())
}
