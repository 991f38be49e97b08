//! Implementation of the `stackbrew build` command.
//!
//! Builds every service of a stack into its own directory under the build
//! directory and writes the merged release metadata to `deploy.json`.

use std::path::Path;
use std::time::Instant;

use anyhow::Result;

use stackbrew_lib::build::{ServiceBuilder, build_stack};
use stackbrew_lib::config::Settings;
use stackbrew_lib::consts::DEPLOY_FILENAME;

use crate::output::{format_duration, print_info, print_stat, print_success};

pub fn cmd_build(source_dir: &Path, build_dir: &Path, settings: Settings) -> Result<()> {
  let started = Instant::now();
  print_info(&format!(
    "Building {} into {}",
    source_dir.display(),
    build_dir.display()
  ));

  let builder = ServiceBuilder::new(settings);
  let deploy = build_stack(&builder, source_dir, build_dir)?;

  print_success(&format!("Built {} service(s)", deploy.len()));
  print_stat("Services", &deploy.service_names().collect::<Vec<_>>().join(", "));
  print_stat("Deploy descriptor", &build_dir.join(DEPLOY_FILENAME).display().to_string());
  print_stat("Elapsed", &format_duration(started.elapsed()));

  Ok(())
}
