use std::path::Path;

use anyhow::Result;
use stackbrew_lib::stack::load_stack;

use crate::output::print_json;

pub fn cmd_info(source_dir: &Path) -> Result<()> {
  let stack = load_stack(source_dir)?;
  print_json(&stack)
}
