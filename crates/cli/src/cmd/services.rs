use std::path::Path;

use anyhow::Result;
use stackbrew_lib::stack::load_stack;

pub fn cmd_services(source_dir: &Path) -> Result<()> {
  let stack = load_stack(source_dir)?;
  for name in stack.names_sorted() {
    println!("{}", name);
  }
  Ok(())
}
