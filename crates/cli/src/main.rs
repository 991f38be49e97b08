//! stackbrew: build multi-service stacks with buildpacks.

mod cmd;
mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use stackbrew_lib::config::Settings;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cmd::{cmd_build, cmd_buildscript, cmd_convert, cmd_info, cmd_services};

/// Build multi-service application stacks with pluggable buildpacks
#[derive(Parser)]
#[command(name = "stackbrew")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Colon-separated directories searched for named buildpacks
  #[arg(long, global = true, env = "BUILDPACK_PATH", value_name = "DIRS")]
  buildpack_path: Option<String>,

  /// Directory remote buildpacks are cloned into
  #[arg(long, global = true, env = "STACKBREW_CACHE_DIR", value_name = "DIR")]
  cache_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Build every service of a stack and write deploy.json
  Build {
    /// Application source directory containing the Stackfile
    source_dir: PathBuf,
    /// Output directory; must not exist yet
    build_dir: PathBuf,
  },

  /// Print the parsed stack descriptor as JSON
  Info {
    /// Application source directory containing the Stackfile
    source_dir: PathBuf,
  },

  /// Convert a custom service into a standalone buildpack
  Convert {
    /// Application source directory containing the Stackfile
    source_dir: PathBuf,
    /// Name of the custom service
    service: String,
    /// Directory to create the buildpack in; must not exist yet
    dest_dir: PathBuf,
  },

  /// Print a service's build script
  Buildscript {
    /// Application source directory containing the Stackfile
    source_dir: PathBuf,
    /// Name of the service
    service: String,
  },

  /// List the stack's services, sorted by name
  Services {
    /// Application source directory containing the Stackfile
    source_dir: PathBuf,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let settings = Settings::new(cli.buildpack_path.as_deref(), cli.cache_dir);
  debug!(
    search_path = ?settings.search_path,
    download_root = %settings.download_root.display(),
    "settings"
  );

  let result = match cli.command {
    Commands::Build { source_dir, build_dir } => cmd_build(&source_dir, &build_dir, settings),
    Commands::Info { source_dir } => cmd_info(&source_dir),
    Commands::Convert {
      source_dir,
      service,
      dest_dir,
    } => cmd_convert(&source_dir, &service, &dest_dir),
    Commands::Buildscript { source_dir, service } => cmd_buildscript(&source_dir, &service),
    Commands::Services { source_dir } => cmd_services(&source_dir),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      output::print_error(&output::format_error(&err));
      ExitCode::FAILURE
    }
  }
}

fn init_tracing(verbose: bool) {
  let filter = if verbose {
    EnvFilter::new("debug")
  } else {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
  };

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_target(false)
    .without_time()
    .init();
}
