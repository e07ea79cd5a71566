mod cmd;
mod output;

use std::io::IsTerminal;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use nestpkg_lib::consts::MANIFEST_FILENAME;
use tracing_subscriber::EnvFilter;

use crate::cmd::ConfigArgs;
use crate::output::{OutputFormat, format_error, print_error};

/// nestpkg - build and install native library dependencies from nested manifests
#[derive(Parser, Debug)]
#[command(name = "nestpkg")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (overridden by NESTPKG_LOG)
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
  /// Fetch, build and install every package in a manifest tree
  Resolve {
    /// Manifest file, or a directory containing one
    #[arg(default_value = MANIFEST_FILENAME)]
    manifest: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },

  /// Show the packages and sub-manifests a manifest declares, without fetching
  List {
    /// Manifest file, or a directory containing one
    #[arg(default_value = MANIFEST_FILENAME)]
    manifest: PathBuf,

    #[command(flatten)]
    config: ConfigArgs,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value = "text")]
    output: OutputFormat,
  },
}

fn init_tracing(verbose: bool) {
  let default = if verbose { "debug" } else { "info" };
  let filter = EnvFilter::try_from_env("NESTPKG_LOG").unwrap_or_else(|_| EnvFilter::new(default));

  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .with_ansi(std::io::stderr().is_terminal())
    .with_target(false)
    .without_time()
    .init();
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let result = match cli.command {
    Commands::Resolve {
      manifest,
      config,
      output,
    } => cmd::cmd_resolve(&manifest, &config, output),
    Commands::List {
      manifest,
      config,
      output,
    } => cmd::cmd_list(&manifest, &config, output),
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(err) => {
      print_error(&format_error(&err));
      ExitCode::FAILURE
    }
  }
}
