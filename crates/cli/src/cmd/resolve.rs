//! Implementation of the `nestpkg resolve` command.
//!
//! Loads the root manifest, layers its `[config]` under the command-line
//! flags, locks the deps directory and drives the whole tree through fetch,
//! build and install.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context as _, Result};
use nestpkg_lib::consts::APP_NAME;
use nestpkg_lib::deps_lock::DepsLock;
use nestpkg_lib::manifest::{Manifest, TomlLoader};
use nestpkg_lib::resolve::ResolveReport;
use serde::Serialize;
use tracing::info;

use super::ConfigArgs;
use crate::output::{OutputFormat, STEP, format_duration, print_info, print_json, print_stat, print_success};

#[derive(Debug, Serialize)]
struct ResolveSummary {
  dry_run: bool,
  expansion_passes: usize,
  fetched: usize,
  install_dir: PathBuf,
  duration_ms: u128,
  packages: Vec<InstalledSummary>,
}

#[derive(Debug, Serialize)]
struct InstalledSummary {
  name: String,
  version: String,
  depth: usize,
  source: PathBuf,
}

impl ResolveSummary {
  fn new(report: &ResolveReport, dry_run: bool, install_dir: &Path, duration_ms: u128) -> Self {
    Self {
      dry_run,
      expansion_passes: report.expansion_passes,
      fetched: report.fetched,
      install_dir: install_dir.to_path_buf(),
      duration_ms,
      packages: report
        .installed
        .iter()
        .map(|p| InstalledSummary {
          name: p.id.name.clone(),
          version: p.id.version.clone(),
          depth: p.depth,
          source: p.source.path().to_path_buf(),
        })
        .collect(),
    }
  }
}

/// Execute the resolve command.
pub fn cmd_resolve(manifest_path: &Path, args: &ConfigArgs, output: OutputFormat) -> Result<()> {
  let start = Instant::now();

  let manifest =
    Manifest::read(manifest_path).with_context(|| format!("failed to load {}", manifest_path.display()))?;
  let ctx = args.context(&manifest)?;
  info!(
    manifest = %manifest.path().display(),
    build_type = %ctx.config.build_type,
    install_dir = %ctx.config.install_dir.display(),
    dry_run = ctx.is_dry_run(),
    "resolving"
  );

  let _lock = if ctx.is_dry_run() {
    None
  } else {
    Some(DepsLock::acquire(&ctx.config.deps_dir, &format!("{APP_NAME} resolve"))?)
  };
  ctx
    .prepare_dirs()
    .context("failed to create dependency directories")?;

  let mut collection = manifest.into_collection(&ctx)?;
  let report = collection.resolve(&ctx, &TomlLoader)?;

  let summary = ResolveSummary::new(
    &report,
    ctx.is_dry_run(),
    &ctx.config.install_dir,
    start.elapsed().as_millis(),
  );

  if output.is_json() {
    return print_json(&summary);
  }

  println!();
  let verb = if summary.dry_run { "Would install" } else { "Installed" };
  print_success(&format!("{} {} package(s)", verb, summary.packages.len()));
  for package in &summary.packages {
    println!(
      "  {} {}-{} (depth {})",
      STEP,
      package.name,
      package.version,
      package.depth
    );
  }
  println!();
  print_stat("Expansion passes", &summary.expansion_passes.to_string());
  print_stat("Fetched", &summary.fetched.to_string());
  print_stat("Install dir", &summary.install_dir.display().to_string());
  print_stat("Duration", &format_duration(start.elapsed()));
  if summary.dry_run {
    print_info("Dry run: nothing was downloaded, built or installed.");
  }

  Ok(())
}
