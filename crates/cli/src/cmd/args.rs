//! Build settings accepted on the command line.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;
use nestpkg_lib::context::{BuildConfig, ConfigOverrides, Context};
use nestpkg_lib::manifest::Manifest;
use nestpkg_lib::toolchain::BuildType;

/// Flags layered over the root manifest's `[config]` table.
#[derive(Args, Debug, Clone, Default)]
pub struct ConfigArgs {
  /// CMake build type: Debug, Release, RelWithDebInfo or MinSizeRel
  #[arg(long)]
  pub build_type: Option<BuildType>,

  /// CMake generator (e.g. "Ninja")
  #[arg(short = 'G', long)]
  pub generator: Option<String>,

  /// Parallel build jobs
  #[arg(short, long)]
  pub jobs: Option<usize>,

  /// C++ standard passed to CMake
  #[arg(long)]
  pub cxx_standard: Option<u32>,

  /// Directory for unpacked sources and downloads
  #[arg(long, env = "NESTPKG_DEPS_DIR")]
  pub deps_dir: Option<PathBuf>,

  /// Install prefix shared by all packages
  #[arg(long, env = "NESTPKG_INSTALL_DIR")]
  pub install_dir: Option<PathBuf>,

  /// Remove existing build directories before configuring
  #[arg(long)]
  pub rebuild: bool,

  /// Log downloads and commands without running them
  #[arg(long)]
  pub dry_run: bool,
}

impl ConfigArgs {
  /// Overrides with paths made absolute against the working directory.
  pub fn overrides(&self) -> Result<ConfigOverrides> {
    Ok(ConfigOverrides {
      deps_dir: self.deps_dir.as_deref().map(absolute).transpose()?,
      install_dir: self.install_dir.as_deref().map(absolute).transpose()?,
      build_type: self.build_type,
      generator: self.generator.clone(),
      cxx_standard: self.cxx_standard,
      jobs: self.jobs,
      rebuild: self.rebuild.then_some(true),
      dry_run: self.dry_run.then_some(true),
      ..Default::default()
    })
  }

  /// Build the context for `manifest`: defaults, then its `[config]`, then
  /// these flags.
  pub fn context(&self, manifest: &Manifest) -> Result<Context> {
    let overrides = manifest.config().layered(self.overrides()?);
    let config = BuildConfig::from_overrides(manifest.dir(), overrides)
      .with_context(|| format!("invalid configuration in {}", manifest.path().display()))?;
    Ok(Context::new(config))
  }
}

fn absolute(path: &Path) -> Result<PathBuf> {
  std::path::absolute(path).with_context(|| format!("failed to resolve path {}", path.display()))
}
