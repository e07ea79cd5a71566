//! CMake configure, build and install steps.
//!
//! Every package installs into the shared install prefix, and that prefix is
//! also on `CMAKE_PREFIX_PATH`, so a package's `find_package` calls see the
//! dependencies installed before it.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::info;

use super::cmd::run_program;
use crate::context::{Context, path_str};
use crate::package::StageError;

const CMAKE: &str = "cmake";

/// Out-of-source build directory for `source`: `<source>/cmake_build/<build type>`.
pub fn build_dir(ctx: &Context, source: &Path) -> PathBuf {
  source.join("cmake_build").join(ctx.config.build_type.as_str())
}

/// Arguments for the configure step, `extra` last so packages can override.
pub fn configure_args(ctx: &Context, source: &Path, build_dir: &Path, extra: &[String]) -> Vec<String> {
  let c = &ctx.config;
  let install_dir = path_str(&c.install_dir);

  let mut args = vec![
    "-S".to_string(),
    path_str(source),
    "-B".to_string(),
    path_str(build_dir),
  ];
  if let Some(generator) = &c.generator {
    args.push("-G".to_string());
    args.push(generator.clone());
  }

  args.extend([
    format!("-DCMAKE_BUILD_TYPE={}", c.build_type),
    format!("-DCMAKE_CXX_STANDARD={}", c.cxx_standard),
    "-DCMAKE_POLICY_DEFAULT_CMP0091=NEW".to_string(),
    format!("-DCMAKE_MSVC_RUNTIME_LIBRARY={}", c.build_type.msvc_runtime()),
    format!("-DCMAKE_INSTALL_PREFIX={install_dir}"),
    "-DCMAKE_INSTALL_LIBDIR=lib".to_string(),
    format!("-DCMAKE_PREFIX_PATH={install_dir}"),
  ]);

  // MSVC ignores CFLAGS and friends; pass them as cache entries instead.
  if ctx.os.is_windows() {
    let flags = ctx.flags();
    args.extend([
      format!("-DCMAKE_C_FLAGS={}", flags.cflags),
      format!("-DCMAKE_CXX_FLAGS={}", flags.cxxflags),
      format!("-DCMAKE_EXE_LINKER_FLAGS={}", flags.ldflags),
    ]);
  }

  args.extend(extra.iter().cloned());
  args
}

/// Environment for the configure child. Empty on Windows.
pub fn configure_env(ctx: &Context) -> BTreeMap<String, String> {
  if ctx.os.is_windows() {
    return BTreeMap::new();
  }
  let flags = ctx.flags();
  BTreeMap::from([
    ("CFLAGS".to_string(), flags.cflags),
    ("CXXFLAGS".to_string(), flags.cxxflags),
    ("LDFLAGS".to_string(), flags.ldflags),
  ])
}

/// Configure `source` into its build directory and return that directory.
pub fn configure(ctx: &Context, source: &Path, extra: &[String]) -> Result<PathBuf, StageError> {
  if !ctx.is_dry_run() && !source.is_dir() {
    return Err(StageError::MissingSource(source.to_path_buf()));
  }

  let build_dir = build_dir(ctx, source);
  if ctx.config.rebuild && build_dir.exists() {
    if ctx.is_dry_run() {
      info!(dir = %build_dir.display(), "[dry-run] remove build directory");
    } else {
      info!(dir = %build_dir.display(), "removing build directory");
      fs::remove_dir_all(&build_dir)?;
    }
  }

  let args = configure_args(ctx, source, &build_dir, extra);
  run_program(CMAKE, &args, None, &configure_env(ctx), ctx.is_dry_run())?;
  Ok(build_dir)
}

pub fn build_args(ctx: &Context, build_dir: &Path) -> Vec<String> {
  vec![
    "--build".to_string(),
    path_str(build_dir),
    "--config".to_string(),
    ctx.config.build_type.to_string(),
    "--parallel".to_string(),
    ctx.config.jobs.to_string(),
  ]
}

/// Compile a configured build directory.
pub fn build(ctx: &Context, build_dir: &Path) -> Result<(), StageError> {
  run_program(CMAKE, &build_args(ctx, build_dir), None, &BTreeMap::new(), ctx.is_dry_run())
}

pub fn install_args(ctx: &Context, build_dir: &Path) -> Vec<String> {
  vec![
    "--install".to_string(),
    path_str(build_dir),
    "--config".to_string(),
    ctx.config.build_type.to_string(),
    "--prefix".to_string(),
    path_str(&ctx.config.install_dir),
  ]
}

/// Install a built directory into the shared prefix.
pub fn install(ctx: &Context, build_dir: &Path) -> Result<(), StageError> {
  run_program(CMAKE, &install_args(ctx, build_dir), None, &BTreeMap::new(), ctx.is_dry_run())
}
