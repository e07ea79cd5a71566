//! The build environment threaded through every package stage.
//!
//! A [`Context`] is built once by the driver from layered settings (defaults,
//! the root manifest's `[config]` table, command-line flags) and then only
//! read. No stage mutates it and no process-wide state is consulted.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::placeholder::Vars;
use crate::toolchain::{BuildType, CompilerFlags, Os, default_flags};

const CXX_STANDARDS: &[u32] = &[98, 11, 14, 17, 20, 23, 26];

/// Errors in the build configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("unknown build type '{0}' (expected Debug, Release, RelWithDebInfo or MinSizeRel)")]
  UnknownBuildType(String),

  #[error("jobs must be at least 1")]
  ZeroJobs,

  #[error("unsupported C++ standard {0}")]
  UnsupportedCxxStandard(u32),
}

/// Optional settings, as written in a manifest's `[config]` table or given on
/// the command line. Relative paths are taken from the project directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
  pub deps_dir: Option<PathBuf>,
  pub download_dir: Option<PathBuf>,
  pub install_dir: Option<PathBuf>,
  pub build_type: Option<BuildType>,
  pub generator: Option<String>,
  pub cxx_standard: Option<u32>,
  pub jobs: Option<usize>,
  pub rebuild: Option<bool>,
  pub dry_run: Option<bool>,
  pub shell: Option<String>,
  pub cflags: Option<String>,
  pub cxxflags: Option<String>,
  pub ldflags: Option<String>,
}

impl ConfigOverrides {
  /// Layer `higher` on top of `self`; any value set in `higher` wins.
  pub fn layered(self, higher: ConfigOverrides) -> ConfigOverrides {
    ConfigOverrides {
      deps_dir: higher.deps_dir.or(self.deps_dir),
      download_dir: higher.download_dir.or(self.download_dir),
      install_dir: higher.install_dir.or(self.install_dir),
      build_type: higher.build_type.or(self.build_type),
      generator: higher.generator.or(self.generator),
      cxx_standard: higher.cxx_standard.or(self.cxx_standard),
      jobs: higher.jobs.or(self.jobs),
      rebuild: higher.rebuild.or(self.rebuild),
      dry_run: higher.dry_run.or(self.dry_run),
      shell: higher.shell.or(self.shell),
      cflags: higher.cflags.or(self.cflags),
      cxxflags: higher.cxxflags.or(self.cxxflags),
      ldflags: higher.ldflags.or(self.ldflags),
    }
  }
}

/// Fully resolved build configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildConfig {
  /// Directory of the root manifest.
  pub project_dir: PathBuf,
  /// Where sources are unpacked.
  pub deps_dir: PathBuf,
  /// Where archives are downloaded.
  pub download_dir: PathBuf,
  /// Install prefix shared by every package.
  pub install_dir: PathBuf,
  pub build_type: BuildType,
  /// CMake generator; CMake's default when `None`.
  pub generator: Option<String>,
  pub cxx_standard: u32,
  /// Parallel jobs handed to the build tool.
  pub jobs: usize,
  /// Remove existing build directories before configuring.
  pub rebuild: bool,
  /// Log downloads and commands without running them.
  pub dry_run: bool,
  /// Shell for script commands.
  pub shell: Option<String>,
  pub cflags: Option<String>,
  pub cxxflags: Option<String>,
  pub ldflags: Option<String>,
}

impl BuildConfig {
  /// Defaults for a project rooted at `project_dir`.
  pub fn new(project_dir: impl Into<PathBuf>) -> Self {
    let project_dir = project_dir.into();
    let build_type = BuildType::default();
    let deps_dir = project_dir.join("deps");
    Self {
      download_dir: deps_dir.join("download"),
      install_dir: deps_dir.join("out").join(build_type.as_str()),
      deps_dir,
      project_dir,
      build_type,
      generator: None,
      cxx_standard: 17,
      jobs: default_jobs(),
      rebuild: false,
      dry_run: false,
      shell: None,
      cflags: None,
      cxxflags: None,
      ldflags: None,
    }
  }

  /// Apply `overrides` on top of the defaults for `project_dir`.
  ///
  /// Directories that are not overridden are derived from the ones that are:
  /// moving `deps_dir` moves the default download and install directories too.
  pub fn from_overrides(project_dir: impl Into<PathBuf>, overrides: ConfigOverrides) -> Result<Self, ConfigError> {
    let mut config = Self::new(project_dir);

    if let Some(jobs) = overrides.jobs {
      if jobs == 0 {
        return Err(ConfigError::ZeroJobs);
      }
      config.jobs = jobs;
    }
    if let Some(std) = overrides.cxx_standard {
      if !CXX_STANDARDS.contains(&std) {
        return Err(ConfigError::UnsupportedCxxStandard(std));
      }
      config.cxx_standard = std;
    }

    config.build_type = overrides.build_type.unwrap_or(config.build_type);
    if let Some(deps_dir) = overrides.deps_dir {
      config.deps_dir = config.anchor(&deps_dir);
    }
    config.download_dir = match overrides.download_dir {
      Some(dir) => config.anchor(&dir),
      None => config.deps_dir.join("download"),
    };
    config.install_dir = match overrides.install_dir {
      Some(dir) => config.anchor(&dir),
      None => config.deps_dir.join("out").join(config.build_type.as_str()),
    };

    config.generator = overrides.generator;
    config.rebuild = overrides.rebuild.unwrap_or(false);
    config.dry_run = overrides.dry_run.unwrap_or(false);
    config.shell = overrides.shell;
    config.cflags = overrides.cflags;
    config.cxxflags = overrides.cxxflags;
    config.ldflags = overrides.ldflags;

    Ok(config)
  }

  fn anchor(&self, path: &Path) -> PathBuf {
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.project_dir.join(path)
    }
  }
}

fn default_jobs() -> usize {
  std::thread::available_parallelism().map(|p| p.get()).unwrap_or(4)
}

/// Read-only environment passed to every package stage and manifest load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
  pub config: BuildConfig,
  pub os: Os,
}

impl Context {
  pub fn new(config: BuildConfig) -> Self {
    Self::with_os(config, Os::current())
  }

  pub fn with_os(config: BuildConfig, os: Os) -> Self {
    Self { config, os }
  }

  pub fn is_dry_run(&self) -> bool {
    self.config.dry_run
  }

  /// Compiler flags for configure steps: configured values, else the defaults
  /// for this OS and build type.
  pub fn flags(&self) -> CompilerFlags {
    let defaults = default_flags(self.os, self.config.build_type);
    CompilerFlags {
      cflags: self.config.cflags.clone().unwrap_or(defaults.cflags),
      cxxflags: self.config.cxxflags.clone().unwrap_or(defaults.cxxflags),
      ldflags: self.config.ldflags.clone().unwrap_or(defaults.ldflags),
    }
  }

  /// Placeholder variables common to every manifest string.
  pub fn vars(&self) -> Vars {
    let c = &self.config;
    Vars::new()
      .with("project_dir", path_str(&c.project_dir))
      .with("deps_dir", path_str(&c.deps_dir))
      .with("download_dir", path_str(&c.download_dir))
      .with("install_dir", path_str(&c.install_dir))
      .with("build_type", c.build_type.as_str())
      .with("jobs", c.jobs.to_string())
  }

  /// Create the deps, download and install directories. Skipped in dry runs.
  pub fn prepare_dirs(&self) -> io::Result<()> {
    if self.is_dry_run() {
      return Ok(());
    }
    for dir in [&self.config.deps_dir, &self.config.download_dir, &self.config.install_dir] {
      debug!(dir = %dir.display(), "creating directory");
      std::fs::create_dir_all(dir)?;
    }
    Ok(())
  }
}

pub(crate) fn path_str(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}
