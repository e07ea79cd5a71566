//! Recipes for packages declared in manifests.

use std::path::{Path, PathBuf};

use tracing::info;

use crate::actions::{archive_file_name, cmake, download, run_shell, unpack};
use crate::context::{Context, path_str};
use crate::package::{BuildLocation, PackageId, Recipe, SourceLocation, StageError};
use crate::placeholder::{Vars, substitute_all};

/// Where a package's sources come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
  /// An archive downloaded into the download directory and unpacked into
  /// `<deps_dir>/<source_dir>`.
  Archive {
    url: String,
    sha256: Option<String>,
    source_dir: String,
  },
  /// A source tree already on disk.
  Local(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Builder {
  CMake { options: Vec<String> },
  /// Shell commands; `build` runs in the source tree, `install` in the build
  /// location (which is the source tree).
  Script { build: Vec<String>, install: Vec<String> },
}

/// Fetch, build and install as described by one `[[package]]` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecipe {
  pub id: PackageId,
  pub manifest_dir: PathBuf,
  pub source: Source,
  pub builder: Builder,
}

impl ManifestRecipe {
  fn vars(&self, ctx: &Context) -> Vars {
    ctx
      .vars()
      .with("name", self.id.name.as_str())
      .with("version", self.id.version.as_str())
      .with("manifest_dir", path_str(&self.manifest_dir))
  }

  fn run_commands(&self, ctx: &Context, commands: &[String], cwd: &Path, vars: &Vars) -> Result<(), StageError> {
    let env = cmake::configure_env(ctx);
    for cmd in substitute_all(commands, vars)? {
      run_shell(&cmd, cwd, &env, ctx.config.shell.as_deref(), ctx.is_dry_run())?;
    }
    Ok(())
  }
}

impl Recipe<Context> for ManifestRecipe {
  fn fetch(&self, ctx: &Context) -> Result<SourceLocation, StageError> {
    match &self.source {
      Source::Local(path) => {
        if ctx.is_dry_run() {
          return Ok(SourceLocation(path.clone()));
        }
        if !path.is_dir() {
          return Err(StageError::MissingSource(path.clone()));
        }
        Ok(SourceLocation(dunce::canonicalize(path)?))
      }
      Source::Archive {
        url,
        sha256,
        source_dir,
      } => {
        let dry_run = ctx.is_dry_run();
        let file_name = archive_file_name(&self.id, url);
        let archive = download(url, &file_name, sha256.as_deref(), &ctx.config.download_dir, dry_run)?;
        let src = ctx.config.deps_dir.join(source_dir);

        if src.is_dir() {
          info!(package = %self.id, path = %src.display(), "source already unpacked");
        } else {
          unpack(&archive, &ctx.config.deps_dir, dry_run)?;
          if !dry_run && !src.is_dir() {
            return Err(StageError::MissingSource(src));
          }
        }
        Ok(SourceLocation(src))
      }
    }
  }

  fn build(&self, ctx: &Context, source: &SourceLocation) -> Result<BuildLocation, StageError> {
    match &self.builder {
      Builder::CMake { options } => {
        let build_dir = cmake::configure(ctx, source.path(), options)?;
        cmake::build(ctx, &build_dir)?;
        Ok(BuildLocation(build_dir))
      }
      Builder::Script { build, .. } => {
        let vars = self.vars(ctx).with("src", path_str(source.path()));
        self.run_commands(ctx, build, source.path(), &vars)?;
        Ok(BuildLocation(source.path().to_path_buf()))
      }
    }
  }

  fn install(&self, ctx: &Context, build: &BuildLocation) -> Result<(), StageError> {
    match &self.builder {
      Builder::CMake { .. } => cmake::install(ctx, build.path()),
      Builder::Script { install, .. } => {
        let dir = path_str(build.path());
        let vars = self.vars(ctx).with("src", dir.as_str()).with("build", dir.as_str());
        self.run_commands(ctx, install, build.path(), &vars)
      }
    }
  }
}
