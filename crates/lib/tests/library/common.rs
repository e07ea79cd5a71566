//! Shared helpers for library integration tests.

use std::path::{Path, PathBuf};

use nestpkg_lib::context::{BuildConfig, Context};
use nestpkg_lib::manifest::Manifest;
use nestpkg_lib::resolve::{LoadError, PackageCollection};
use tempfile::TempDir;

/// A project directory with manifests written into it.
pub struct Project {
  pub temp: TempDir,
}

impl Project {
  pub fn new() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  /// Write `content` to `relative`, creating parent directories.
  pub fn write(&self, relative: &str, content: &str) -> PathBuf {
    let path = self.temp.path().join(relative);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
    path
  }

  pub fn mkdir(&self, relative: &str) {
    std::fs::create_dir_all(self.temp.path().join(relative)).unwrap();
  }

  /// Context rooted at the project with its directories created.
  pub fn context(&self) -> Context {
    let ctx = Context::new(BuildConfig::new(self.root()));
    ctx.prepare_dirs().unwrap();
    ctx
  }

  pub fn load(&self, ctx: &Context) -> Result<PackageCollection<Context>, LoadError> {
    Manifest::read(&self.root())?.into_collection(ctx)
  }

  /// Lines of a file under the install directory; empty if it does not exist.
  pub fn installed_lines(&self, ctx: &Context, name: &str) -> Vec<String> {
    read_lines(&ctx.config.install_dir.join(name))
  }
}

pub fn read_lines(path: &Path) -> Vec<String> {
  std::fs::read_to_string(path)
    .map(|s| s.lines().map(str::to_string).collect())
    .unwrap_or_default()
}

/// A script-built package that appends its name to `order.txt` in the
/// install directory when built and installed.
pub fn recording_package(name: &str, version: &str) -> String {
  format!(
    r#"
[[package]]
name = "{name}"
version = "{version}"
path = "src/{name}"
builder = "script"
build = ["echo build $${{name}}-$${{version}} >> $${{install_dir}}/order.txt"]
install = ["echo install $${{name}} >> $${{install_dir}}/order.txt"]
"#
  )
}
