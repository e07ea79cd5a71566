//! Shared test helpers for CLI integration tests.

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use assert_cmd::cargo::cargo_bin_cmd;
use tempfile::TempDir;

/// Get path to a fixture file.
pub fn fixture_path(name: &str) -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR"))
    .join("tests")
    .join("fixtures")
    .join(name)
}

/// Read fixture content.
pub fn fixture_content(name: &str) -> String {
  std::fs::read_to_string(fixture_path(name)).unwrap_or_else(|e| panic!("Failed to load fixture {}: {}", name, e))
}

/// Isolated project directory.
///
/// Each test gets its own temporary directory; the default deps and install
/// directories land inside it.
pub struct TestEnv {
  pub temp: TempDir,
}

impl TestEnv {
  /// Create an empty project.
  pub fn empty() -> Self {
    Self {
      temp: TempDir::new().unwrap(),
    }
  }

  /// Create a project whose root manifest is the given fixture.
  pub fn from_fixture(name: &str) -> Self {
    let env = Self::empty();
    env.write_file("nestpkg.toml", &fixture_content(name));
    env
  }

  /// Write a file relative to the project, creating parent directories.
  pub fn write_file(&self, relative_path: &str, content: &str) {
    let path = self.temp.path().join(relative_path);
    if let Some(parent) = path.parent() {
      std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(&path, content).unwrap();
  }

  /// Copy a fixture to a path relative to the project.
  pub fn copy_fixture(&self, name: &str, relative_path: &str) {
    self.write_file(relative_path, &fixture_content(name));
  }

  pub fn mkdir(&self, relative_path: &str) {
    std::fs::create_dir_all(self.temp.path().join(relative_path)).unwrap();
  }

  /// Canonical project root.
  pub fn root(&self) -> PathBuf {
    dunce::canonicalize(self.temp.path()).unwrap()
  }

  pub fn manifest_path(&self) -> PathBuf {
    self.root().join("nestpkg.toml")
  }

  /// Default install directory for a Release build.
  pub fn install_dir(&self) -> PathBuf {
    self.root().join("deps").join("out").join("Release")
  }

  /// Get a pre-configured Command for the nestpkg binary.
  ///
  /// Clears the variables that would redirect the deps or install
  /// directories outside the test project.
  pub fn nestpkg_cmd(&self) -> Command {
    let mut cmd = cargo_bin_cmd!("nestpkg");
    cmd
      .env_remove("NESTPKG_LOG")
      .env_remove("NESTPKG_DEPS_DIR")
      .env_remove("NESTPKG_INSTALL_DIR");
    cmd
  }
}

/// Lines of a text file; empty when it does not exist.
pub fn read_lines(path: &Path) -> Vec<String> {
  std::fs::read_to_string(path)
    .map(|s| s.lines().map(str::to_string).collect())
    .unwrap_or_default()
}
