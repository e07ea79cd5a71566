//! Identity and location types shared by packages and the resolver.

use std::fmt;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::placeholder::PlaceholderError;

/// The `(name, version)` pair naming a dependency request.
///
/// Two requests are the same dependency when their names match, and identical
/// requests when both fields match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PackageId {
  pub name: String,
  pub version: String,
}

impl PackageId {
  pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      version: version.into(),
    }
  }
}

impl fmt::Display for PackageId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}-{}", self.name, self.version)
  }
}

/// Where a package's fetched source tree lives.
///
/// Opaque to the resolver: it is produced by `fetch` and handed to `build`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocation(pub PathBuf);

impl SourceLocation {
  pub fn path(&self) -> &Path {
    &self.0
  }
}

impl fmt::Display for SourceLocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.display())
  }
}

/// Where a package's build output lives. Produced by `build`, consumed by `install`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BuildLocation(pub PathBuf);

impl BuildLocation {
  pub fn path(&self) -> &Path {
    &self.0
  }
}

impl fmt::Display for BuildLocation {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0.display())
  }
}

/// Errors raised by a single fetch, build or install stage.
#[derive(Debug, Error)]
pub enum StageError {
  /// I/O error while running the stage.
  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  /// HTTP download failed.
  #[error("fetch failed for {url}: {message}")]
  FetchFailed { url: String, message: String },

  /// SHA256 hash mismatch after download.
  #[error("hash mismatch for {url}: expected {expected}, got {actual}")]
  HashMismatch {
    url: String,
    expected: String,
    actual: String,
  },

  /// An archive could not be unpacked.
  #[error("failed to unpack {}: {message}", path.display())]
  Archive { path: PathBuf, message: String },

  /// An external command exited unsuccessfully.
  #[error("command failed with exit code {code:?}: {cmd}")]
  CmdFailed { cmd: String, code: Option<i32> },

  /// The expected source tree does not exist.
  #[error("source directory not found: {}", .0.display())]
  MissingSource(PathBuf),

  /// A placeholder in the package's recipe could not be resolved.
  #[error("placeholder error: {0}")]
  Placeholder(#[from] PlaceholderError),

  /// Free-form failure reported by a caller-supplied recipe.
  #[error("{0}")]
  Failed(String),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn package_id_display_joins_name_and_version() {
    let id = PackageId::new("abseil-cpp", "20240722.0");
    assert_eq!(id.to_string(), "abseil-cpp-20240722.0");
  }

  #[test]
  fn package_ids_compare_on_both_fields() {
    assert_eq!(PackageId::new("zlib", "1.3"), PackageId::new("zlib", "1.3"));
    assert_ne!(PackageId::new("zlib", "1.3"), PackageId::new("zlib", "1.2"));
  }

  #[test]
  fn stage_error_messages() {
    let err = StageError::CmdFailed {
      cmd: "cmake --build build".to_string(),
      code: Some(2),
    };
    assert_eq!(err.to_string(), "command failed with exit code Some(2): cmake --build build");

    let err = StageError::MissingSource(PathBuf::from("/deps/zlib-1.3"));
    assert_eq!(err.to_string(), "source directory not found: /deps/zlib-1.3");
  }
}
