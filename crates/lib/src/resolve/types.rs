//! Error and result types for collection resolution.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::package::{BuildLocation, PackageId, SourceLocation, StageError};
use crate::placeholder::PlaceholderError;

/// One side of a version conflict: the version asked for and who asked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
  pub version: String,
  pub origin: String,
}

/// Two or more requests for the same package name disagree on the version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConflict {
  pub name: String,
  /// Every request for `name`, in insertion order.
  pub requests: Vec<Request>,
}

impl VersionConflict {
  /// The distinct versions requested, in first-seen order.
  pub fn versions(&self) -> Vec<&str> {
    let mut versions: Vec<&str> = Vec::new();
    for request in &self.requests {
      if !versions.contains(&request.version.as_str()) {
        versions.push(&request.version);
      }
    }
    versions
  }
}

impl fmt::Display for VersionConflict {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "version conflict for '{}': {}", self.name, self.versions().join(", "))?;
    for request in &self.requests {
      write!(f, "\n  {} requested by {}", request.version, request.origin)?;
    }
    Ok(())
  }
}

/// Errors produced while loading a sub-manifest reference.
#[derive(Debug, Error)]
pub enum LoadError {
  /// The referenced manifest does not exist.
  #[error("manifest not found: {}", .0.display())]
  NotFound(PathBuf),

  /// The manifest could not be read.
  #[error("failed to read {}: {source}", path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The manifest is not valid TOML or does not match the schema.
  #[error("failed to parse {}: {message}", path.display())]
  Parse { path: PathBuf, message: String },

  /// The manifest parsed but describes something impossible.
  #[error("invalid manifest {}: {message}", path.display())]
  Invalid { path: PathBuf, message: String },

  /// A placeholder in the manifest could not be resolved.
  #[error("placeholder error: {0}")]
  Placeholder(#[from] PlaceholderError),

  /// The loader does not know how to load this reference.
  #[error("no loader available for sub-manifest '{0}'")]
  Unsupported(String),
}

/// Fatal conditions that abort a resolution run.
#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("{0}")]
  VersionConflict(VersionConflict),

  #[error("failed to fetch {package}: {source}")]
  Fetch {
    package: PackageId,
    #[source]
    source: StageError,
  },

  #[error("failed to build {package}: {source}")]
  Build {
    package: PackageId,
    #[source]
    source: StageError,
  },

  #[error("failed to install {package}: {source}")]
  Install {
    package: PackageId,
    #[source]
    source: StageError,
  },

  #[error("failed to load sub-manifest '{reference}': {source}")]
  Load {
    reference: String,
    #[source]
    source: LoadError,
  },
}

/// A package that made it all the way through build and install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
  pub id: PackageId,
  pub depth: usize,
  pub source: SourceLocation,
  pub build: BuildLocation,
}

/// Summary of a successful resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveReport {
  /// Number of times the pending sub-manifest queue was drained.
  pub expansion_passes: usize,
  /// Number of `fetch` calls made.
  pub fetched: usize,
  /// Installed packages, in build order.
  pub installed: Vec<InstalledPackage>,
}
