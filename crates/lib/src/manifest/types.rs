//! Serde schema of a `nestpkg.toml` manifest.
//!
//! ```toml
//! submanifests = ["vendor/extra"]
//!
//! [config]
//! build_type = "Release"
//!
//! [[package]]
//! name = "zlib"
//! version = "1.3.1"
//! url = "https://zlib.net/zlib-$${version}.tar.gz"
//! sha256 = "9a93b2b7dfdac77ceba5a558a580e74667dd6fede4585b91eefb60f03b72df23"
//! cmake_options = ["-DZLIB_BUILD_EXAMPLES=OFF"]
//! ```

use serde::{Deserialize, Serialize};

use crate::context::ConfigOverrides;

/// A manifest file as written on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestFile {
  /// References to further manifests, resolved relative to this file.
  #[serde(default)]
  pub submanifests: Vec<String>,

  /// Build settings. Only honoured in the root manifest.
  #[serde(default)]
  pub config: Option<ConfigOverrides>,

  #[serde(default, rename = "package")]
  pub packages: Vec<PackageEntry>,
}

/// How a package is built and installed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuilderKind {
  #[default]
  Cmake,
  Script,
}

/// One `[[package]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackageEntry {
  pub name: String,
  pub version: String,

  /// Archive to download. Exclusive with `path`.
  pub url: Option<String>,
  /// Expected SHA256 of the archive at `url`.
  pub sha256: Option<String>,
  /// Local source tree. Exclusive with `url`.
  pub path: Option<String>,
  /// Directory the archive unpacks to, under the deps directory.
  /// Defaults to `<name>-<version>`.
  pub source_dir: Option<String>,

  #[serde(default)]
  pub builder: BuilderKind,
  #[serde(default)]
  pub cmake_options: Vec<String>,
  #[serde(default)]
  pub build: Vec<String>,
  #[serde(default)]
  pub install: Vec<String>,
}
