//! TOML manifests: parsing, validation and the sub-manifest loader.
//!
//! A manifest is read in two steps. [`Manifest::read`] parses the file, which
//! is enough to take the `[config]` table from a root manifest before any
//! [`Context`] exists. [`Manifest::into_collection`] then turns each
//! `[[package]]` into a [`Package`] with a [`ManifestRecipe`], and each
//! `submanifests` entry into a pending reference anchored at this file's
//! directory.

mod recipe;
mod types;

pub use recipe::*;
pub use types::*;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::consts::MANIFEST_FILENAME;
use crate::context::{ConfigOverrides, Context, path_str};
use crate::package::{Package, PackageId};
use crate::placeholder::{self, Vars, substitute};
use crate::resolve::{LoadError, ManifestLoader, PackageCollection};

/// A parsed manifest and where it was read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
  path: PathBuf,
  dir: PathBuf,
  file: ManifestFile,
}

impl Manifest {
  /// Read the manifest at `path`. A directory means its `nestpkg.toml`.
  pub fn read(path: &Path) -> Result<Self, LoadError> {
    let path = if path.is_dir() {
      path.join(MANIFEST_FILENAME)
    } else {
      path.to_path_buf()
    };
    if !path.is_file() {
      return Err(LoadError::NotFound(path));
    }
    let path = dunce::canonicalize(&path).map_err(|source| LoadError::Io {
      path: path.clone(),
      source,
    })?;

    debug!(path = %path.display(), "reading manifest");
    let text = std::fs::read_to_string(&path).map_err(|source| LoadError::Io {
      path: path.clone(),
      source,
    })?;
    Self::parse(path, &text)
  }

  /// Parse manifest text as if it were read from `path`.
  pub fn parse(path: PathBuf, text: &str) -> Result<Self, LoadError> {
    let file: ManifestFile = toml::from_str(text).map_err(|e| LoadError::Parse {
      path: path.clone(),
      message: e.to_string(),
    })?;
    let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    Ok(Self { path, dir, file })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// Directory containing the manifest; relative references start here.
  pub fn dir(&self) -> &Path {
    &self.dir
  }

  pub fn file(&self) -> &ManifestFile {
    &self.file
  }

  /// The `[config]` table, or no overrides.
  pub fn config(&self) -> ConfigOverrides {
    self.file.config.clone().unwrap_or_default()
  }

  /// Build the collection this manifest declares: its packages at depth 0
  /// and its sub-manifest references pending.
  pub fn into_collection(self, ctx: &Context) -> Result<PackageCollection<Context>, LoadError> {
    let base_vars = ctx.vars().with("manifest_dir", path_str(&self.dir));
    let mut collection = PackageCollection::default();

    for entry in &self.file.packages {
      let recipe = self.recipe(entry, &base_vars)?;
      let origin = format!("{}#{}", self.path.display(), entry.name);
      collection.add(Package::new(entry.name.clone(), entry.version.clone(), recipe).with_origin(origin));
    }

    for reference in &self.file.submanifests {
      let reference = substitute(reference, &base_vars)?;
      let anchored = self.anchor(&reference);
      debug!(manifest = %self.path.display(), reference = %anchored.display(), "sub-manifest registered");
      collection.register_sub_manifest(path_str(&anchored));
    }

    Ok(collection)
  }

  fn invalid(&self, message: impl Into<String>) -> LoadError {
    LoadError::Invalid {
      path: self.path.clone(),
      message: message.into(),
    }
  }

  fn anchor(&self, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.dir.join(path)
    }
  }

  fn recipe(&self, entry: &PackageEntry, base_vars: &Vars) -> Result<ManifestRecipe, LoadError> {
    let name = entry.name.trim();
    if name.is_empty() || name != entry.name || name.contains(char::is_whitespace) {
      return Err(self.invalid(format!("invalid package name '{}'", entry.name)));
    }
    if entry.version.trim().is_empty() {
      return Err(self.invalid(format!("package '{name}' has an empty version")));
    }

    let vars = base_vars
      .clone()
      .with("name", entry.name.as_str())
      .with("version", entry.version.as_str());

    let source = match (&entry.url, &entry.path) {
      (Some(_), Some(_)) => return Err(self.invalid(format!("package '{name}' sets both url and path"))),
      (None, None) => return Err(self.invalid(format!("package '{name}' needs a url or a path"))),
      (None, Some(path)) => {
        if entry.sha256.is_some() || entry.source_dir.is_some() {
          return Err(self.invalid(format!(
            "package '{name}': sha256 and source_dir only apply to url sources"
          )));
        }
        Source::Local(self.anchor(&substitute(path, &vars)?))
      }
      (Some(url), None) => {
        if let Some(sha) = &entry.sha256
          && (sha.len() != 64 || !sha.chars().all(|c| c.is_ascii_hexdigit()))
        {
          return Err(self.invalid(format!("package '{name}': sha256 must be 64 hex characters")));
        }
        let source_dir = match &entry.source_dir {
          Some(dir) => substitute(dir, &vars)?,
          None => format!("{}-{}", entry.name, entry.version),
        };
        if Path::new(&source_dir).is_absolute() || source_dir.split(['/', '\\']).any(|part| part == "..") {
          return Err(self.invalid(format!(
            "package '{name}': source_dir must stay inside the deps directory"
          )));
        }
        Source::Archive {
          url: substitute(url, &vars)?,
          sha256: entry.sha256.as_ref().map(|s| s.to_ascii_lowercase()),
          source_dir,
        }
      }
    };

    let builder = match entry.builder {
      BuilderKind::Cmake => {
        if !entry.build.is_empty() || !entry.install.is_empty() {
          return Err(self.invalid(format!(
            "package '{name}': build and install commands need builder = \"script\""
          )));
        }
        Builder::CMake {
          options: placeholder::substitute_all(&entry.cmake_options, &vars)?,
        }
      }
      BuilderKind::Script => {
        if !entry.cmake_options.is_empty() {
          return Err(self.invalid(format!("package '{name}': cmake_options need builder = \"cmake\"")));
        }
        // Stage variables are bound later; reject bad syntax now.
        for cmd in entry.build.iter().chain(&entry.install) {
          placeholder::parse(cmd)?;
        }
        Builder::Script {
          build: entry.build.clone(),
          install: entry.install.clone(),
        }
      }
    };

    Ok(ManifestRecipe {
      id: PackageId::new(entry.name.clone(), entry.version.clone()),
      manifest_dir: self.dir.clone(),
      source,
      builder,
    })
  }
}

/// Loads sub-manifest references that name manifest files or directories.
#[derive(Debug, Clone, Copy, Default)]
pub struct TomlLoader;

impl ManifestLoader<Context> for TomlLoader {
  fn load(&self, ctx: &Context, reference: &str) -> Result<PackageCollection<Context>, LoadError> {
    let manifest = Manifest::read(Path::new(reference))?;
    if manifest.file.config.is_some() {
      warn!(manifest = %manifest.path.display(), "ignoring [config] in sub-manifest");
    }
    manifest.into_collection(ctx)
  }
}
