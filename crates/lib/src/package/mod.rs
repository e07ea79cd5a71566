//! Packages: a named, versioned unit with fetch, build and install stages.
//!
//! A [`Package`] pairs an immutable [`PackageId`] with a [`Recipe`] supplying
//! the three stages. Recipes are either dedicated types (see
//! [`crate::manifest::ManifestRecipe`]) or plain closures via
//! [`Package::from_fns`].
//!
//! # Example
//!
//! ```
//! use std::path::PathBuf;
//! use nestpkg_lib::package::{BuildLocation, Package, SourceLocation};
//!
//! let pkg: Package<()> = Package::from_fns(
//!   "zlib",
//!   "1.3.1",
//!   |_| Ok(SourceLocation(PathBuf::from("deps/zlib-1.3.1"))),
//!   |_, src| Ok(BuildLocation(src.path().join("build"))),
//!   |_, _| Ok(()),
//! );
//! pkg.resolve(&()).unwrap();
//! ```

mod types;

use std::fmt;
use std::panic::Location;
use std::sync::Arc;

use tracing::info;

use crate::resolve::ResolveError;

pub use types::{BuildLocation, PackageId, SourceLocation, StageError};

/// The three caller-supplied stages of a package, generic over the context `C`
/// threaded through every call.
pub trait Recipe<C> {
  /// Obtain the package source. Must be idempotent across runs by convention.
  fn fetch(&self, ctx: &C) -> Result<SourceLocation, StageError>;

  /// Compile the fetched source.
  fn build(&self, ctx: &C, source: &SourceLocation) -> Result<BuildLocation, StageError>;

  /// Place build artifacts into the install location described by `ctx`.
  fn install(&self, ctx: &C, build: &BuildLocation) -> Result<(), StageError>;
}

/// A [`Recipe`] assembled from three closures.
pub struct FnRecipe<F, B, I> {
  fetch: F,
  build: B,
  install: I,
}

impl<F, B, I> FnRecipe<F, B, I> {
  pub fn new(fetch: F, build: B, install: I) -> Self {
    Self { fetch, build, install }
  }
}

impl<C, F, B, I> Recipe<C> for FnRecipe<F, B, I>
where
  F: Fn(&C) -> Result<SourceLocation, StageError>,
  B: Fn(&C, &SourceLocation) -> Result<BuildLocation, StageError>,
  I: Fn(&C, &BuildLocation) -> Result<(), StageError>,
{
  fn fetch(&self, ctx: &C) -> Result<SourceLocation, StageError> {
    (self.fetch)(ctx)
  }

  fn build(&self, ctx: &C, source: &SourceLocation) -> Result<BuildLocation, StageError> {
    (self.build)(ctx, source)
  }

  fn install(&self, ctx: &C, build: &BuildLocation) -> Result<(), StageError> {
    (self.install)(ctx, build)
  }
}

/// A dependency request: identity, the place that requested it, and its stages.
///
/// Cloning is cheap; clones share the same recipe.
pub struct Package<C> {
  id: PackageId,
  origin: String,
  recipe: Arc<dyn Recipe<C>>,
}

impl<C> Package<C> {
  /// Create a package. The caller's `file:line` is recorded as its origin.
  #[track_caller]
  pub fn new(name: impl Into<String>, version: impl Into<String>, recipe: impl Recipe<C> + 'static) -> Self {
    let caller = Location::caller();
    Self {
      id: PackageId::new(name, version),
      origin: format!("{}:{}", caller.file(), caller.line()),
      recipe: Arc::new(recipe),
    }
  }

  /// Create a package whose stages are closures.
  #[track_caller]
  pub fn from_fns<F, B, I>(name: impl Into<String>, version: impl Into<String>, fetch: F, build: B, install: I) -> Self
  where
    F: Fn(&C) -> Result<SourceLocation, StageError> + 'static,
    B: Fn(&C, &SourceLocation) -> Result<BuildLocation, StageError> + 'static,
    I: Fn(&C, &BuildLocation) -> Result<(), StageError> + 'static,
  {
    Self::new(name, version, FnRecipe::new(fetch, build, install))
  }

  /// Replace the recorded origin, e.g. with the manifest that declared the package.
  pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
    self.origin = origin.into();
    self
  }

  pub fn id(&self) -> &PackageId {
    &self.id
  }

  pub fn name(&self) -> &str {
    &self.id.name
  }

  pub fn version(&self) -> &str {
    &self.id.version
  }

  /// Where this request came from, reported on version conflicts.
  pub fn origin(&self) -> &str {
    &self.origin
  }

  pub fn fetch(&self, ctx: &C) -> Result<SourceLocation, StageError> {
    self.recipe.fetch(ctx)
  }

  pub fn build(&self, ctx: &C, source: &SourceLocation) -> Result<BuildLocation, StageError> {
    self.recipe.build(ctx, source)
  }

  pub fn install(&self, ctx: &C, build: &BuildLocation) -> Result<(), StageError> {
    self.recipe.install(ctx, build)
  }

  /// Run fetch, build and install in order, without caching.
  ///
  /// For single-package flows only; [`crate::resolve::PackageCollection`]
  /// drives the stages itself.
  pub fn resolve(&self, ctx: &C) -> Result<(), ResolveError> {
    info!(package = %self.id, "resolving package");
    let source = self.fetch(ctx).map_err(|source| ResolveError::Fetch {
      package: self.id.clone(),
      source,
    })?;
    let build = self.build(ctx, &source).map_err(|source| ResolveError::Build {
      package: self.id.clone(),
      source,
    })?;
    self.install(ctx, &build).map_err(|source| ResolveError::Install {
      package: self.id.clone(),
      source,
    })
  }
}

impl<C> Clone for Package<C> {
  fn clone(&self) -> Self {
    Self {
      id: self.id.clone(),
      origin: self.origin.clone(),
      recipe: Arc::clone(&self.recipe),
    }
  }
}

impl<C> fmt::Debug for Package<C> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Package")
      .field("id", &self.id)
      .field("origin", &self.origin)
      .finish_non_exhaustive()
  }
}
