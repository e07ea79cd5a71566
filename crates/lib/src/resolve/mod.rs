//! Resolution of package collections.
//!
//! This module drives a [`PackageCollection`] through fetch, build and install:
//! 1. Expand pending sub-manifests until none remain, fetching every known
//!    package before each drain so the references can point into fetched sources
//! 2. Deduplicate the final request set, failing on version conflicts
//! 3. Fetch whatever the expansion did not, reusing cached sources
//! 4. Build and install each package, deepest first, stopping on the first failure
//!
//! Everything runs sequentially on the calling thread. Packages installed
//! before a failure are left in place.
//!
//! # Modules
//!
//! - [`cache`] - Per-run fetch cache
//! - [`collection`] - Request aggregation and depth tracking
//! - [`dedup`] - Duplicate collapsing, conflict detection and ordering
//! - [`loader`] - Sub-manifest loading contract

pub mod cache;
pub mod collection;
pub mod dedup;
pub mod loader;
mod types;

use tracing::{debug, info};

pub use cache::FetchCache;
pub use collection::{PackageCollection, PendingRef};
pub use dedup::ResolvedPackage;
pub use loader::{ManifestLoader, NoSubManifests};
pub use types::{InstalledPackage, LoadError, Request, ResolveError, ResolveReport, VersionConflict};

impl<C> PackageCollection<C> {
  /// Resolve every package in the collection.
  ///
  /// `loader` is called once per pending sub-manifest reference. It must not
  /// keep producing new references forever; cycles are not detected here.
  ///
  /// # Errors
  ///
  /// Returns the first fatal condition met: a version conflict, a failed
  /// sub-manifest load, or a failed fetch, build or install. Nothing is retried.
  pub fn resolve<L>(&mut self, ctx: &C, loader: &L) -> Result<ResolveReport, ResolveError>
  where
    L: ManifestLoader<C> + ?Sized,
  {
    info!(
      packages = self.packages.len(),
      pending = self.pending.len(),
      "resolving collection"
    );

    let mut cache = FetchCache::new();
    let mut report = ResolveReport::default();

    while !self.pending.is_empty() {
      report.expansion_passes += 1;
      debug!(
        pass = report.expansion_passes,
        pending = self.pending.len(),
        "expanding sub-manifests"
      );

      for resolved in self.deduplicate()? {
        cache.fetch(resolved.package, ctx)?;
      }

      for pending in std::mem::take(&mut self.pending) {
        debug!(reference = %pending.reference, depth = pending.depth, "loading sub-manifest");
        let child = loader
          .load(ctx, &pending.reference)
          .map_err(|err| ResolveError::Load {
            reference: pending.reference.clone(),
            source: err,
          })?;
        self.merge_below(child, pending.depth);
      }
    }

    let resolved = self.deduplicate()?;

    let mut sources = Vec::with_capacity(resolved.len());
    for entry in &resolved {
      sources.push(cache.fetch(entry.package, ctx)?.clone());
    }
    report.fetched = cache.len();

    for (entry, source) in resolved.iter().zip(sources) {
      let id = entry.package.id();

      info!(package = %id, depth = entry.depth, "building");
      let build = entry.package.build(ctx, &source).map_err(|err| ResolveError::Build {
        package: id.clone(),
        source: err,
      })?;

      info!(package = %id, build = %build, "installing");
      entry.package.install(ctx, &build).map_err(|err| ResolveError::Install {
        package: id.clone(),
        source: err,
      })?;

      report.installed.push(InstalledPackage {
        id: id.clone(),
        depth: entry.depth,
        source,
        build,
      });
    }

    info!(
      passes = report.expansion_passes,
      fetched = report.fetched,
      installed = report.installed.len(),
      "resolution complete"
    );

    Ok(report)
  }
}
