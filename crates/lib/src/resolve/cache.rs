//! Per-run cache of fetched sources.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::package::{Package, PackageId, SourceLocation};

use super::types::ResolveError;

/// Maps a package identity to the source already obtained for it.
///
/// One cache lives for exactly one `resolve` call and is never invalidated,
/// so `fetch` runs at most once per identity.
#[derive(Debug, Default)]
pub struct FetchCache {
  sources: HashMap<PackageId, SourceLocation>,
}

impl FetchCache {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn get(&self, id: &PackageId) -> Option<&SourceLocation> {
    self.sources.get(id)
  }

  pub fn contains(&self, id: &PackageId) -> bool {
    self.sources.contains_key(id)
  }

  /// Number of identities fetched so far.
  pub fn len(&self) -> usize {
    self.sources.len()
  }

  pub fn is_empty(&self) -> bool {
    self.sources.is_empty()
  }

  /// Return the cached source for `package`, fetching it first on a miss.
  pub fn fetch<C>(&mut self, package: &Package<C>, ctx: &C) -> Result<&SourceLocation, ResolveError> {
    if self.sources.contains_key(package.id()) {
      debug!(package = %package.id(), "source already fetched");
    } else {
      info!(package = %package.id(), "fetching");
      let source = package.fetch(ctx).map_err(|source| ResolveError::Fetch {
        package: package.id().clone(),
        source,
      })?;
      debug!(package = %package.id(), source = %source, "fetched");
      self.sources.insert(package.id().clone(), source);
    }

    // Present: inserted above or found on entry.
    Ok(&self.sources[package.id()])
  }
}
