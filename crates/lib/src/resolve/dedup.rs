//! Deduplication, version-conflict detection and build ordering.

use std::cmp::Reverse;
use std::collections::HashMap;
use std::fmt;

use tracing::{debug, error};

use crate::package::Package;

use super::collection::PackageCollection;
use super::types::{Request, ResolveError, VersionConflict};

/// One logical package after duplicates have been collapsed.
pub struct ResolvedPackage<'a, C> {
  pub package: &'a Package<C>,
  /// Depth recorded for the name by the most recent insertion or merge.
  pub depth: usize,
  /// Position of the first request for this name; breaks depth ties.
  pub order: usize,
}

impl<C> fmt::Debug for ResolvedPackage<'_, C> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("ResolvedPackage")
      .field("package", self.package.id())
      .field("depth", &self.depth)
      .field("order", &self.order)
      .finish()
  }
}

impl<C> PackageCollection<C> {
  /// Collapse requests to one package per name, in build order.
  ///
  /// Returns a [`ResolveError::VersionConflict`] for the first name (in
  /// insertion order) requested at more than one version. Otherwise the result
  /// is sorted by depth descending, ties broken by first insertion.
  pub fn deduplicate(&self) -> Result<Vec<ResolvedPackage<'_, C>>, ResolveError> {
    let mut groups: Vec<(&str, Vec<usize>)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for (index, package) in self.packages.iter().enumerate() {
      match positions.get(package.name()) {
        Some(&group) => groups[group].1.push(index),
        None => {
          positions.insert(package.name(), groups.len());
          groups.push((package.name(), vec![index]));
        }
      }
    }

    for (name, indices) in &groups {
      if indices.len() > 1 {
        self.check_versions(name, indices)?;
      }
    }

    let mut resolved: Vec<ResolvedPackage<'_, C>> = groups
      .iter()
      .map(|(name, indices)| {
        let first = indices[0];
        let (depth, index) = self
          .depths
          .get(*name)
          .map(|entry| (entry.depth, entry.index))
          .unwrap_or((0, first));
        ResolvedPackage {
          package: &self.packages[index],
          depth,
          order: first,
        }
      })
      .collect();

    // Groups are already in first-insertion order and the sort is stable.
    resolved.sort_by_key(|r| Reverse(r.depth));

    debug!(
      packages = ?resolved.iter().map(|r| r.package.id().to_string()).collect::<Vec<_>>(),
      "deduplicated packages"
    );

    Ok(resolved)
  }

  fn check_versions(&self, name: &str, indices: &[usize]) -> Result<(), ResolveError> {
    let first_version = self.packages[indices[0]].version();
    let requests: Vec<Request> = indices
      .iter()
      .map(|&i| Request {
        version: self.packages[i].version().to_string(),
        origin: self.packages[i].origin().to_string(),
      })
      .collect();

    if requests.iter().all(|r| r.version == first_version) {
      debug!(
        package = name,
        version = first_version,
        count = requests.len(),
        "collapsing duplicate requests"
      );
      return Ok(());
    }

    let conflict = VersionConflict {
      name: name.to_string(),
      requests,
    };
    error!(package = name, versions = ?conflict.versions(), "version conflict");
    for request in &conflict.requests {
      error!(version = %request.version, origin = %request.origin, "conflicting request");
    }
    Err(ResolveError::VersionConflict(conflict))
  }
}
