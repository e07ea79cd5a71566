//! The aggregate of package requests gathered across nesting levels.

use std::collections::HashMap;
use std::fmt;

use crate::package::Package;

/// Depth and package recorded by the most recent insertion or merge touching a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct DepthEntry {
  pub(super) depth: usize,
  /// Index into [`PackageCollection::packages`].
  pub(super) index: usize,
}

/// A sub-manifest reference waiting to be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRef {
  pub reference: String,
  /// Depth of the collection that registered the reference, relative to
  /// the collection holding it.
  pub depth: usize,
}

/// Package requests accumulated so far, their nesting depths, and the
/// sub-manifest references still waiting to be expanded.
///
/// Depth is last-write-wins: the depth map holds whatever the latest
/// insertion or merge recorded for a name, never the minimum.
pub struct PackageCollection<C> {
  pub(super) packages: Vec<Package<C>>,
  pub(super) depths: HashMap<String, DepthEntry>,
  pub(super) pending: Vec<PendingRef>,
}

impl<C> PackageCollection<C> {
  /// Create a collection with every package at depth 0 and nothing pending.
  pub fn new(packages: Vec<Package<C>>) -> Self {
    let mut collection = Self {
      packages: Vec::with_capacity(packages.len()),
      depths: HashMap::new(),
      pending: Vec::new(),
    };
    for package in packages {
      collection.add(package);
    }
    collection
  }

  /// Append a package at depth 0.
  pub fn add(&mut self, package: Package<C>) {
    let index = self.packages.len();
    self.depths.insert(package.name().to_string(), DepthEntry { depth: 0, index });
    self.packages.push(package);
  }

  /// Queue a sub-manifest reference for loading once its owner has been fetched.
  pub fn register_sub_manifest(&mut self, reference: impl Into<String>) {
    self.pending.push(PendingRef {
      reference: reference.into(),
      depth: 0,
    });
  }

  /// Merge a child collection one nesting level below this one.
  ///
  /// The child's packages are appended, each of its depth entries overwrites
  /// this collection's entry for the same name with `depth + 1`, and its
  /// pending references are appended to the queue one level deeper.
  pub fn merge(&mut self, other: PackageCollection<C>) {
    self.merge_below(other, 0);
  }

  /// Merge a collection loaded for a reference registered at `parent_depth`.
  ///
  /// Every depth in `other` lands at `parent_depth + 1` or deeper, so a
  /// dependency reached through a chain of sub-manifests stays below the
  /// packages that declared it. Overwrites remain last-write-wins.
  pub fn merge_below(&mut self, other: PackageCollection<C>, parent_depth: usize) {
    let shift = parent_depth + 1;
    let offset = self.packages.len();
    self.packages.extend(other.packages);
    for (name, entry) in other.depths {
      self.depths.insert(
        name,
        DepthEntry {
          depth: entry.depth + shift,
          index: entry.index + offset,
        },
      );
    }
    self.pending.extend(other.pending.into_iter().map(|pending| PendingRef {
      depth: pending.depth + shift,
      ..pending
    }));
  }

  /// Every request in insertion order, duplicates included.
  pub fn packages(&self) -> &[Package<C>] {
    &self.packages
  }

  /// The depth currently recorded for `name`.
  pub fn depth_of(&self, name: &str) -> Option<usize> {
    self.depths.get(name).map(|entry| entry.depth)
  }

  /// Sub-manifest references not yet expanded.
  pub fn pending(&self) -> &[PendingRef] {
    &self.pending
  }

  pub fn len(&self) -> usize {
    self.packages.len()
  }

  pub fn is_empty(&self) -> bool {
    self.packages.is_empty()
  }
}

impl<C> Default for PackageCollection<C> {
  fn default() -> Self {
    Self::new(Vec::new())
  }
}

impl<C> fmt::Debug for PackageCollection<C> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("PackageCollection")
      .field("packages", &self.packages)
      .field("depths", &self.depths)
      .field("pending", &self.pending)
      .finish()
  }
}
