//! Loading sub-manifest references into collections.

use super::collection::PackageCollection;
use super::types::LoadError;

/// Turns an opaque sub-manifest reference into the collection it describes.
///
/// The resolver calls this only after the expansion pass has fetched every
/// package currently known, so a reference may point into a fetched source
/// tree. Implemented for closures of the matching shape.
pub trait ManifestLoader<C> {
  fn load(&self, ctx: &C, reference: &str) -> Result<PackageCollection<C>, LoadError>;
}

impl<C, F> ManifestLoader<C> for F
where
  F: Fn(&C, &str) -> Result<PackageCollection<C>, LoadError>,
{
  fn load(&self, ctx: &C, reference: &str) -> Result<PackageCollection<C>, LoadError> {
    self(ctx, reference)
  }
}

/// Loader for collections that never register sub-manifests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSubManifests;

impl<C> ManifestLoader<C> for NoSubManifests {
  fn load(&self, _ctx: &C, reference: &str) -> Result<PackageCollection<C>, LoadError> {
    Err(LoadError::Unsupported(reference.to_string()))
  }
}
