//! Implementation of the `nestpkg list` command.
//!
//! Shows what the root manifest declares and checks it for version conflicts.
//! Nothing is fetched, so sub-manifests are listed as references only.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use nestpkg_lib::manifest::Manifest;
use serde::Serialize;

use super::ConfigArgs;
use crate::output::{ITEM, OutputFormat, print_info, print_json, print_stat, print_warning};

#[derive(Debug, Serialize)]
struct ListOutput {
  manifest: PathBuf,
  packages: Vec<ListedPackage>,
  submanifests: Vec<String>,
}

#[derive(Debug, Serialize)]
struct ListedPackage {
  name: String,
  version: String,
  origin: String,
}

/// Execute the list command.
pub fn cmd_list(manifest_path: &Path, args: &ConfigArgs, output: OutputFormat) -> Result<()> {
  let manifest =
    Manifest::read(manifest_path).with_context(|| format!("failed to load {}", manifest_path.display()))?;
  let path = manifest.path().to_path_buf();
  let ctx = args.context(&manifest)?;
  let collection = manifest.into_collection(&ctx)?;

  // Same check the resolver runs first; duplicates inside one manifest are caught here.
  collection.deduplicate()?;

  let listing = ListOutput {
    manifest: path,
    packages: collection
      .packages()
      .iter()
      .map(|p| ListedPackage {
        name: p.name().to_string(),
        version: p.version().to_string(),
        origin: p.origin().to_string(),
      })
      .collect(),
    submanifests: collection.pending().iter().map(|p| p.reference.clone()).collect(),
  };

  if output.is_json() {
    return print_json(&listing);
  }

  print_info(&format!("Manifest: {}", listing.manifest.display()));
  println!();
  print_stat("Packages", &listing.packages.len().to_string());
  for package in &listing.packages {
    println!("  {} {}-{}", ITEM, package.name, package.version);
  }
  if listing.submanifests.is_empty() {
    return Ok(());
  }
  println!();
  print_stat("Sub-manifests", &listing.submanifests.len().to_string());
  for reference in &listing.submanifests {
    println!("  {} {}", ITEM, reference);
  }
  print_warning("Sub-manifest packages are only known after fetching; run `nestpkg resolve --dry-run` to see them.");

  Ok(())
}
