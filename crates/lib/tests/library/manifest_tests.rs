//! Resolving real manifest trees with script-built packages.

use nestpkg_lib::manifest::TomlLoader;
use nestpkg_lib::resolve::{LoadError, ResolveError};

use super::common::{Project, recording_package};

fn nested_project() -> Project {
  let project = Project::new();
  project.mkdir("src/app");
  project.write(
    "nestpkg.toml",
    &format!("submanifests = [\"libs/core\"]\n{}", recording_package("app", "1.0")),
  );
  project.write(
    "libs/core/nestpkg.toml",
    &format!("submanifests = [\"../util\"]\n{}", recording_package("core", "2.1")),
  );
  project.write("libs/util/nestpkg.toml", &recording_package("util", "0.3"));
  // Path sources are relative to each manifest.
  project.mkdir("libs/core/src/core");
  project.mkdir("libs/util/src/util");
  project
}

#[cfg(unix)]
#[test]
fn nested_manifests_build_deepest_first() {
  let project = nested_project();
  let ctx = project.context();
  let mut collection = project.load(&ctx).unwrap();

  let report = collection.resolve(&ctx, &TomlLoader).unwrap();

  assert_eq!(report.expansion_passes, 2);
  assert_eq!(
    project.installed_lines(&ctx, "order.txt"),
    vec![
      "build util-0.3",
      "install util",
      "build core-2.1",
      "install core",
      "build app-1.0",
      "install app",
    ]
  );
  let depths: Vec<_> = report.installed.iter().map(|p| (p.id.name.as_str(), p.depth)).collect();
  assert_eq!(depths, vec![("util", 2), ("core", 1), ("app", 0)]);
}

#[cfg(unix)]
#[test]
fn shared_dependency_is_built_once() {
  let project = Project::new();
  project.mkdir("src/app");
  project.mkdir("a/src/zlib");
  project.mkdir("b/src/zlib");
  project.write(
    "nestpkg.toml",
    &format!("submanifests = [\"a\", \"b\"]\n{}", recording_package("app", "1.0")),
  );
  project.write("a/nestpkg.toml", &recording_package("zlib", "1.3.1"));
  project.write("b/nestpkg.toml", &recording_package("zlib", "1.3.1"));
  let ctx = project.context();
  let mut collection = project.load(&ctx).unwrap();

  collection.resolve(&ctx, &TomlLoader).unwrap();

  let lines = project.installed_lines(&ctx, "order.txt");
  assert_eq!(lines.iter().filter(|l| *l == "build zlib-1.3.1").count(), 1);
  assert_eq!(lines.last().map(String::as_str), Some("install app"));
}

#[test]
fn conflicting_sub_manifest_stops_before_building() {
  let project = Project::new();
  project.mkdir("src/fmt");
  project.mkdir("sub/src/fmt");
  project.write(
    "nestpkg.toml",
    &format!("submanifests = [\"sub\"]\n{}", recording_package("fmt", "10.0")),
  );
  project.write("sub/nestpkg.toml", &recording_package("fmt", "11.0"));
  let ctx = project.context();
  let mut collection = project.load(&ctx).unwrap();

  let err = collection.resolve(&ctx, &TomlLoader).unwrap_err();

  let ResolveError::VersionConflict(conflict) = err else {
    panic!("expected version conflict, got {err}");
  };
  assert_eq!(conflict.versions(), vec!["10.0", "11.0"]);
  assert!(conflict.requests[0].origin.ends_with("nestpkg.toml#fmt"));
  assert!(conflict.requests[1].origin.contains("sub"));
  assert!(project.installed_lines(&ctx, "order.txt").is_empty());
}

#[test]
fn missing_sub_manifest_is_a_load_error() {
  let project = Project::new();
  project.write("nestpkg.toml", "submanifests = [\"nowhere\"]\n");
  let ctx = project.context();
  let mut collection = project.load(&ctx).unwrap();

  let err = collection.resolve(&ctx, &TomlLoader).unwrap_err();

  match err {
    ResolveError::Load { reference, source } => {
      assert!(reference.ends_with("nowhere"));
      assert!(matches!(source, LoadError::NotFound(_)));
    }
    other => panic!("unexpected error: {other}"),
  }
}

#[test]
fn missing_path_source_fails_fetch() {
  let project = Project::new();
  project.write("nestpkg.toml", &recording_package("ghost", "1.0"));
  let ctx = project.context();
  let mut collection = project.load(&ctx).unwrap();

  let err = collection.resolve(&ctx, &TomlLoader).unwrap_err();

  assert!(matches!(err, ResolveError::Fetch { ref package, .. } if package.name == "ghost"));
}
