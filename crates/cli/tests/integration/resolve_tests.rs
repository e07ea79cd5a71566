//! `nestpkg resolve` integration tests.

use predicates::prelude::*;
use serial_test::serial;

use super::common::{TestEnv, read_lines};

fn nested_env() -> TestEnv {
  let env = TestEnv::from_fixture("nested_root.toml");
  env.mkdir("src/app");
  env.copy_fixture("nested_core.toml", "libs/core/nestpkg.toml");
  env.copy_fixture("nested_util.toml", "libs/util/nestpkg.toml");
  env
}

#[test]
fn script_package_is_built_and_installed() {
  if cfg!(windows) {
    return;
  }

  let env = TestEnv::from_fixture("script_single.toml");
  env.mkdir("src/hello");

  env
    .nestpkg_cmd()
    .arg("resolve")
    .arg(env.manifest_path())
    .assert()
    .success()
    .stdout(predicate::str::contains("Installed 1 package(s)"))
    .stdout(predicate::str::contains("hello-1.0 (depth 0)"));

  assert_eq!(read_lines(&env.install_dir().join("hello.txt")), vec!["built hello-1.0"]);
}

#[test]
fn nested_sub_manifests_build_deepest_first() {
  if cfg!(windows) {
    return;
  }

  let env = nested_env();

  let output = env
    .nestpkg_cmd()
    .arg("resolve")
    .arg(env.root())
    .args(["--output", "json"])
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();

  let summary: serde_json::Value = serde_json::from_slice(&output).unwrap();
  assert_eq!(summary["expansion_passes"], 2);
  let packages: Vec<(String, u64)> = summary["packages"]
    .as_array()
    .unwrap()
    .iter()
    .map(|p| (p["name"].as_str().unwrap().to_string(), p["depth"].as_u64().unwrap()))
    .collect();
  assert_eq!(
    packages,
    vec![("util".to_string(), 2), ("core".to_string(), 1), ("app".to_string(), 0)]
  );
  assert_eq!(read_lines(&env.install_dir().join("order.txt")), vec!["util", "core", "app"]);
}

#[test]
fn version_conflict_fails_before_building() {
  let env = TestEnv::from_fixture("conflict_root.toml");
  env.mkdir("src/fmt");
  env.copy_fixture("conflict_sub.toml", "sub/nestpkg.toml");

  env
    .nestpkg_cmd()
    .arg("resolve")
    .arg(env.root())
    .assert()
    .failure()
    .stderr(predicate::str::contains("version conflict for 'fmt': 10.2.1, 11.0.2"));

  assert!(!env.install_dir().join("built.txt").exists());
}

#[test]
fn failing_build_reports_package() {
  if cfg!(windows) {
    return;
  }

  let env = TestEnv::from_fixture("failing_build.toml");
  env.mkdir("src/broken");

  env
    .nestpkg_cmd()
    .arg("resolve")
    .arg(env.root())
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to build broken-0.1"))
    .stderr(predicate::str::contains("exit code Some(7)"));
}

#[test]
fn dry_run_touches_nothing() {
  let env = TestEnv::from_fixture("cmake_remote.toml");

  env
    .nestpkg_cmd()
    .arg("resolve")
    .arg(env.root())
    .arg("--dry-run")
    .assert()
    .success()
    .stdout(predicate::str::contains("Would install 1 package(s)"))
    .stderr(predicate::str::contains("[dry-run]"))
    .stderr(predicate::str::contains("-G Ninja"));

  assert!(!env.root().join("deps").exists());
}

#[test]
fn missing_path_source_fails_fetch() {
  let env = TestEnv::from_fixture("script_single.toml");

  env
    .nestpkg_cmd()
    .arg("resolve")
    .arg(env.root())
    .assert()
    .failure()
    .stderr(predicate::str::contains("failed to fetch hello-1.0"));
}

#[test]
#[serial]
fn install_dir_from_environment() {
  if cfg!(windows) {
    return;
  }

  let env = TestEnv::from_fixture("script_single.toml");
  env.mkdir("src/hello");
  let prefix = env.root().join("prefix");

  temp_env::with_var("NESTPKG_INSTALL_DIR", Some(&prefix), || {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("nestpkg");
    cmd.env_remove("NESTPKG_DEPS_DIR").arg("resolve").arg(env.root());
    cmd.assert().success();
  });

  assert!(prefix.join("hello.txt").is_file());
  assert!(!env.install_dir().join("hello.txt").exists());
}

#[test]
fn install_dir_flag_overrides_manifest_config() {
  if cfg!(windows) {
    return;
  }

  let env = TestEnv::empty();
  env.write_file(
    "nestpkg.toml",
    &format!(
      "[config]\ninstall_dir = \"from-manifest\"\n{}",
      super::common::fixture_content("script_single.toml")
    ),
  );
  env.mkdir("src/hello");
  let prefix = env.root().join("from-flag");

  env
    .nestpkg_cmd()
    .arg("resolve")
    .arg(env.root())
    .arg("--install-dir")
    .arg(&prefix)
    .assert()
    .success();

  assert!(prefix.join("hello.txt").is_file());
  assert!(!env.root().join("from-manifest").join("hello.txt").exists());
}
