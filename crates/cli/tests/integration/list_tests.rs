//! `nestpkg list` integration tests.

use predicates::prelude::*;

use super::common::TestEnv;

#[test]
fn list_shows_packages_and_sub_manifests() {
  let env = TestEnv::from_fixture("nested_root.toml");

  env
    .nestpkg_cmd()
    .arg("list")
    .arg(env.root())
    .assert()
    .success()
    .stdout(predicate::str::contains("app-1.0"))
    .stdout(predicate::str::contains("Sub-manifests: 1"))
    .stdout(predicate::str::contains("core"));
}

#[test]
fn list_json_reports_origins() {
  let env = TestEnv::from_fixture("script_single.toml");

  let output = env
    .nestpkg_cmd()
    .arg("list")
    .arg(env.root())
    .args(["-o", "json"])
    .assert()
    .success()
    .get_output()
    .stdout
    .clone();

  let listing: serde_json::Value = serde_json::from_slice(&output).unwrap();
  assert_eq!(listing["packages"][0]["name"], "hello");
  assert!(listing["packages"][0]["origin"].as_str().unwrap().ends_with("nestpkg.toml#hello"));
  assert_eq!(listing["submanifests"].as_array().unwrap().len(), 0);
}

#[test]
fn list_detects_conflict_within_one_manifest() {
  let env = TestEnv::empty();
  env.write_file(
    "nestpkg.toml",
    r#"
[[package]]
name = "fmt"
version = "10.2.1"
path = "a"

[[package]]
name = "fmt"
version = "11.0.2"
path = "b"
"#,
  );

  env
    .nestpkg_cmd()
    .arg("list")
    .arg(env.root())
    .assert()
    .failure()
    .stderr(predicate::str::contains("version conflict for 'fmt'"));
}
