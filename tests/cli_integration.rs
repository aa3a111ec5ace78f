//! CLI integration tests for Blueprint
//!
//! These tests verify the complete workflow from initialization through
//! resolution and action execution, ensuring commands work together.

use predicates::prelude::*;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

/// Get a command instance for the bp binary
fn bp_cmd() -> assert_cmd::Command {
    assert_cmd::Command::new(assert_cmd::cargo::cargo_bin!("bp"))
}

/// Create a temporary directory and initialize a blueprint project
fn setup_project() -> TempDir {
    let dir = TempDir::new().unwrap();
    bp_cmd().arg("init").arg(dir.path()).assert().success();
    dir
}

fn write_descriptor(dir: &Path, content: &str) {
    fs::write(dir.join("blueprint.yaml"), content).unwrap();
}

// =============================================================================
// Initialization Tests
// =============================================================================

#[test]
fn test_init_creates_structure() {
    let dir = TempDir::new().unwrap();

    bp_cmd()
        .arg("init")
        .arg(dir.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Initialized blueprint project"));

    assert!(dir.path().join("blueprint.yaml").is_file());
    assert!(dir.path().join(".bp").is_dir());
    assert!(dir.path().join(".bp/.gitignore").is_file());
}

#[test]
fn test_init_is_idempotent() {
    let dir = TempDir::new().unwrap();

    bp_cmd().arg("init").arg(dir.path()).assert().success();
    bp_cmd().arg("init").arg(dir.path()).assert().success();
}

// =============================================================================
// Resolution Tests
// =============================================================================

#[test]
fn test_resolve_merges_local_include() {
    let dir = setup_project();

    let lib = dir.path().join("lib");
    fs::create_dir_all(&lib).unwrap();
    write_descriptor(
        &lib,
        r#"
metadata:
  name: lib
units:
  helper:
    source: ./helper
"#,
    );

    write_descriptor(
        dir.path(),
        r#"
metadata:
  name: app
units:
  app:
    source: ./src
include:
  lib: ./lib
"#,
    );

    bp_cmd()
        .current_dir(dir.path())
        .args(["resolve", "--format", "json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("helper"))
        .stdout(predicate::str::contains("app"));
}

#[test]
fn test_resolve_reports_missing_unit_source() {
    let dir = setup_project();

    write_descriptor(
        dir.path(),
        r#"
metadata:
  name: app
units:
  broken:
    actions:
      build: echo nope
"#,
    );

    bp_cmd()
        .current_dir(dir.path())
        .arg("resolve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("source is mandatory"));
}

#[test]
fn test_resolve_reports_failed_include_but_names_it() {
    let dir = setup_project();

    write_descriptor(
        dir.path(),
        r#"
metadata:
  name: app
include:
  missing: ./does-not-exist
"#,
    );

    bp_cmd()
        .current_dir(dir.path())
        .arg("resolve")
        .assert()
        .failure()
        .stderr(predicate::str::contains("missing"));
}

// =============================================================================
// Action Execution Tests
// =============================================================================

#[test]
fn test_run_blueprint_scope_action() {
    let dir = setup_project();

    write_descriptor(
        dir.path(),
        r#"
metadata:
  name: app
actions:
  hello: echo hello-world
"#,
    );

    bp_cmd()
        .current_dir(dir.path())
        .args(["run", "hello"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello-world"));
}

#[test]
fn test_run_resolves_action_reference() {
    let dir = setup_project();

    write_descriptor(
        dir.path(),
        r#"
metadata:
  name: app
units:
  greeter:
    source: ./greeter
    actions:
      greet: echo from-the-unit
actions:
  greet: $greeter.greet
"#,
    );

    bp_cmd()
        .current_dir(dir.path())
        .args(["run", "greet"])
        .assert()
        .success()
        .stdout(predicate::str::contains("from-the-unit"));
}

#[test]
fn test_run_unknown_action_fails() {
    let dir = setup_project();

    write_descriptor(dir.path(), "metadata:\n  name: app\n");

    bp_cmd()
        .current_dir(dir.path())
        .args(["run", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_run_forwards_input_value() {
    let dir = setup_project();

    write_descriptor(
        dir.path(),
        r#"
metadata:
  name: app
actions:
  show: printf %s "$BP_INPUT"
"#,
    );

    bp_cmd()
        .current_dir(dir.path())
        .args(["run", "show", "--input", "forty-two"])
        .assert()
        .success()
        .stdout(predicate::str::contains("forty-two"));
}

// =============================================================================
// Action Flow Tests
// =============================================================================

#[test]
fn test_flow_threads_values_and_skips_on_condition() {
    let dir = setup_project();

    write_descriptor(
        dir.path(),
        r#"
metadata:
  name: app
actions:
  first: echo step1
  second: echo step2
action_flows:
  pipeline:
    - action: first
    - action: second
      condition: "false"
"#,
    );

    // second is skipped, so the flow result is first's output
    bp_cmd()
        .current_dir(dir.path())
        .args(["flow", "run", "pipeline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("step1"))
        .stdout(predicate::str::contains("step2").not());
}

#[test]
fn test_flow_fails_fast() {
    let dir = setup_project();

    write_descriptor(
        dir.path(),
        r#"
metadata:
  name: app
actions:
  boom: exit 9
  after: echo unreachable
action_flows:
  pipeline:
    - boom
    - after
"#,
    );

    bp_cmd()
        .current_dir(dir.path())
        .args(["flow", "run", "pipeline"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("unreachable").not());
}

#[test]
fn test_flow_list() {
    let dir = setup_project();

    write_descriptor(
        dir.path(),
        r#"
metadata:
  name: app
actions:
  noop: "true"
action_flows:
  deploy:
    - noop
"#,
    );

    bp_cmd()
        .current_dir(dir.path())
        .args(["flow", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("deploy"));
}

// =============================================================================
// Listener Tests
// =============================================================================

#[test]
fn test_emit_runs_bound_listener() {
    let dir = setup_project();

    write_descriptor(
        dir.path(),
        r#"
metadata:
  name: app
units:
  watcher:
    source: ./watcher
    actions:
      record: printf %s "$BP_INPUT" > listener-output.txt
    listener:
      event: tick
      action: watcher.record
"#,
    );

    bp_cmd()
        .current_dir(dir.path())
        .args(["emit", "tick", "--value", "fired"])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 listener"));

    let recorded = fs::read_to_string(dir.path().join("listener-output.txt")).unwrap();
    assert_eq!(recorded, "fired");
}

#[test]
fn test_emit_without_bindings_dispatches_nothing() {
    let dir = setup_project();

    write_descriptor(dir.path(), "metadata:\n  name: app\n");

    bp_cmd()
        .current_dir(dir.path())
        .args(["emit", "tick"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 listener"));
}
