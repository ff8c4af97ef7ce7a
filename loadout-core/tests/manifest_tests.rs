//! Manifest error-message, atomic-write, and parsing tests.

use assert_fs::prelude::*;
use loadout_core::{
    manifest::{self, Manifest},
    AgentKind, CoreError, Target,
};
use predicates::prelude::*;

// ---------------------------------------------------------------------------
// 1. Load error messages
// ---------------------------------------------------------------------------

#[test]
fn load_missing_manifest_returns_not_found() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let err = manifest::load_at(root.path()).unwrap_err();
    assert!(matches!(err, CoreError::ManifestNotFound { .. }), "got: {err}");
    assert!(err.to_string().contains("loadout.yaml"));
    assert!(err.to_string().contains("loadout init"));
}

#[test]
fn load_corrupt_yaml_returns_parse_error_with_path() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("loadout.yaml")
        .write_str(": : corrupt : yaml : !!!\n  - broken: [unclosed")
        .expect("write");

    let err = manifest::load_at(root.path()).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
    assert!(err.to_string().contains("loadout.yaml"));
}

#[test]
fn load_unknown_agent_is_a_parse_error() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("loadout.yaml")
        .write_str("name: x\nagents: [emacs]\n")
        .expect("write");
    let err = manifest::load_at(root.path()).unwrap_err();
    assert!(matches!(err, CoreError::Parse { .. }), "got: {err}");
}

#[test]
fn load_rejects_path_like_slug() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("loadout.yaml")
        .write_str("name: x\nrecipes:\n  - slug: ../escape\n    name: Escape\n")
        .expect("write");
    let err = manifest::load_at(root.path()).unwrap_err();
    assert!(matches!(err, CoreError::InvalidSlug { .. }), "got: {err}");
    assert!(err.to_string().contains("../escape"));
}

// ---------------------------------------------------------------------------
// 2. Parsing
// ---------------------------------------------------------------------------

#[test]
fn full_manifest_parses() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("loadout.yaml")
        .write_str(
            r#"name: shop
agents: [claude, agents_md, copilot]
targets: ["/", "/packages/api"]
recipes:
  - slug: add-endpoint
    name: Add an endpoint
    summary: Wire a new HTTP route
    content: "1. Define the handler"
standards:
  - slug: error-handling
    name: Error handling
    rules: ["Propagate errors with ?", "No unwrap in library code"]
skills:
  - slug: release
    name: Release
    description: Cut a release
    prompt: Follow the checklist.
    files:
      - path: logo.png
        content: iVBORw0=
        is_base64: true
"#,
        )
        .expect("write");

    let m = manifest::load_at(root.path()).expect("load");
    assert_eq!(m.agents, vec![AgentKind::Claude, AgentKind::AgentsMd, AgentKind::Copilot]);
    assert_eq!(m.targets, vec![Target::root(), Target::new("/packages/api")]);
    assert_eq!(m.artifacts.recipes[0].summary.as_deref(), Some("Wire a new HTTP route"));
    assert_eq!(m.artifacts.standards[0].rules.len(), 2);
    assert!(m.artifacts.skills[0].files[0].is_base64);
}

#[test]
fn targets_default_to_root() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    root.child("loadout.yaml").write_str("name: x\n").expect("write");
    let m = manifest::load_at(root.path()).expect("load");
    assert_eq!(m.targets, vec![Target::root()]);
    assert!(m.artifacts.is_empty());
}

// ---------------------------------------------------------------------------
// 3. Init + atomic save
// ---------------------------------------------------------------------------

#[test]
fn init_writes_manifest_named_after_directory() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let repo = root.child("billing-api");
    let m = manifest::init_at(repo.path(), vec![AgentKind::Cursor]).expect("init");
    assert_eq!(m.name, "billing-api");
    repo.child("loadout.yaml")
        .assert(predicate::path::exists())
        .assert(predicate::str::contains("cursor"));
    repo.child("loadout.yaml.tmp").assert(predicate::path::missing());
}

#[test]
fn save_then_load_roundtrip() {
    let root = assert_fs::TempDir::new().expect("tempdir");
    let mut m = Manifest::new("x", vec![AgentKind::Junie]);
    m.targets.push(Target::new("/svc"));
    manifest::save_at(root.path(), &m).expect("save");
    assert_eq!(manifest::load_at(root.path()).expect("load"), m);
}
