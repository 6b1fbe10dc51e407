//! Integration tests for the `palaver` command-line commands.

#![allow(deprecated)] // Command::cargo_bin – macro replacement not yet stable

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Create a temp directory with a small guard-post conversation.
fn test_documents() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("guard.json"),
        r#"[
  {
    "type": "talk_topic",
    "id": "TALK_GUARD",
    "dynamic_line": "Halt. State your business.",
    "responses": [
      { "text": "Just passing through.", "topic": "TALK_GUARD_PASS" },
      { "text": "Can I buy a map?", "condition": { "u_has_cash": 500 }, "topic": "TALK_GUARD_MAP" },
      { "text": "Goodbye.", "topic": "TALK_DONE" }
    ]
  },
  {
    "type": "talk_topic",
    "id": "TALK_GUARD_PASS",
    "dynamic_line": "Move along, then.",
    "responses": [{ "text": "Later.", "topic": "TALK_DONE" }]
  }
]
"#,
    )
    .unwrap();
    fs::write(
        dir.path().join("map.json"),
        r#"{
  "type": "talk_topic",
  "id": "TALK_GUARD_MAP",
  "dynamic_line": "Five dollars, and it's yours.",
  "responses": [{ "text": "Deal.", "topic": "TALK_DONE" }]
}
"#,
    )
    .unwrap();
    dir
}

fn pv() -> Command {
    let mut cmd = Command::cargo_bin("pv").unwrap();
    cmd.env("NO_COLOR", "1");
    cmd
}

fn path(dir: &TempDir) -> &str {
    dir.path().to_str().unwrap()
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

#[test]
fn check_passes_valid_documents() {
    let dir = test_documents();
    pv().args(["check", path(&dir)])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("All checks passed")
                .and(predicate::str::contains("3 topics")),
        );
}

#[test]
fn check_accepts_a_single_file() {
    let dir = test_documents();
    let file = dir.path().join("map.json");
    pv().args(["check", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("1 topic,"));
}

#[test]
fn check_reports_unknown_types() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.json"), r#"[{ "type": "talk_topc" }]"#).unwrap();

    pv().args(["check", path(&dir)])
        .assert()
        .failure()
        .stderr(
            predicate::str::contains("unknown document type `talk_topc`")
                .and(predicate::str::contains("did you mean `talk_topic`?"))
                .and(predicate::str::contains("1 error")),
        );
}

#[test]
fn check_reports_invalid_json() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("bad.json"), "[{ \"type\": ").unwrap();

    pv().args(["check", path(&dir)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid JSON"));
}

#[test]
fn check_empty_dir() {
    let dir = TempDir::new().unwrap();
    pv().args(["check", path(&dir)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no .json files found"));
}

// ---------------------------------------------------------------------------
// topics
// ---------------------------------------------------------------------------

#[test]
fn topics_lists_every_topic() {
    let dir = test_documents();
    pv().args(["topics", path(&dir)])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("TALK_GUARD_PASS")
                .and(predicate::str::contains("TALK_GUARD_MAP"))
                .and(predicate::str::contains("3 topics")),
        );
}

#[test]
fn topics_filter() {
    let dir = test_documents();
    pv().args(["topics", "--filter", "MAP", path(&dir)])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("TALK_GUARD_MAP")
                .and(predicate::str::contains("TALK_GUARD_PASS").not()),
        );
}

#[test]
fn topics_no_matches() {
    let dir = test_documents();
    pv().args(["topics", "--filter", "CAMP", path(&dir)])
        .assert()
        .success()
        .stdout(predicate::str::contains("No topics found"));
}

// ---------------------------------------------------------------------------
// reach
// ---------------------------------------------------------------------------

#[test]
fn reach_lists_next_topics() {
    let dir = test_documents();
    pv().args(["reach", "TALK_GUARD", path(&dir)])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("TALK_GUARD_PASS")
                .and(predicate::str::contains("TALK_GUARD_MAP"))
                .and(predicate::str::contains("TALK_DONE")),
        );
}

#[test]
fn reach_unconditional_skips_gated_responses() {
    let dir = test_documents();
    pv().args(["reach", "--unconditional", "TALK_GUARD", path(&dir)])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("TALK_GUARD_PASS")
                .and(predicate::str::contains("TALK_GUARD_MAP").not()),
        );
}

#[test]
fn reach_unknown_topic() {
    let dir = test_documents();
    pv().args(["reach", "TALK_NOWHERE", path(&dir)])
        .assert()
        .failure()
        .stderr(predicate::str::contains("topic not found: TALK_NOWHERE"));
}

// ---------------------------------------------------------------------------
// play
// ---------------------------------------------------------------------------

#[test]
fn play_follows_scripted_choices() {
    let dir = test_documents();
    pv().args(["play", "TALK_GUARD", path(&dir), "--seed", "7", "--choices", "1,1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Halt. State your business.")
                .and(predicate::str::contains("Move along, then."))
                .and(predicate::str::contains("Later.")),
        );
}

#[test]
fn play_hides_responses_whose_condition_fails() {
    let dir = test_documents();
    pv().args(["play", "TALK_GUARD", path(&dir), "--choices", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Can I buy a map?").not());
}

#[test]
fn play_offers_gated_responses_with_cash() {
    let dir = test_documents();
    pv().args(["play", "TALK_GUARD", path(&dir), "--cash", "1000", "--choices", "2,1"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Can I buy a map?")
                .and(predicate::str::contains("Five dollars, and it's yours.")),
        );
}

#[test]
fn play_quit_takes_the_safe_exit() {
    let dir = test_documents();
    pv().args(["play", "TALK_GUARD", path(&dir), "--choices", "q"])
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Goodbye.")
                .and(predicate::str::contains("Move along").not()),
        );
}

#[test]
fn play_names_the_npc() {
    let dir = test_documents();
    pv().args(["play", "TALK_GUARD", path(&dir), "--npc", "Sergeant Hale", "--choices", "q"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Sergeant Hale"));
}

#[test]
fn play_loads_the_npc_from_json() {
    let dir = test_documents();
    let npc = dir.path().join("npc.character");
    fs::write(&npc, r#"{ "name": "Quartermaster", "bye": "Stay safe out there." }"#).unwrap();

    pv().args(["play", "TALK_GUARD", path(&dir), "--choices", "q"])
        .arg("--npc-file")
        .arg(&npc)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("Quartermaster")
                .and(predicate::str::contains("Stay safe out there.")),
        );
}

#[test]
fn play_rejects_broken_documents() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("bad.json"),
        r#"{ "type": "talk_topic", "id": "TALK_X", "responses": [] }"#,
    )
    .unwrap();

    pv().args(["play", "TALK_X", path(&dir), "--choices", "q"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("a topic needs at least one response"));
}
