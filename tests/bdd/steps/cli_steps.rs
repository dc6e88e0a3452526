#![allow(deprecated)]
use cucumber::{given, then, when};
use predicates::prelude::*;
use serde_json::Value;

use crate::PubtrackWorld;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Run `pubtrack` with the given args against the world's database.
/// Stores stdout, stderr, and exit code on the world.
fn run_pubtrack(world: &mut PubtrackWorld, args: &[&str]) {
    let db_path = world
        .db_path
        .as_ref()
        .expect("db_path not set — did you forget 'Given a pubtrack database is initialized'?");

    let output = assert_cmd::Command::cargo_bin("pubtrack")
        .expect("pubtrack binary not found")
        .env("PUBTRACK_DB", db_path)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("failed to run pubtrack");

    world.last_stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    world.last_stderr = String::from_utf8_lossy(&output.stderr).into_owned();
    world.last_exit_code = output.status.code().unwrap_or(-1);
}

/// Run a `--json ... add` command and record the returned id under `alias`.
fn add_with_alias(world: &mut PubtrackWorld, alias: &str, args: &[&str]) {
    let mut cmd_args = vec!["--json"];
    cmd_args.extend_from_slice(args);
    run_pubtrack(world, &cmd_args);

    assert_eq!(
        world.last_exit_code, 0,
        "pubtrack {args:?} failed: {}",
        world.last_stderr
    );
    let json: Value =
        serde_json::from_str(&world.last_stdout).expect("add output is not valid JSON");
    let id = json["id"].as_i64().expect("add JSON has no numeric 'id'");
    world.ids.insert(alias.to_string(), id);
}

fn last_json(world: &PubtrackWorld) -> Value {
    serde_json::from_str(&world.last_stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not valid JSON: {e}\nstdout: {}",
            world.last_stdout
        )
    })
}

// ---------------------------------------------------------------------------
// Given steps
// ---------------------------------------------------------------------------

#[given(expr = "an employee {string} {string} as {string}")]
async fn an_employee(world: &mut PubtrackWorld, first: String, last: String, alias: String) {
    add_with_alias(world, &alias, &["employee", "add", first.as_str(), last.as_str()]);
}

/// `authors` is a comma-separated list of employee aliases, or empty.
#[given(expr = "a publication {string} of kind {string} from {int} by {string} as {string}")]
async fn a_publication(
    world: &mut PubtrackWorld,
    title: String,
    kind: String,
    year: i32,
    authors: String,
    alias: String,
) {
    let author_ids = authors
        .split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(|a| world.id_of(a).to_string())
        .collect::<Vec<_>>()
        .join(",");
    let year = year.to_string();
    let mut args: Vec<&str> = vec![
        "publication",
        "add",
        title.as_str(),
        "--kind",
        kind.as_str(),
        "--year",
        year.as_str(),
    ];
    if !author_ids.is_empty() {
        args.push("--authors");
        args.push(author_ids.as_str());
    }
    add_with_alias(world, &alias, &args);
}

// ---------------------------------------------------------------------------
// When steps
// ---------------------------------------------------------------------------

/// Run `pubtrack` with whitespace-separated args; `@alias` becomes the id.
#[when(expr = "I run {string}")]
async fn i_run(world: &mut PubtrackWorld, command: String) {
    let resolved = world.resolve(&command);
    let args: Vec<&str> = resolved.split_whitespace().collect();
    run_pubtrack(world, &args);
}

// ---------------------------------------------------------------------------
// Then steps
// ---------------------------------------------------------------------------

#[then("the command succeeds")]
async fn the_command_succeeds(world: &mut PubtrackWorld) {
    assert_eq!(
        world.last_exit_code, 0,
        "expected success but got exit {}: {}",
        world.last_exit_code, world.last_stderr
    );
}

#[then(expr = "the command fails with {string}")]
async fn the_command_fails_with(world: &mut PubtrackWorld, expected: String) {
    assert_eq!(
        world.last_exit_code, 1,
        "expected exit 1 but got {}; stdout: {}",
        world.last_exit_code, world.last_stdout
    );
    assert!(
        predicate::str::contains(expected.as_str()).eval(&world.last_stderr),
        "expected stderr to contain {expected:?}, got:\n{}",
        world.last_stderr
    );
}

#[then(expr = "stdout contains {string}")]
async fn stdout_contains(world: &mut PubtrackWorld, expected: String) {
    assert!(
        world.last_stdout.contains(&expected),
        "expected stdout to contain {expected:?}, got:\n{}",
        world.last_stdout
    );
}

#[then(expr = "the JSON output has {int} items")]
async fn the_json_output_has_items(world: &mut PubtrackWorld, expected: usize) {
    let json = last_json(world);
    let items = json.as_array().expect("JSON output is not an array");
    assert_eq!(items.len(), expected, "unexpected item count in {json}");
}

#[then(expr = "the JSON output titles are {string}")]
async fn the_json_output_titles_are(world: &mut PubtrackWorld, expected: String) {
    let json = last_json(world);
    let titles: Vec<&str> = json
        .as_array()
        .expect("JSON output is not an array")
        .iter()
        .map(|p| p["title"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(titles.join(","), expected);
}

#[then(expr = "the JSON output author names are {string}")]
async fn the_json_output_author_names_are(world: &mut PubtrackWorld, expected: String) {
    let json = last_json(world);
    let names: Vec<&str> = json["authors"]
        .as_array()
        .expect("JSON output has no authors array")
        .iter()
        .map(|a| a["name"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(names.join(","), expected);
}
