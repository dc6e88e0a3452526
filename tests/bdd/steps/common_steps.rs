#![allow(deprecated)]
use cucumber::given;

use crate::PubtrackWorld;

/// Initialize a fresh pubtrack database into the world's temp dir.
#[given("a pubtrack database is initialized")]
async fn a_pubtrack_database_is_initialized(world: &mut PubtrackWorld) {
    let dir = tempfile::TempDir::new().expect("create temp dir");
    let db_path = dir.path().join("pubtrack.db");

    let output = assert_cmd::Command::cargo_bin("pubtrack")
        .expect("pubtrack binary not found")
        .env("PUBTRACK_DB", &db_path)
        .arg("init")
        .output()
        .expect("failed to run pubtrack init");

    assert!(
        output.status.success(),
        "pubtrack init failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    world.db_path = Some(db_path);
    // Keep the TempDir alive for the lifetime of the scenario.
    world.db_dir = Some(dir);
}

/// Point the world at a database path that was never initialized.
#[given("no pubtrack database exists")]
async fn no_pubtrack_database_exists(world: &mut PubtrackWorld) {
    let dir = tempfile::TempDir::new().expect("create temp dir");
    world.db_path = Some(dir.path().join("missing").join("pubtrack.db"));
    world.db_dir = Some(dir);
}
