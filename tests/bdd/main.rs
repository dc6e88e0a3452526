mod steps;

use std::collections::HashMap;
use std::path::PathBuf;

use cucumber::World;

/// Shared state carried through each scenario.
#[derive(Debug, Default, World)]
pub struct PubtrackWorld {
    /// Temporary directory that owns the database file.
    pub db_dir: Option<tempfile::TempDir>,
    /// Path to the SQLite database file inside `db_dir`.
    pub db_path: Option<PathBuf>,
    /// The raw stdout of the most recent `pubtrack` invocation.
    pub last_stdout: String,
    /// The raw stderr of the most recent `pubtrack` invocation.
    pub last_stderr: String,
    /// Exit code of the most recent `pubtrack` invocation.
    pub last_exit_code: i32,
    /// Alias to record id, shared by employees and publications.
    pub ids: HashMap<String, i64>,
    /// HTTP client for talking to the in-process server.
    pub http_client: reqwest::Client,
    /// Port of the in-process server, once started.
    pub server_port: Option<u16>,
    /// Handle of the spawned server task.
    pub server_handle: Option<tokio::task::JoinHandle<()>>,
    pub last_response_status: Option<u16>,
    pub last_response_content_type: Option<String>,
    pub last_response_disposition: Option<String>,
    pub last_response_body: Option<String>,
}

impl PubtrackWorld {
    /// Replace every `@alias` in `text` with its recorded id.
    pub fn resolve(&self, text: &str) -> String {
        let mut aliases: Vec<(&String, &i64)> = self.ids.iter().collect();
        // Longest first so `@ada` never clobbers part of `@adam`.
        aliases.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        let mut out = text.to_string();
        for (alias, id) in aliases {
            out = out.replace(&format!("@{alias}"), &id.to_string());
        }
        out
    }

    pub fn id_of(&self, alias: &str) -> i64 {
        *self
            .ids
            .get(alias)
            .unwrap_or_else(|| panic!("no record with alias '{alias}'"))
    }
}

#[tokio::main]
async fn main() {
    PubtrackWorld::run("tests/features").await;
}
