use rusqlite::{Connection, params};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::repo::Session;

/// Latest schema version known to this build.
pub const SCHEMA_VERSION: i32 = 1;

pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (or create) the database at the given path.
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        debug!(path = %path.display(), "opened database");
        Ok(Database { conn })
    }

    /// Open a private in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        Ok(Database { conn })
    }

    /// Create the schema tables if they don't exist, then run any pending version-gated migrations.
    pub fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS config (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS employees (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                first_name TEXT NOT NULL,
                last_name  TEXT NOT NULL,
                email      TEXT,
                position   TEXT,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS publications (
                id         INTEGER PRIMARY KEY AUTOINCREMENT,
                kind       TEXT NOT NULL,
                title      TEXT NOT NULL,
                year       INTEGER NOT NULL,
                publisher  TEXT,
                journal    TEXT,
                isbn       TEXT,
                doi        TEXT,
                pages      INTEGER,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS publication_authors (
                publication_id INTEGER NOT NULL REFERENCES publications(id) ON DELETE CASCADE,
                employee_id    INTEGER NOT NULL REFERENCES employees(id) ON DELETE CASCADE,
                position       INTEGER NOT NULL,
                PRIMARY KEY (publication_id, employee_id)
            );
            ",
        )?;

        // Fresh databases start at version 0.
        self.conn.execute(
            "INSERT OR IGNORE INTO config (key, value) VALUES ('schema_version', '0')",
            [],
        )?;

        run_migrations(&self.conn)
    }

    /// Start a unit of work over this database.
    pub fn session(&self) -> Session<'_> {
        Session::new(&self.conn)
    }

    // -- Config --

    pub fn set_config(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO config (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn get_config(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM config WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    pub fn schema_version(&self) -> Result<i32> {
        get_schema_version(&self.conn)
    }
}

/// Read the current schema version from the config table.
fn get_schema_version(conn: &Connection) -> Result<i32> {
    let mut stmt = conn.prepare("SELECT value FROM config WHERE key = 'schema_version'")?;
    let mut rows = stmt.query([])?;
    match rows.next()? {
        Some(row) => {
            let value: String = row.get(0)?;
            value
                .parse::<i32>()
                .map_err(|e| Error::InvalidData(format!("schema_version {value:?}: {e}")))
        }
        None => Ok(0),
    }
}

/// Persist the schema version to the config table.
fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute(
        "INSERT OR REPLACE INTO config (key, value) VALUES ('schema_version', ?1)",
        params![version.to_string()],
    )?;
    Ok(())
}

/// Run all pending schema migrations in order.
///
/// Version 0 is the baseline created by `migrate()`. Each later step runs in
/// its own transaction and bumps `schema_version` when it commits.
fn run_migrations(conn: &Connection) -> Result<()> {
    let version = get_schema_version(conn)?;

    if version < 1 {
        conn.execute_batch(
            "BEGIN;
             CREATE INDEX IF NOT EXISTS idx_publications_kind ON publications(kind);
             CREATE INDEX IF NOT EXISTS idx_publications_year ON publications(year);
             CREATE INDEX IF NOT EXISTS idx_authors_employee ON publication_authors(employee_id);
             COMMIT;",
        )?;
        set_schema_version(conn, 1)?;
        info!("migrated schema to v1");
    }

    Ok(())
}
