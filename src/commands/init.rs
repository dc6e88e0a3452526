use std::path::Path;

use pubtrack::Result;
use pubtrack::db::Database;

pub fn run(db_path: &Path) -> Result<()> {
    // Create the .pubtrack directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db = Database::open(db_path)?;
    db.migrate()?;
    db.set_config("version", env!("CARGO_PKG_VERSION"))?;

    println!("Initialized pubtrack database at {}", db_path.display());
    println!("Schema version: {}", db.schema_version()?);
    Ok(())
}
