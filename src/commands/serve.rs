use std::path::Path;

use pubtrack::Result;
use pubtrack::web;

use super::open_db;

pub fn run(db_path: &Path, host: &str, port: u16) -> Result<()> {
    // Fail fast on a missing database before spinning up the runtime.
    drop(open_db(db_path)?);
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(web::serve(db_path, host, port))
}
