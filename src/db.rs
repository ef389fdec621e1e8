use std::io::Write;
use std::path::Path;

use rusqlite::Connection;
use tempfile::TempPath;
use tracing::info;

use crate::store::Result;

/// Opens the database at `path`, creating it and the `jobs` table if needed
pub fn init(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch(include_str!("./init.sql"))?;
    info!(path = %path.display(), "database ready");

    Ok(conn)
}

/// Copies a seed database into a temporary `jobinfo-*.db` file and opens it.
/// The file lives as long as the returned [`TempPath`].
pub fn materialize(seed: &[u8]) -> Result<(Connection, TempPath)> {
    let mut file = tempfile::Builder::new()
        .prefix("jobinfo-")
        .suffix(".db")
        .tempfile()?;
    file.write_all(seed)?;
    file.flush()?;
    let path = file.into_temp_path();
    let conn = init(&path)?;

    Ok((conn, path))
}
