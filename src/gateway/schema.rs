//! Schema migration loader
//!
//! All SQL files use `IF NOT EXISTS`, so both entry points are idempotent.

use crate::error::{AdminError, AdminResult};
use rusqlite::Connection;
use std::fs;
use std::path::Path;

/// Schema files compiled into the binary, in execution order
const EMBEDDED_SCHEMA: [(&str, &str); 4] = [
    ("01_players.sql", include_str!("../../sql/01_players.sql")),
    ("02_transaction_logs.sql", include_str!("../../sql/02_transaction_logs.sql")),
    ("03_ref_logs.sql", include_str!("../../sql/03_ref_logs.sql")),
    ("04_commission_logs.sql", include_str!("../../sql/04_commission_logs.sql")),
];

/// Run schema migrations from SQL files
///
/// Reads all .sql files from `schema_dir`, sorted by file name (00_, 01_, ...),
/// and executes them in order. Stops at the first failure.
pub fn run_schema_migrations(conn: &mut Connection, schema_dir: &str) -> AdminResult<()> {
    let schema_path = Path::new(schema_dir);

    if !schema_path.exists() {
        return Err(AdminError::Migration(format!(
            "Schema directory not found: {}",
            schema_dir
        )));
    }

    let mut sql_files: Vec<_> = fs::read_dir(schema_path)?
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().and_then(|s| s.to_str()) == Some("sql"))
        .collect();

    sql_files.sort_by_key(|entry| entry.file_name());

    log::info!("🔧 Running schema migrations from: {}", schema_dir);

    let tx = conn.transaction()?;
    for entry in sql_files {
        let path = entry.path();
        let filename = entry.file_name().to_string_lossy().into_owned();

        log::info!("   ├─ Executing: {}", filename);

        let sql_content = fs::read_to_string(&path)?;
        tx.execute_batch(&sql_content)
            .map_err(|e| AdminError::Migration(format!("{}: {}", filename, e)))?;
    }
    tx.commit()?;

    log::info!("✅ All schema migrations completed successfully");

    Ok(())
}

/// Apply the schema shipped inside the crate
///
/// Used for in-memory stores and when no schema directory is deployed.
pub fn apply_embedded_schema(conn: &Connection) -> AdminResult<()> {
    for (filename, sql) in EMBEDDED_SCHEMA {
        conn.execute_batch(sql)
            .map_err(|e| AdminError::Migration(format!("{}: {}", filename, e)))?;
        log::debug!("   ├─ Applied embedded {}", filename);
    }
    Ok(())
}
