//! Connection PRAGMAs shared by every SQLite handle the crate opens

use rusqlite::Connection;

/// Apply tuned PRAGMAs to a freshly opened connection
///
/// WAL journal, NORMAL sync, in-memory temp store, enforced foreign keys and a
/// busy timeout so concurrent readers wait instead of failing on SQLITE_BUSY.
/// In-memory databases silently keep the `memory` journal mode.
pub fn apply_optimized_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "temp_store", "MEMORY")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    conn.busy_timeout(std::time::Duration::from_secs(5))?;

    log::debug!("📊 Applied SQLite PRAGMAs (WAL, NORMAL, MEMORY, foreign_keys)");
    Ok(())
}
