//! SQLite implementation of PersistenceGateway
//!
//! One connection behind `Arc<Mutex<_>>`. Every method takes the lock, runs
//! its statements synchronously and releases it before returning, so no guard
//! ever lives across an `.await`.

use super::filter::{AmountColumn, TransactionFilter};
use super::rows::{add_decimal, opt_decimal_at, player_columns, player_from_row};
use super::schema::apply_embedded_schema;
use super::PersistenceGateway;
use crate::error::{AdminError, AdminResult};
use crate::model::{Player, PlayerId, ReferralEdge, Role};
use crate::sqlite_pragma::apply_optimized_pragmas;
use async_trait::async_trait;
use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Ids bound per `IN (...)` clause, well under SQLite's variable limit
pub const MAX_IDS_PER_QUERY: usize = 500;

/// Shared SQLite handle used by the reporting core and the admin services
#[derive(Clone)]
pub struct SqliteGateway {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteGateway {
    /// Open a database file
    ///
    /// Does NOT create the schema. Run `run_schema_migrations` first, or call
    /// `open_with_embedded_schema`.
    pub fn open(db_path: impl AsRef<Path>) -> AdminResult<Self> {
        let conn = Connection::open(db_path.as_ref())?;
        apply_optimized_pragmas(&conn)?;

        log::info!("📥 SQLite gateway opened: {}", db_path.as_ref().display());

        Ok(Self::from_connection(conn))
    }

    /// Open a database file and make sure the embedded schema exists
    pub fn open_with_embedded_schema(db_path: impl AsRef<Path>) -> AdminResult<Self> {
        let gateway = Self::open(db_path)?;
        gateway.with_conn(apply_embedded_schema)?;
        Ok(gateway)
    }

    /// Fresh in-memory store with the embedded schema applied
    pub fn open_in_memory() -> AdminResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_optimized_pragmas(&conn)?;
        apply_embedded_schema(&conn)?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` with exclusive access to the connection
    pub fn with_conn<T>(&self, f: impl FnOnce(&Connection) -> AdminResult<T>) -> AdminResult<T> {
        let conn = self.conn.lock().map_err(|_| AdminError::LockPoisoned)?;
        f(&*conn)
    }

    /// Run `f` inside a single transaction, committed only if `f` succeeds
    pub fn with_transaction<T>(
        &self,
        f: impl FnOnce(&rusqlite::Transaction<'_>) -> AdminResult<T>,
    ) -> AdminResult<T> {
        let mut conn = self.conn.lock().map_err(|_| AdminError::LockPoisoned)?;
        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

fn in_placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

fn sum_chunk(
    conn: &Connection,
    chunk: &[&PlayerId],
    filter: &TransactionFilter,
    column: AmountColumn,
) -> AdminResult<Option<Decimal>> {
    let (mut clauses, filter_values) = filter.sql_predicates();
    clauses.insert(0, format!("player_uuid IN ({})", in_placeholders(chunk.len())));

    let mut values: Vec<Value> = chunk.iter().map(|id| Value::Text((*id).clone())).collect();
    values.extend(filter_values);

    match column {
        AmountColumn::Token => {
            let sql = format!(
                "SELECT SUM(amount) FROM transaction_logs WHERE {}",
                clauses.join(" AND ")
            );
            let total: Option<i64> =
                conn.query_row(&sql, params_from_iter(values.iter()), |row| row.get(0))?;
            Ok(total.map(Decimal::from))
        }
        AmountColumn::Sol => {
            // SUM() over TEXT would go through REAL; accumulate exactly instead.
            clauses.push("sol_amount IS NOT NULL".to_string());
            let sql = format!(
                "SELECT sol_amount FROM transaction_logs WHERE {}",
                clauses.join(" AND ")
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(values.iter()), |row| opt_decimal_at(row, 0))?;

            let mut total: Option<Decimal> = None;
            for value in rows {
                if let Some(v) = value? {
                    total = Some(add_decimal(total.unwrap_or(Decimal::ZERO), v)?);
                }
            }
            Ok(total)
        }
    }
}

#[async_trait]
impl PersistenceGateway for SqliteGateway {
    async fn find_direct_referrals(&self, id: &str) -> AdminResult<Vec<PlayerId>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT uuid FROM players WHERE referred_by = ?1 ORDER BY uuid")?;
            let ids = stmt
                .query_map([id], |row| row.get::<_, String>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ids)
        })
    }

    async fn find_direct_referrals_batch(&self, ids: &[PlayerId]) -> AdminResult<Vec<ReferralEdge>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.with_conn(|conn| {
            let mut edges = Vec::new();
            for chunk in ids.chunks(MAX_IDS_PER_QUERY) {
                let sql = format!(
                    "SELECT referred_by, uuid FROM players WHERE referred_by IN ({}) ORDER BY uuid",
                    in_placeholders(chunk.len())
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                    Ok(ReferralEdge {
                        referrer: row.get(0)?,
                        referred: row.get(1)?,
                    })
                })?;
                for edge in rows {
                    edges.push(edge?);
                }
            }
            Ok(edges)
        })
    }

    async fn load_referral_edges(&self) -> AdminResult<Vec<ReferralEdge>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT referred_by, uuid FROM players WHERE referred_by IS NOT NULL ORDER BY uuid",
            )?;
            let edges = stmt
                .query_map([], |row| {
                    Ok(ReferralEdge {
                        referrer: row.get(0)?,
                        referred: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            log::debug!("📥 Loaded {} referral edges", edges.len());
            Ok(edges)
        })
    }

    async fn sum_transaction_amount(
        &self,
        ids: &HashSet<PlayerId>,
        filter: &TransactionFilter,
        column: AmountColumn,
    ) -> AdminResult<Option<Decimal>> {
        if ids.is_empty() {
            return Ok(None);
        }

        let mut ordered: Vec<&PlayerId> = ids.iter().collect();
        ordered.sort();

        self.with_conn(|conn| {
            let mut total: Option<Decimal> = None;
            for chunk in ordered.chunks(MAX_IDS_PER_QUERY) {
                if let Some(part) = sum_chunk(conn, chunk, filter, column)? {
                    total = Some(add_decimal(total.unwrap_or(Decimal::ZERO), part)?);
                }
            }

            log::debug!(
                "🔢 Summed {} over {} players: {:?}",
                column.column_name(),
                ordered.len(),
                total
            );
            Ok(total)
        })
    }

    async fn find_players_by_role(&self, role: Role) -> AdminResult<Vec<Player>> {
        self.with_conn(|conn| {
            let sql = format!(
                "SELECT {} FROM players WHERE role = ?1 ORDER BY uuid",
                player_columns(None)
            );
            let mut stmt = conn.prepare(&sql)?;
            let players = stmt
                .query_map([role.as_str()], player_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(players)
        })
    }
}
