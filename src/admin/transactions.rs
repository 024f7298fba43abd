//! Transaction board: totals and the filtered, paginated log

use super::query::{count, like_pattern, parse_date_bound, search_term, sum_decimal, WhereBuilder};
use crate::error::AdminResult;
use crate::gateway::rows::{enum_at, opt_decimal_at};
use crate::gateway::{SqliteGateway, TransactionFilter};
use crate::model::{TxDirection, TxMethod, TxStatus};
use crate::reporting::{Page, PageRequest};
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionStats {
    pub total_volume_sol: Decimal,
    pub total_mine_minted: i64,
    pub current_mine_supply: i64,
    pub total_mine_burned: i64,
}

/// Filters for `find_all`; every field is optional
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionQuery {
    /// Substring of the player's wallet or the transaction hash
    pub search: Option<String>,
    /// Comma-separated methods, e.g. `MINING,CLAIM`
    #[serde(rename = "type")]
    pub methods: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRow {
    pub id: i64,
    pub created_at: i64,
    #[serde(rename = "type")]
    pub method: TxMethod,
    pub direction: TxDirection,
    pub amount: i64,
    pub sol_amount: Option<Decimal>,
    pub txn_hash: Option<String>,
    pub status: TxStatus,
    pub user_wallet: Option<String>,
}

#[derive(Clone)]
pub struct TransactionService {
    store: SqliteGateway,
}

impl TransactionService {
    pub fn new(store: SqliteGateway) -> Self {
        Self { store }
    }

    pub fn stats(&self) -> AdminResult<TransactionStats> {
        self.store.with_conn(|conn| {
            let total_volume_sol = sum_decimal(
                conn,
                "SELECT sol_amount FROM transaction_logs WHERE sol_amount IS NOT NULL",
                &[],
            )?;

            let (minted, burned): (i64, i64) = conn.query_row(
                "SELECT
                    COALESCE(SUM(CASE WHEN transaction_type = 'IN' THEN amount ELSE 0 END), 0),
                    COALESCE(SUM(CASE WHEN transaction_type = 'OUT' THEN amount ELSE 0 END), 0)
                 FROM transaction_logs",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            Ok(TransactionStats {
                total_volume_sol,
                total_mine_minted: minted,
                current_mine_supply: minted - burned,
                total_mine_burned: burned,
            })
        })
    }

    /// Newest first. Unknown methods and unparseable dates are rejected.
    pub fn find_all(
        &self,
        query: &TransactionQuery,
        page: PageRequest,
    ) -> AdminResult<Page<TransactionRow>> {
        let mut filter = WhereBuilder::new();

        if let Some(term) = search_term(query.search.as_deref()) {
            let pattern = like_pattern(term);
            filter.push(
                "(p.solana_address LIKE ? ESCAPE '\\' OR t.transaction_hash LIKE ? ESCAPE '\\')",
                [Value::Text(pattern.clone()), Value::Text(pattern)],
            );
        }

        let methods = TransactionFilter::parse(query.methods.as_deref(), None, None)?;
        let (clauses, values) = methods.sql_predicates();
        if !clauses.is_empty() {
            let qualified: Vec<String> = clauses.iter().map(|c| format!("t.{}", c)).collect();
            filter.push(qualified.join(" AND "), values);
        }

        if let Some(raw) = search_term(query.start_date.as_deref()) {
            filter.push("t.created_at >= ?", [Value::Integer(parse_date_bound(raw, false)?)]);
        }
        if let Some(raw) = search_term(query.end_date.as_deref()) {
            filter.push("t.created_at <= ?", [Value::Integer(parse_date_bound(raw, true)?)]);
        }

        let from = "FROM transaction_logs t LEFT JOIN players p ON p.uuid = t.player_uuid";

        self.store.with_conn(|conn| {
            let total = count(
                conn,
                &format!("SELECT COUNT(*) {}{}", from, filter.sql()),
                filter.values(),
            )?;

            let sql = format!(
                "SELECT t.id, t.created_at, t.method, t.transaction_type, COALESCE(t.amount, 0),
                        t.sol_amount, t.transaction_hash, t.status, p.solana_address
                 {}{}
                 ORDER BY t.created_at DESC, t.id DESC
                 LIMIT ? OFFSET ?",
                from,
                filter.sql()
            );
            let values = filter.values_with([
                Value::Integer(page.limit() as i64),
                Value::Integer(page.offset() as i64),
            ]);

            let mut stmt = conn.prepare(&sql)?;
            let data = stmt
                .query_map(params_from_iter(values.iter()), |row| {
                    Ok(TransactionRow {
                        id: row.get(0)?,
                        created_at: row.get(1)?,
                        method: enum_at(row, 2)?,
                        direction: enum_at(row, 3)?,
                        amount: row.get(4)?,
                        sol_amount: opt_decimal_at(row, 5)?,
                        txn_hash: row.get(6)?,
                        status: enum_at(row, 7)?,
                        user_wallet: row.get(8)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            log::debug!("📊 Transactions page {} -> {} of {}", page.page(), data.len(), total);
            Ok(Page::new(data, total, page))
        })
    }
}
