//! Admin dashboard cards, SOL revenue chart and recent activity

use super::query::{count, day_of, now_unix, sum_decimal, SECONDS_PER_DAY};
use crate::error::{AdminError, AdminResult};
use crate::gateway::rows::{add_decimal, opt_decimal_at, transaction_columns, transaction_from_row};
use crate::gateway::SqliteGateway;
use crate::model::{TransactionLog, TxMethod};
use chrono::NaiveDate;
use rusqlite::types::Value;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_claim_fee: Decimal,
    pub total_mine_minted: i64,
    pub total_claims: u64,
    pub active_players: u64,
    pub total_kols: u64,
    pub total_sol_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevenuePoint {
    pub date: NaiveDate,
    pub revenue: Decimal,
}

/// Players whose last login fell on `date`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGrowthPoint {
    pub date: NaiveDate,
    pub new_users: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTransaction {
    #[serde(flatten)]
    pub log: TransactionLog,
    pub wallet_address: Option<String>,
}

#[derive(Clone)]
pub struct DashboardService {
    store: SqliteGateway,
}

impl DashboardService {
    pub fn new(store: SqliteGateway) -> Self {
        Self { store }
    }

    pub fn stats(&self) -> AdminResult<DashboardStats> {
        self.stats_at(now_unix())
    }

    /// Stats with "active in the last 24h" measured from `now`
    pub fn stats_at(&self, now: i64) -> AdminResult<DashboardStats> {
        self.store.with_conn(|conn| {
            let mining = [Value::Text(TxMethod::Mining.as_str().to_string())];

            let total_claim_fee = sum_decimal(
                conn,
                "SELECT sol_amount FROM transaction_logs WHERE method = ? AND sol_amount IS NOT NULL",
                &mining,
            )?;

            let minting = TxMethod::minting();
            let total_mine_minted: i64 = conn.query_row(
                "SELECT COALESCE(SUM(amount), 0) FROM transaction_logs
                 WHERE transaction_type = 'IN' AND method IN (?1, ?2, ?3)",
                [minting[0].as_str(), minting[1].as_str(), minting[2].as_str()],
                |row| row.get(0),
            )?;

            let total_claims = count(
                conn,
                "SELECT COUNT(*) FROM transaction_logs WHERE method = ?",
                &mining,
            )?;

            let active_players = count(
                conn,
                "SELECT COUNT(*) FROM players WHERE last_login > ?",
                &[Value::Integer(now - SECONDS_PER_DAY)],
            )?;

            let total_kols = count(conn, "SELECT COUNT(*) FROM players WHERE role LIKE 'KOL%'", &[])?;

            let total_sol_balance = sum_decimal(conn, "SELECT sol_balance FROM players", &[])?;

            Ok(DashboardStats {
                total_claim_fee,
                total_mine_minted,
                total_claims,
                active_players,
                total_kols,
                total_sol_balance,
            })
        })
    }

    pub fn sol_revenue_over_time(&self, days: i64) -> AdminResult<Vec<RevenuePoint>> {
        self.sol_revenue_over_time_at(days, now_unix())
    }

    /// Per-day SOL from MINING since `now - days`, oldest day first
    ///
    /// Only days with at least one MINING row appear.
    pub fn sol_revenue_over_time_at(&self, days: i64, now: i64) -> AdminResult<Vec<RevenuePoint>> {
        if days < 1 {
            return Err(AdminError::bad_request(format!("days must be >= 1, got {}", days)));
        }
        let since = now.saturating_sub(days.saturating_mul(SECONDS_PER_DAY));

        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT created_at, sol_amount FROM transaction_logs
                 WHERE method = ?1 AND created_at >= ?2",
            )?;
            let rows = stmt.query_map(rusqlite::params![TxMethod::Mining.as_str(), since], |row| {
                Ok((row.get::<_, i64>(0)?, opt_decimal_at(row, 1)?))
            })?;

            let mut per_day: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
            for row in rows {
                let (created_at, sol) = row?;
                let entry = per_day.entry(day_of(created_at)?).or_insert(Decimal::ZERO);
                *entry = add_decimal(*entry, sol.unwrap_or(Decimal::ZERO))?;
            }

            Ok(per_day
                .into_iter()
                .map(|(date, revenue)| RevenuePoint { date, revenue })
                .collect())
        })
    }

    pub fn user_growth(&self, days: i64) -> AdminResult<Vec<UserGrowthPoint>> {
        self.user_growth_at(days, now_unix())
    }

    /// Last-login counts per day since `now - days`, newest day first
    pub fn user_growth_at(&self, days: i64, now: i64) -> AdminResult<Vec<UserGrowthPoint>> {
        if days < 1 {
            return Err(AdminError::bad_request(format!("days must be >= 1, got {}", days)));
        }
        let since = now.saturating_sub(days.saturating_mul(SECONDS_PER_DAY));

        self.store.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT last_login FROM players WHERE last_login >= ?1")?;
            let rows = stmt.query_map([since], |row| row.get::<_, i64>(0))?;

            let mut per_day: BTreeMap<NaiveDate, u64> = BTreeMap::new();
            for last_login in rows {
                *per_day.entry(day_of(last_login?)?).or_insert(0) += 1;
            }

            Ok(per_day
                .into_iter()
                .rev()
                .map(|(date, new_users)| UserGrowthPoint { date, new_users })
                .collect())
        })
    }

    /// Newest `limit` transactions with the owner's wallet
    pub fn recent_transactions(&self, limit: i64) -> AdminResult<Vec<RecentTransaction>> {
        if limit < 1 {
            return Err(AdminError::InvalidPagination(format!(
                "limit must be > 0, got {}",
                limit
            )));
        }

        self.store.with_conn(|conn| {
            let sql = format!(
                "SELECT {}, p.solana_address
                 FROM transaction_logs t LEFT JOIN players p ON p.uuid = t.player_uuid
                 ORDER BY t.created_at DESC, t.id DESC
                 LIMIT ?1",
                transaction_columns(Some("t"))
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map([limit], |row| {
                    Ok(RecentTransaction {
                        log: transaction_from_row(row)?,
                        wallet_address: row.get(10)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }
}
