//! Self-service dashboard for a single KOL
//!
//! Every method takes the KOL's own uuid. Resolving it from a session is the
//! caller's job.

use super::load_player;
use super::query::{count, day_of, start_of_day, SECONDS_PER_DAY};
use crate::error::{AdminError, AdminResult};
use crate::gateway::rows::{add_decimal, commission_from_row, opt_decimal_at, COMMISSION_COLUMNS};
use crate::gateway::SqliteGateway;
use crate::model::{CommissionLog, Player, PlayerId, TxMethod};
use crate::reporting::{Page, PageRequest};
use chrono::{Duration, NaiveDate};
use rusqlite::types::Value;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Days covered by the referral growth chart, today included
const GROWTH_WINDOW_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawable {
    pub sol: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KolDashboardStats {
    pub your_referral_code: Option<String>,
    pub total_referrals: i64,
    pub f1_referrals: i64,
    pub f1_sol_earned: Decimal,
    pub f1_mine_earned: i64,
    pub ready_to_withdraw: Withdrawable,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GrowthPoint {
    pub date: NaiveDate,
    pub total_referrals: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommissionBreakdown {
    pub mine_earned: i64,
    pub sol_earned: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferralSpend {
    pub uuid: PlayerId,
    pub player_wallet: Option<String>,
    pub joined_date: i64,
    pub total_sol_spent: Decimal,
}

#[derive(Clone)]
pub struct KolDashboardService {
    store: SqliteGateway,
}

fn require_player(conn: &Connection, uuid: &str) -> AdminResult<Player> {
    load_player(conn, uuid)?.ok_or_else(|| AdminError::not_found("Player"))
}

fn mine_earned(conn: &Connection, uuid: &str) -> AdminResult<i64> {
    Ok(conn.query_row(
        "SELECT COALESCE(SUM(mine_amount), 0) FROM commission_logs WHERE kol_uuid = ?1",
        [uuid],
        |row| row.get(0),
    )?)
}

impl KolDashboardService {
    pub fn new(store: SqliteGateway) -> Self {
        Self { store }
    }

    /// Withdrawable SOL is share minus payouts, never below zero
    pub fn stats(&self, uuid: &str) -> AdminResult<KolDashboardStats> {
        self.store.with_conn(|conn| {
            let player = require_player(conn, uuid)?;
            let withdrawable = (player.total_sol_share - player.total_payout).max(Decimal::ZERO);

            Ok(KolDashboardStats {
                your_referral_code: player.ref_code,
                total_referrals: player.all_referred,
                f1_referrals: player.total_referred,
                f1_sol_earned: player.total_sol_share,
                f1_mine_earned: mine_earned(conn, uuid)?,
                ready_to_withdraw: Withdrawable { sol: withdrawable },
            })
        })
    }

    /// Cumulative direct referrals over the last seven days ending `today`
    ///
    /// The count starts at zero on the first day of the window.
    pub fn referral_growth(&self, uuid: &str, today: NaiveDate) -> AdminResult<Vec<GrowthPoint>> {
        let first = today - Duration::days(GROWTH_WINDOW_DAYS - 1);
        let from = start_of_day(first);
        let until = start_of_day(today) + SECONDS_PER_DAY;

        self.store.with_conn(|conn| {
            require_player(conn, uuid)?;

            let mut stmt = conn.prepare(
                "SELECT created_at FROM ref_logs
                 WHERE referrer_uuid = ?1 AND created_at >= ?2 AND created_at < ?3",
            )?;
            let rows = stmt.query_map(rusqlite::params![uuid, from, until], |row| row.get::<_, i64>(0))?;

            let mut per_day: HashMap<NaiveDate, u64> = HashMap::new();
            for created_at in rows {
                *per_day.entry(day_of(created_at?)?).or_insert(0) += 1;
            }

            let mut running = 0;
            Ok(first
                .iter_days()
                .take(GROWTH_WINDOW_DAYS as usize)
                .map(|date| {
                    running += per_day.get(&date).copied().unwrap_or(0);
                    GrowthPoint {
                        date,
                        total_referrals: running,
                    }
                })
                .collect())
        })
    }

    pub fn commission_breakdown(&self, uuid: &str) -> AdminResult<CommissionBreakdown> {
        self.store.with_conn(|conn| {
            let player = require_player(conn, uuid)?;
            Ok(CommissionBreakdown {
                mine_earned: mine_earned(conn, uuid)?,
                sol_earned: player.total_sol_share,
            })
        })
    }

    /// Direct referrals ranked by SOL spent on MINING, ties by uuid
    pub fn top_referrals(&self, uuid: &str, page: PageRequest) -> AdminResult<Page<ReferralSpend>> {
        self.store.with_conn(|conn| {
            require_player(conn, uuid)?;

            let mut stmt = conn.prepare(
                "SELECT r.referred_uuid, p.solana_address, MIN(r.created_at)
                 FROM ref_logs r JOIN players p ON p.uuid = r.referred_uuid
                 WHERE r.referrer_uuid = ?1
                 GROUP BY r.referred_uuid, p.solana_address",
            )?;
            let mut referrals = stmt
                .query_map([uuid], |row| {
                    Ok(ReferralSpend {
                        uuid: row.get(0)?,
                        player_wallet: row.get(1)?,
                        joined_date: row.get(2)?,
                        total_sol_spent: Decimal::ZERO,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            let mut stmt = conn.prepare(
                "SELECT t.player_uuid, t.sol_amount FROM transaction_logs t
                 WHERE t.method = ?1 AND t.sol_amount IS NOT NULL
                   AND t.player_uuid IN (SELECT referred_uuid FROM ref_logs WHERE referrer_uuid = ?2)",
            )?;
            let rows = stmt.query_map(rusqlite::params![TxMethod::Mining.as_str(), uuid], |row| {
                Ok((row.get::<_, String>(0)?, opt_decimal_at(row, 1)?))
            })?;

            let mut spent: HashMap<PlayerId, Decimal> = HashMap::new();
            for row in rows {
                let (player, sol) = row?;
                let entry = spent.entry(player).or_insert(Decimal::ZERO);
                *entry = add_decimal(*entry, sol.unwrap_or(Decimal::ZERO))?;
            }

            for referral in referrals.iter_mut() {
                referral.total_sol_spent = spent.get(&referral.uuid).copied().unwrap_or(Decimal::ZERO);
            }
            referrals.sort_by(|a, b| {
                b.total_sol_spent
                    .cmp(&a.total_sol_spent)
                    .then_with(|| a.uuid.cmp(&b.uuid))
            });

            Ok(page.slice(referrals))
        })
    }

    /// Commission payouts, newest first
    pub fn commission_history(&self, uuid: &str, page: PageRequest) -> AdminResult<Page<CommissionLog>> {
        self.store.with_conn(|conn| {
            require_player(conn, uuid)?;

            let total = count(
                conn,
                "SELECT COUNT(*) FROM commission_logs WHERE kol_uuid = ?",
                &[Value::Text(uuid.to_string())],
            )?;

            let sql = format!(
                "SELECT {} FROM commission_logs WHERE kol_uuid = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
                COMMISSION_COLUMNS
            );
            let mut stmt = conn.prepare(&sql)?;
            let data = stmt
                .query_map(
                    rusqlite::params![uuid, page.limit() as i64, page.offset() as i64],
                    commission_from_row,
                )?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(Page::new(data, total, page))
        })
    }
}
