//! KOL management: leaderboard cards, list, details and membership changes

use super::query::{day_of, like_pattern, parse_date_bound, search_term, WhereBuilder};
use super::{demote, promote, require_member, update_member, MemberUpdate, PromoteRequest};
use crate::error::{AdminError, AdminResult};
use crate::gateway::rows::{add_decimal, commission_from_row, opt_decimal_at, player_columns, player_from_row, COMMISSION_COLUMNS};
use crate::gateway::sqlite::MAX_IDS_PER_QUERY;
use crate::gateway::{AmountColumn, SqliteGateway};
use crate::model::{CommissionLog, Player, PlayerId, Role, TxMethod, TxStatus};
use crate::reporting::{mining_volume_filter, PerformerMetric, ReportingFacade, TopPerformer};
use rusqlite::types::Value;
use chrono::NaiveDate;
use rusqlite::{params_from_iter, Connection};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Downstream spenders shown on the details page
const TOP_USERS_LIMIT: usize = 10;

/// Commission rows shown on the details page
const COMMISSION_HISTORY_LIMIT: i64 = 50;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KolStats {
    pub top_by_volume: Option<TopPerformer>,
    pub top_by_referrals: Option<TopPerformer>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BdManagerRef {
    pub uuid: PlayerId,
    pub username: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KolSummary {
    pub uuid: PlayerId,
    pub username: Option<String>,
    pub wallet: Option<String>,
    pub ref_code: Option<String>,
    pub managed_by: Option<String>,
    pub total_referrals: i64,
    pub total_volume: Decimal,
    pub status: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KolProfile {
    pub uuid: PlayerId,
    pub username: Option<String>,
    pub wallet: Option<String>,
    pub ref_code: Option<String>,
    pub managed_by: Option<String>,
    pub managed_by_uuid: Option<PlayerId>,
    pub sol_fee_share: f64,
    pub commission_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCount {
    /// `YYYY-MM`
    pub month: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KolPerformance {
    pub total_referrals: i64,
    pub f1_referrals: i64,
    pub total_volume: Decimal,
    pub unpaid_commission: Decimal,
    pub referral_growth: Vec<MonthlyCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopSpender {
    pub uuid: PlayerId,
    pub username: Option<String>,
    pub wallet: Option<String>,
    pub total_spent: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct KolDetails {
    pub kol: KolProfile,
    pub performance: KolPerformance,
    pub top_users: Vec<TopSpender>,
    pub commission_history: Vec<CommissionLog>,
}

/// One day of a KOL's own rewards
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarningsPoint {
    pub date: NaiveDate,
    /// MINE from REFERRAL_REWARD
    pub mine_earned: i64,
    /// SOL from SOL_FEE_SHARE
    pub sol_earned: Decimal,
}

#[derive(Clone)]
pub struct KolService {
    store: SqliteGateway,
    reporting: Arc<ReportingFacade>,
}

impl KolService {
    pub fn new(store: SqliteGateway) -> Self {
        let reporting = Arc::new(ReportingFacade::new(Arc::new(store.clone())));
        Self { store, reporting }
    }

    pub async fn stats(&self) -> AdminResult<KolStats> {
        Ok(KolStats {
            top_by_volume: self
                .reporting
                .get_top_performer(Role::Kol, PerformerMetric::Volume)
                .await?,
            top_by_referrals: self
                .reporting
                .get_top_performer(Role::Kol, PerformerMetric::Referrals)
                .await?,
        })
    }

    pub fn bd_managers(&self) -> AdminResult<Vec<BdManagerRef>> {
        self.store.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT uuid, username FROM players WHERE role = ?1 ORDER BY uuid")?;
            let managers = stmt
                .query_map([Role::Bd.as_str()], |row| {
                    Ok(BdManagerRef {
                        uuid: row.get(0)?,
                        username: row.get(1)?,
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(managers)
        })
    }

    /// Every KOL matching `search` (name, wallet or ref code), with volume
    pub async fn list(&self, search: Option<&str>) -> AdminResult<Vec<KolSummary>> {
        let mut filter = WhereBuilder::new();
        filter.push("p.role = ?", [Value::Text(Role::Kol.as_str().to_string())]);
        if let Some(term) = search_term(search) {
            let pattern = like_pattern(term);
            filter.push(
                "(p.username LIKE ? ESCAPE '\\' OR p.solana_address LIKE ? ESCAPE '\\' \
                 OR p.ref_code LIKE ? ESCAPE '\\')",
                [
                    Value::Text(pattern.clone()),
                    Value::Text(pattern.clone()),
                    Value::Text(pattern),
                ],
            );
        }

        let rows: Vec<(Player, Option<String>)> = self.store.with_conn(|conn| {
            let sql = format!(
                "SELECT {}, m.username
                 FROM players p LEFT JOIN players m ON m.uuid = p.managed_by_uuid
                 {}
                 ORDER BY p.uuid",
                player_columns(Some("p")),
                filter.sql()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt
                .query_map(params_from_iter(filter.values().iter()), |row| {
                    Ok((player_from_row(row)?, row.get(17)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows)
        })?;

        let kols: Vec<Player> = rows.iter().map(|(p, _)| p.clone()).collect();
        let volumes = self
            .reporting
            .manager_volumes(&kols, &mining_volume_filter())
            .await?;

        Ok(rows
            .into_iter()
            .zip(volumes)
            .map(|((kol, manager), volume)| KolSummary {
                uuid: kol.uuid,
                username: kol.username,
                wallet: kol.solana_address,
                ref_code: kol.ref_code,
                managed_by: manager,
                total_referrals: kol.all_referred,
                total_volume: volume.volume,
                status: "ACTIVE",
            })
            .collect())
    }

    pub async fn details(&self, uuid: &str) -> AdminResult<KolDetails> {
        let (kol, manager) = self.store.with_conn(|conn| {
            let kol = require_member(conn, uuid, Role::Kol, "KOL")?;
            let manager = match kol.managed_by.as_deref() {
                Some(m) => super::load_player(conn, m)?,
                None => None,
            };
            Ok((kol, manager))
        })?;

        let downstream = self.reporting.resolver().resolve_descendants(uuid).await?;
        let total_volume = self
            .reporting
            .aggregator()
            .aggregate(&downstream, &mining_volume_filter(), AmountColumn::Sol)
            .await?;
        let unpaid_commission = total_volume
            .checked_mul(fraction(kol.sol_fee_share)?)
            .ok_or_else(|| AdminError::Corrupt(format!("commission overflow for KOL {}", uuid)))?;

        let (top_users, referral_growth, commission_history) = self.store.with_conn(|conn| {
            Ok((
                top_spenders(conn, &downstream)?,
                monthly_referrals(conn, &downstream)?,
                latest_commissions(conn, uuid, COMMISSION_HISTORY_LIMIT)?,
            ))
        })?;

        Ok(KolDetails {
            kol: KolProfile {
                uuid: kol.uuid,
                username: kol.username,
                wallet: kol.solana_address,
                ref_code: kol.ref_code,
                managed_by: manager.as_ref().and_then(|m| m.username.clone()),
                managed_by_uuid: manager.map(|m| m.uuid),
                sol_fee_share: kol.sol_fee_share,
                commission_rate: kol.commission_rate,
            },
            performance: KolPerformance {
                total_referrals: kol.all_referred,
                f1_referrals: kol.total_referred,
                total_volume,
                unpaid_commission,
                referral_growth,
            },
            top_users,
            commission_history,
        })
    }

    /// Per-day SUCCESS earnings of the KOL, newest day first
    pub fn earnings(
        &self,
        uuid: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> AdminResult<Vec<EarningsPoint>> {
        let mut filter = WhereBuilder::new();
        filter.push(
            "player_uuid = ? AND status = ? AND method IN (?, ?)",
            [
                Value::Text(uuid.to_string()),
                Value::Text(TxStatus::Success.as_str().to_string()),
                Value::Text(TxMethod::ReferralReward.as_str().to_string()),
                Value::Text(TxMethod::SolFeeShare.as_str().to_string()),
            ],
        );
        if let Some(start) = start {
            filter.push("created_at >= ?", [Value::Integer(parse_date_bound(start, false)?)]);
        }
        if let Some(end) = end {
            filter.push("created_at <= ?", [Value::Integer(parse_date_bound(end, true)?)]);
        }

        self.store.with_conn(|conn| {
            require_member(conn, uuid, Role::Kol, "KOL")?;

            let sql = format!(
                "SELECT created_at, method, amount, sol_amount FROM transaction_logs{}",
                filter.sql()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(filter.values().iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<i64>>(2)?,
                    opt_decimal_at(row, 3)?,
                ))
            })?;

            let mut per_day: BTreeMap<NaiveDate, (i64, Decimal)> = BTreeMap::new();
            for row in rows {
                let (created_at, method, amount, sol) = row?;
                let (mine, earned) = per_day.entry(day_of(created_at)?).or_default();
                if method == TxMethod::ReferralReward.as_str() {
                    *mine = mine.checked_add(amount.unwrap_or(0)).ok_or_else(|| {
                        AdminError::Corrupt(format!("MINE earnings overflow for KOL {}", uuid))
                    })?;
                } else {
                    *earned = add_decimal(*earned, sol.unwrap_or(Decimal::ZERO))?;
                }
            }

            Ok(per_day
                .into_iter()
                .rev()
                .map(|(date, (mine_earned, sol_earned))| EarningsPoint {
                    date,
                    mine_earned,
                    sol_earned,
                })
                .collect())
        })
    }

    pub fn add_kol(&self, req: &PromoteRequest) -> AdminResult<Player> {
        self.store.with_transaction(|tx| promote(tx, req, Role::Kol))
    }

    pub fn update_kol(&self, uuid: &str, update: &MemberUpdate) -> AdminResult<Player> {
        self.store
            .with_transaction(|tx| update_member(tx, uuid, Role::Kol, "KOL", update))
    }

    pub fn remove_kol(&self, uuid: &str) -> AdminResult<()> {
        self.store.with_transaction(|tx| {
            let mut kol = require_member(tx, uuid, Role::Kol, "KOL")?;
            demote(tx, &mut kol)?;
            log::info!("✅ Removed KOL {}", uuid);
            Ok(())
        })
    }
}

fn fraction(value: f64) -> AdminResult<Decimal> {
    Decimal::try_from(value).map_err(|e| {
        AdminError::Corrupt(format!("rate {}: {}", value, e))
    })
}

fn id_chunks(ids: &HashSet<PlayerId>) -> Vec<Vec<Value>> {
    let mut sorted: Vec<&PlayerId> = ids.iter().collect();
    sorted.sort();
    sorted
        .chunks(MAX_IDS_PER_QUERY)
        .map(|chunk| chunk.iter().map(|id| Value::Text((*id).clone())).collect())
        .collect()
}

fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Highest MINING SOL spenders among `ids`, ties by id
fn top_spenders(conn: &Connection, ids: &HashSet<PlayerId>) -> AdminResult<Vec<TopSpender>> {
    let mut spent: HashMap<PlayerId, Decimal> = HashMap::new();

    for chunk in id_chunks(ids) {
        let sql = format!(
            "SELECT player_uuid, sol_amount FROM transaction_logs
             WHERE method = ? AND sol_amount IS NOT NULL AND player_uuid IN ({})",
            placeholders(chunk.len())
        );
        let mut values = vec![Value::Text(TxMethod::Mining.as_str().to_string())];
        values.extend(chunk);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok((row.get::<_, String>(0)?, opt_decimal_at(row, 1)?))
        })?;
        for row in rows {
            let (player, sol) = row?;
            let entry = spent.entry(player).or_insert(Decimal::ZERO);
            *entry = add_decimal(*entry, sol.unwrap_or(Decimal::ZERO))?;
        }
    }

    let mut ranked: Vec<(PlayerId, Decimal)> = spent.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.truncate(TOP_USERS_LIMIT);

    let mut out = Vec::with_capacity(ranked.len());
    for (uuid, total_spent) in ranked {
        let (username, wallet) = conn.query_row(
            "SELECT username, solana_address FROM players WHERE uuid = ?1",
            [&uuid],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        out.push(TopSpender {
            uuid,
            username,
            wallet,
            total_spent,
        });
    }
    Ok(out)
}

/// Referral events into the downstream, bucketed by calendar month (UTC)
fn monthly_referrals(conn: &Connection, ids: &HashSet<PlayerId>) -> AdminResult<Vec<MonthlyCount>> {
    let mut months: BTreeMap<String, u64> = BTreeMap::new();

    for chunk in id_chunks(ids) {
        let sql = format!(
            "SELECT strftime('%Y-%m', created_at, 'unixepoch') AS month, COUNT(*)
             FROM ref_logs WHERE referred_uuid IN ({})
             GROUP BY month",
            placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (month, n) = row?;
            *months.entry(month).or_insert(0) += n.max(0) as u64;
        }
    }

    Ok(months
        .into_iter()
        .map(|(month, count)| MonthlyCount { month, count })
        .collect())
}

fn latest_commissions(conn: &Connection, kol: &str, limit: i64) -> AdminResult<Vec<CommissionLog>> {
    let sql = format!(
        "SELECT {} FROM commission_logs WHERE kol_uuid = ?1
         ORDER BY created_at DESC, id DESC LIMIT ?2",
        COMMISSION_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let logs = stmt
        .query_map(rusqlite::params![kol, limit], commission_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(logs)
}
