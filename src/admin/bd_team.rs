//! BD team: managers of KOLs

use super::query::{day_of, parse_date_bound, WhereBuilder};
use super::{demote, promote, require_member, update_member, MemberUpdate, PromoteRequest};
use crate::error::AdminResult;
use crate::gateway::rows::{add_decimal, opt_decimal_at, player_columns, player_from_row};
use crate::gateway::{AmountColumn, PersistenceGateway, SqliteGateway};
use crate::model::{Player, PlayerId, Role, TxMethod, TxStatus};
use crate::referral::{ReferralIndex, VolumeAggregator};
use crate::reporting::mining_volume_filter;
use chrono::NaiveDate;
use rusqlite::params_from_iter;
use rusqlite::types::Value;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BdSummary {
    pub uuid: PlayerId,
    pub bd_name: Option<String>,
    pub kols_managed: usize,
    pub total_volume_generated: Decimal,
}

/// One day of activity across a BD's KOLs
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BdPerformancePoint {
    pub date: NaiveDate,
    pub active_kols: u64,
    pub total_sol_earned: Decimal,
}

#[derive(Clone)]
pub struct BdTeamService {
    store: SqliteGateway,
    aggregator: Arc<VolumeAggregator>,
}

impl BdTeamService {
    pub fn new(store: SqliteGateway) -> Self {
        let aggregator = Arc::new(VolumeAggregator::new(Arc::new(store.clone())));
        Self { store, aggregator }
    }

    /// Every BD with its KOL count and the MINING volume under those KOLs
    ///
    /// Downstream sets of one BD's KOLs are merged first, so a player below
    /// two of its KOLs counts once.
    pub async fn list(&self) -> AdminResult<Vec<BdSummary>> {
        let bds = self.store.find_players_by_role(Role::Bd).await?;
        if bds.is_empty() {
            return Ok(Vec::new());
        }

        let managed: HashMap<PlayerId, Vec<PlayerId>> = self.store.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT managed_by_uuid, uuid FROM players
                 WHERE role = ?1 AND managed_by_uuid IS NOT NULL ORDER BY uuid",
            )?;
            let rows = stmt.query_map([Role::Kol.as_str()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?;

            let mut managed: HashMap<PlayerId, Vec<PlayerId>> = HashMap::new();
            for row in rows {
                let (bd, kol) = row?;
                managed.entry(bd).or_default().push(kol);
            }
            Ok(managed)
        })?;

        let index = ReferralIndex::load(&self.store).await?;
        let below_kol = index.descendants_of_all(managed.values().flatten().map(String::as_str));
        let filter = mining_volume_filter();

        let mut out = Vec::with_capacity(bds.len());
        for bd in bds {
            let kols = managed.get(&bd.uuid).map(Vec::as_slice).unwrap_or_default();

            let mut downstream: HashSet<PlayerId> = HashSet::new();
            for kol in kols {
                if let Some(ids) = below_kol.get(kol) {
                    downstream.extend(ids.iter().cloned());
                }
            }
            let volume = self
                .aggregator
                .aggregate(&downstream, &filter, AmountColumn::Sol)
                .await?;

            out.push(BdSummary {
                uuid: bd.uuid,
                bd_name: bd.username,
                kols_managed: kols.len(),
                total_volume_generated: volume,
            });
        }

        log::debug!("📊 BD team: {} members", out.len());
        Ok(out)
    }

    /// KOLs assigned to the BD, highest total SOL share first
    pub fn managed_kols(&self, uuid: &str) -> AdminResult<Vec<Player>> {
        self.store.with_conn(|conn| {
            require_member(conn, uuid, Role::Bd, "BD member")?;

            let sql = format!(
                "SELECT {} FROM players WHERE managed_by_uuid = ?1 AND role = ?2
                 ORDER BY CAST(total_sol_share AS REAL) DESC, uuid ASC",
                player_columns(None)
            );
            let mut stmt = conn.prepare(&sql)?;
            let kols = stmt
                .query_map([uuid, Role::Kol.as_str()], player_from_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(kols)
        })
    }

    /// Per-day SUCCESS activity of the BD's KOLs, newest day first
    ///
    /// `active_kols` counts KOLs with any successful transaction that day;
    /// `total_sol_earned` sums only their SOL_FEE_SHARE rows. Either date
    /// bound may be given alone.
    pub fn performance(
        &self,
        uuid: &str,
        start: Option<&str>,
        end: Option<&str>,
    ) -> AdminResult<Vec<BdPerformancePoint>> {
        let mut filter = WhereBuilder::new();
        filter.push(
            "kol.managed_by_uuid = ? AND kol.role = ? AND t.status = ?",
            [
                Value::Text(uuid.to_string()),
                Value::Text(Role::Kol.as_str().to_string()),
                Value::Text(TxStatus::Success.as_str().to_string()),
            ],
        );
        if let Some(start) = start {
            filter.push("t.created_at >= ?", [Value::Integer(parse_date_bound(start, false)?)]);
        }
        if let Some(end) = end {
            filter.push("t.created_at <= ?", [Value::Integer(parse_date_bound(end, true)?)]);
        }

        self.store.with_conn(|conn| {
            require_member(conn, uuid, Role::Bd, "BD member")?;

            let sql = format!(
                "SELECT t.created_at, t.player_uuid, t.method, t.sol_amount
                 FROM transaction_logs t JOIN players kol ON kol.uuid = t.player_uuid{}",
                filter.sql()
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(filter.values().iter()), |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    opt_decimal_at(row, 3)?,
                ))
            })?;

            let mut per_day: BTreeMap<NaiveDate, (HashSet<PlayerId>, Decimal)> = BTreeMap::new();
            for row in rows {
                let (created_at, kol, method, sol) = row?;
                let (active, earned) = per_day.entry(day_of(created_at)?).or_default();
                active.insert(kol);
                if method == TxMethod::SolFeeShare.as_str() {
                    *earned = add_decimal(*earned, sol.unwrap_or(Decimal::ZERO))?;
                }
            }

            Ok(per_day
                .into_iter()
                .rev()
                .map(|(date, (active, total_sol_earned))| BdPerformancePoint {
                    date,
                    active_kols: active.len() as u64,
                    total_sol_earned,
                })
                .collect())
        })
    }

    /// Manager fields in the request are ignored; a BD has no manager
    pub fn add_bd(&self, req: &PromoteRequest) -> AdminResult<Player> {
        let req = PromoteRequest {
            managed_by_uuid: None,
            ..req.clone()
        };
        self.store.with_transaction(|tx| promote(tx, &req, Role::Bd))
    }

    pub fn update_bd(&self, uuid: &str, update: &MemberUpdate) -> AdminResult<Player> {
        let update = MemberUpdate {
            managed_by_uuid: None,
            ..update.clone()
        };
        self.store
            .with_transaction(|tx| update_member(tx, uuid, Role::Bd, "BD member", &update))
    }

    /// Unassigns the BD's KOLs, then demotes the BD
    pub fn remove_bd(&self, uuid: &str) -> AdminResult<()> {
        self.store.with_transaction(|tx| {
            let mut bd = require_member(tx, uuid, Role::Bd, "BD member")?;
            let released = tx.execute(
                "UPDATE players SET managed_by_uuid = NULL WHERE managed_by_uuid = ?1",
                [uuid],
            )?;
            demote(tx, &mut bd)?;
            log::info!("✅ Removed BD {} ({} KOLs released)", uuid, released);
            Ok(())
        })
    }
}
