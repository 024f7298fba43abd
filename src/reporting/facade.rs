//! Reporting facade: the two operations admin handlers call into
//!
//! - `get_downstream_volume`: resolve a manager's tree, sum its volume
//! - `get_top_performer`: best manager in a role cohort, by volume or referrals
//!
//! Cohort-wide work goes through one `ReferralIndex` snapshot rather than one
//! storage walk per manager.

use crate::error::{AdminError, AdminResult};
use crate::gateway::{AmountColumn, PersistenceGateway, TransactionFilter};
use crate::model::{Player, PlayerId, Role, TxMethod};
use crate::referral::{ReferralIndex, ReferralResolver, VolumeAggregator};
use rust_decimal::Decimal;
use serde::Serialize;
use std::cmp::Ordering;
use std::str::FromStr;
use std::sync::Arc;

/// What "top" means for `get_top_performer`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformerMetric {
    Volume,
    Referrals,
}

impl FromStr for PerformerMetric {
    type Err = AdminError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "volume" => Ok(PerformerMetric::Volume),
            "referrals" => Ok(PerformerMetric::Referrals),
            other => Err(AdminError::InvalidFilter(format!("unknown metric '{}'", other))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopPerformer {
    pub id: PlayerId,
    pub username: Option<String>,
    pub metric_value: Decimal,
}

/// Downstream volume of one manager
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagerVolume {
    pub id: PlayerId,
    pub username: Option<String>,
    pub downstream_size: usize,
    pub volume: Decimal,
}

/// MINING rows, any status: what the dashboards call "volume"
pub fn mining_volume_filter() -> TransactionFilter {
    TransactionFilter::method(TxMethod::Mining)
}

/// Higher value wins; on equal values the lexicographically smaller id wins
fn beats(value: Decimal, id: &str, best: &Option<TopPerformer>) -> bool {
    match best {
        None => true,
        Some(current) => match value.cmp(&current.metric_value) {
            Ordering::Greater => true,
            Ordering::Equal => id < current.id.as_str(),
            Ordering::Less => false,
        },
    }
}

pub struct ReportingFacade {
    gateway: Arc<dyn PersistenceGateway>,
    resolver: ReferralResolver,
    aggregator: VolumeAggregator,
}

impl ReportingFacade {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self {
            resolver: ReferralResolver::new(gateway.clone()),
            aggregator: VolumeAggregator::new(gateway.clone()),
            gateway,
        }
    }

    pub fn resolver(&self) -> &ReferralResolver {
        &self.resolver
    }

    pub fn aggregator(&self) -> &VolumeAggregator {
        &self.aggregator
    }

    /// SOL volume of everything downstream of `root_id` matching `filter`
    pub async fn get_downstream_volume(
        &self,
        root_id: &str,
        filter: &TransactionFilter,
    ) -> AdminResult<Decimal> {
        self.get_downstream_volume_in(root_id, filter, AmountColumn::Sol).await
    }

    pub async fn get_downstream_volume_in(
        &self,
        root_id: &str,
        filter: &TransactionFilter,
        column: AmountColumn,
    ) -> AdminResult<Decimal> {
        let downstream = self.resolver.resolve_descendants(root_id).await?;
        self.aggregator.aggregate(&downstream, filter, column).await
    }

    /// Downstream SOL volume for each of `managers`, in the given order
    ///
    /// Trees come from a single edge snapshot.
    pub async fn manager_volumes(
        &self,
        managers: &[Player],
        filter: &TransactionFilter,
    ) -> AdminResult<Vec<ManagerVolume>> {
        if managers.is_empty() {
            return Ok(Vec::new());
        }

        let index = ReferralIndex::load(&*self.gateway).await?;

        let mut out = Vec::with_capacity(managers.len());
        for manager in managers {
            let downstream = index.descendants(&manager.uuid);
            let volume = self
                .aggregator
                .aggregate(&downstream, filter, AmountColumn::Sol)
                .await?;
            out.push(ManagerVolume {
                id: manager.uuid.clone(),
                username: manager.username.clone(),
                downstream_size: downstream.len(),
                volume,
            });
        }
        Ok(out)
    }

    /// Downstream SOL volume for every player holding `role`
    pub async fn cohort_volumes(
        &self,
        role: Role,
        filter: &TransactionFilter,
    ) -> AdminResult<Vec<ManagerVolume>> {
        let cohort = self.gateway.find_players_by_role(role).await?;
        self.manager_volumes(&cohort, filter).await
    }

    /// Best member of the `role` cohort, or `None` when nobody qualifies
    ///
    /// By volume, members with an empty downstream are not candidates. By
    /// referrals, the stored `all_referred` counter is used as is. Ties go to
    /// the smallest id.
    pub async fn get_top_performer(
        &self,
        role: Role,
        metric: PerformerMetric,
    ) -> AdminResult<Option<TopPerformer>> {
        let mut best: Option<TopPerformer> = None;

        match metric {
            PerformerMetric::Volume => {
                for mv in self.cohort_volumes(role, &mining_volume_filter()).await? {
                    if mv.downstream_size == 0 {
                        continue;
                    }
                    if beats(mv.volume, &mv.id, &best) {
                        best = Some(TopPerformer {
                            id: mv.id,
                            username: mv.username,
                            metric_value: mv.volume,
                        });
                    }
                }
            }
            PerformerMetric::Referrals => {
                for player in self.gateway.find_players_by_role(role).await? {
                    let value = Decimal::from(player.all_referred);
                    if beats(value, &player.uuid, &best) {
                        best = Some(TopPerformer {
                            id: player.uuid,
                            username: player.username,
                            metric_value: value,
                        });
                    }
                }
            }
        }

        log::debug!("🏆 Top {} by {:?}: {:?}", role, metric, best.as_ref().map(|b| &b.id));
        Ok(best)
    }
}
