//! Volume aggregation over a set of players

use crate::error::AdminResult;
use crate::gateway::{AmountColumn, PersistenceGateway, TransactionFilter};
use crate::model::PlayerId;
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::sync::Arc;

pub struct VolumeAggregator {
    gateway: Arc<dyn PersistenceGateway>,
}

impl VolumeAggregator {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// Sum `column` over matching transactions of `ids`
    ///
    /// An empty id set is zero and never reaches storage. A store result of
    /// NULL (no rows, or only NULL values) is also zero.
    pub async fn aggregate(
        &self,
        ids: &HashSet<PlayerId>,
        filter: &TransactionFilter,
        column: AmountColumn,
    ) -> AdminResult<Decimal> {
        if ids.is_empty() {
            return Ok(Decimal::ZERO);
        }

        let total = self
            .gateway
            .sum_transaction_amount(ids, filter, column)
            .await?
            .unwrap_or(Decimal::ZERO);

        Ok(total)
    }
}
