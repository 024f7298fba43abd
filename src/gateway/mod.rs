//! Persistence gateway: the only path from the reporting core to storage
//!
//! ```text
//! ReportingFacade ──► ReferralResolver ──┐
//!        │                               ├──► dyn PersistenceGateway ──► SQLite
//!        └─────────► VolumeAggregator ───┘
//! ```
//!
//! The core holds an `Arc<dyn PersistenceGateway>` injected at construction.

pub mod filter;
pub mod rows;
pub mod schema;
pub mod sqlite;

pub use filter::{AmountColumn, TransactionFilter};
pub use schema::{apply_embedded_schema, run_schema_migrations};
pub use sqlite::SqliteGateway;

use crate::error::AdminResult;
use crate::model::{Player, PlayerId, ReferralEdge, Role};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashSet;

/// Read operations the reporting core needs from storage
#[async_trait]
pub trait PersistenceGateway: Send + Sync {
    /// Players whose referrer is `id`. Unknown ids yield an empty list.
    async fn find_direct_referrals(&self, id: &str) -> AdminResult<Vec<PlayerId>>;

    /// Direct referrals of every id in `ids`, as edges
    ///
    /// Default implementation issues one `find_direct_referrals` per id.
    async fn find_direct_referrals_batch(&self, ids: &[PlayerId]) -> AdminResult<Vec<ReferralEdge>> {
        let mut edges = Vec::new();
        for id in ids {
            for referred in self.find_direct_referrals(id).await? {
                edges.push(ReferralEdge {
                    referrer: id.clone(),
                    referred,
                });
            }
        }
        Ok(edges)
    }

    /// Every referral edge in the store, in one pass
    async fn load_referral_edges(&self) -> AdminResult<Vec<ReferralEdge>>;

    /// Sum of `column` over rows owned by `ids` that match `filter`
    ///
    /// Returns `None` when no row contributes a non-null value.
    async fn sum_transaction_amount(
        &self,
        ids: &HashSet<PlayerId>,
        filter: &TransactionFilter,
        column: AmountColumn,
    ) -> AdminResult<Option<Decimal>>;

    /// Every player holding `role`, ordered by id
    async fn find_players_by_role(&self, role: Role) -> AdminResult<Vec<Player>>;
}
