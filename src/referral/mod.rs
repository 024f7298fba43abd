//! Referral tree resolution and downstream volume aggregation
//!
//! ```text
//! root id ──► ReferralResolver (level-by-level, storage)  ──┐
//!         └─► ReferralIndex (one edge snapshot, in memory) ─┴─► id set ──► VolumeAggregator ──► Decimal
//! ```

pub mod aggregator;
pub mod index;
pub mod resolver;

pub use aggregator::VolumeAggregator;
pub use index::ReferralIndex;
pub use resolver::ReferralResolver;
