//! Referral tree resolver
//!
//! Walks "referred-by" edges downward from a root, one level per storage
//! round-trip, until a level discovers nothing new.
//!
//! The write path should keep the graph a forest, but nothing here relies on
//! it: a visited set (seeded with the root) stops revisits, so a corrupted
//! cycle terminates and every id is reported once.

use crate::error::AdminResult;
use crate::gateway::PersistenceGateway;
use crate::model::PlayerId;
use std::collections::HashSet;
use std::sync::Arc;

pub struct ReferralResolver {
    gateway: Arc<dyn PersistenceGateway>,
}

impl ReferralResolver {
    pub fn new(gateway: Arc<dyn PersistenceGateway>) -> Self {
        Self { gateway }
    }

    /// All players transitively referred by `root_id`, excluding the root
    ///
    /// An unknown root is not an error; it has no descendants.
    pub async fn resolve_descendants(&self, root_id: &str) -> AdminResult<HashSet<PlayerId>> {
        let mut visited: HashSet<PlayerId> = HashSet::new();
        visited.insert(root_id.to_string());

        let mut descendants = HashSet::new();
        let mut frontier = vec![root_id.to_string()];
        let mut depth = 0usize;

        while !frontier.is_empty() {
            let edges = self.gateway.find_direct_referrals_batch(&frontier).await?;

            let mut next = Vec::new();
            for edge in edges {
                if visited.insert(edge.referred.clone()) {
                    descendants.insert(edge.referred.clone());
                    next.push(edge.referred);
                }
            }

            depth += 1;
            frontier = next;
        }

        log::debug!(
            "🌳 Resolved {} descendants of {} ({} levels)",
            descendants.len(),
            root_id,
            depth
        );

        Ok(descendants)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use crate::testing::MemoryGateway;
    use std::sync::atomic::Ordering;

    fn ids(list: &[&str]) -> HashSet<PlayerId> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_leaf_has_no_descendants() {
        let gw = Arc::new(MemoryGateway::new());
        gw.add("leaf", Role::User, None);

        let resolver = ReferralResolver::new(gw);
        assert!(resolver.resolve_descendants("leaf").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_root_is_empty_not_error() {
        let resolver = ReferralResolver::new(Arc::new(MemoryGateway::new()));
        assert!(resolver.resolve_descendants("ghost").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_chain_resolves_every_level() {
        let gw = Arc::new(MemoryGateway::new());
        gw.add("A", Role::Kol, None);
        gw.add("B", Role::User, Some("A"));
        gw.add("C", Role::User, Some("B"));
        gw.add("D", Role::User, Some("C"));

        let resolver = ReferralResolver::new(gw);
        assert_eq!(resolver.resolve_descendants("A").await.unwrap(), ids(&["B", "C", "D"]));
        assert_eq!(resolver.resolve_descendants("C").await.unwrap(), ids(&["D"]));
    }

    #[tokio::test]
    async fn test_cycle_terminates_without_duplicates() {
        let gw = Arc::new(MemoryGateway::new());
        // A -> B -> C -> A, plus C -> D
        gw.add("A", Role::Kol, Some("C"));
        gw.add("B", Role::User, Some("A"));
        gw.add("C", Role::User, Some("B"));
        gw.add("D", Role::User, Some("C"));

        let resolver = ReferralResolver::new(gw);
        let result = resolver.resolve_descendants("A").await.unwrap();
        assert_eq!(result, ids(&["B", "C", "D"]));

        let from_b = resolver.resolve_descendants("B").await.unwrap();
        assert_eq!(from_b, ids(&["C", "A", "D"]));
    }

    #[tokio::test]
    async fn test_self_referral_is_excluded() {
        let gw = Arc::new(MemoryGateway::new());
        gw.add("A", Role::Kol, Some("A"));
        gw.add("B", Role::User, Some("A"));

        let resolver = ReferralResolver::new(gw);
        assert_eq!(resolver.resolve_descendants("A").await.unwrap(), ids(&["B"]));
    }

    #[tokio::test]
    async fn test_wide_tree_uses_one_lookup_per_node_with_default_batch() {
        let gw = Arc::new(MemoryGateway::new());
        gw.add("R", Role::Kol, None);
        gw.add("B", Role::User, Some("R"));
        gw.add("C", Role::User, Some("R"));
        gw.add("D", Role::User, Some("B"));

        let resolver = ReferralResolver::new(gw.clone());
        let result = resolver.resolve_descendants("R").await.unwrap();
        assert_eq!(result, ids(&["B", "C", "D"]));
        // R, then B and C, then D
        assert_eq!(gw.referral_lookups.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_storage_failure_propagates() {
        let gw = Arc::new(MemoryGateway::new());
        gw.fail_storage.store(true, Ordering::SeqCst);

        let resolver = ReferralResolver::new(gw);
        assert!(matches!(
            resolver.resolve_descendants("A").await,
            Err(crate::error::AdminError::Storage(_))
        ));
    }
}
