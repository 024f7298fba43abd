//! In-memory referral adjacency for batch resolution
//!
//! Cohort reports need the downstream set of every KOL or BD. Instead of one
//! tree walk against storage per manager, load every edge once and walk the
//! trees here. Results match `ReferralResolver` for the same snapshot.

use crate::error::AdminResult;
use crate::gateway::PersistenceGateway;
use crate::model::{PlayerId, ReferralEdge};
use std::collections::{HashMap, HashSet};

/// Referrer id -> directly referred ids
#[derive(Debug, Default, Clone)]
pub struct ReferralIndex {
    children: HashMap<PlayerId, Vec<PlayerId>>,
}

impl ReferralIndex {
    pub fn from_edges(edges: impl IntoIterator<Item = ReferralEdge>) -> Self {
        let mut children: HashMap<PlayerId, Vec<PlayerId>> = HashMap::new();
        for edge in edges {
            children.entry(edge.referrer).or_default().push(edge.referred);
        }
        Self { children }
    }

    /// Snapshot every edge in the store
    pub async fn load(gateway: &dyn PersistenceGateway) -> AdminResult<Self> {
        let edges = gateway.load_referral_edges().await?;
        let index = Self::from_edges(edges);
        log::debug!("🌳 Referral index built: {} referrers", index.children.len());
        Ok(index)
    }

    pub fn direct_referrals(&self, id: &str) -> &[PlayerId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Transitive descendants of `root`, excluding `root`, cycle-safe
    pub fn descendants(&self, root: &str) -> HashSet<PlayerId> {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(root);

        let mut out = HashSet::new();
        let mut stack: Vec<&str> = vec![root];

        while let Some(current) = stack.pop() {
            for child in self.direct_referrals(current) {
                if visited.insert(child.as_str()) {
                    out.insert(child.clone());
                    stack.push(child.as_str());
                }
            }
        }

        out
    }

    /// Descendant sets for many roots, keyed by root
    pub fn descendants_of_all<'a>(
        &self,
        roots: impl IntoIterator<Item = &'a str>,
    ) -> HashMap<PlayerId, HashSet<PlayerId>> {
        roots
            .into_iter()
            .map(|root| (root.to_string(), self.descendants(root)))
            .collect()
    }
}
