//! Source of `unresolvedCritiqueCount` for index entries.

use std::collections::HashMap;

use async_trait::async_trait;
use research_types::HypothesisId;

use crate::error::StoreResult;

/// Counts critiques still open against a hypothesis.
#[async_trait]
pub trait CritiqueLedger: Send + Sync {
    async fn unresolved_count(&self, id: &HypothesisId) -> StoreResult<u32>;
}

/// Ledger used when no critique subsystem is attached. Always zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCritiques;

#[async_trait]
impl CritiqueLedger for NoCritiques {
    async fn unresolved_count(&self, _id: &HypothesisId) -> StoreResult<u32> {
        Ok(0)
    }
}

/// Fixed counts keyed by hypothesis id. Ids not present count zero.
#[derive(Debug, Clone, Default)]
pub struct StaticCritiques {
    counts: HashMap<HypothesisId, u32>,
}

impl StaticCritiques {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_count(mut self, id: HypothesisId, count: u32) -> Self {
        self.counts.insert(id, count);
        self
    }
}

#[async_trait]
impl CritiqueLedger for StaticCritiques {
    async fn unresolved_count(&self, id: &HypothesisId) -> StoreResult<u32> {
        Ok(self.counts.get(id).copied().unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_critiques_is_zero() {
        let id = HypothesisId::parse("H-S-1").unwrap();
        assert_eq!(NoCritiques.unresolved_count(&id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn static_counts() {
        let a = HypothesisId::parse("H-S-1").unwrap();
        let b = HypothesisId::parse("H-S-2").unwrap();
        let ledger = StaticCritiques::new().with_count(a.clone(), 3);
        assert_eq!(ledger.unresolved_count(&a).await.unwrap(), 3);
        assert_eq!(ledger.unresolved_count(&b).await.unwrap(), 0);
    }
}
