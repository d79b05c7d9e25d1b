//! Storage service value wiring all components together.

use std::sync::Arc;

use research_types::{Hypothesis, SessionId};
use tracing::debug;

use crate::config::StorageConfig;
use crate::critique::{CritiqueLedger, NoCritiques};
use crate::error::StoreResult;
use crate::index::{Index, IndexCache, IndexEntry, IndexFilter, IndexSummary};
use crate::layout::StorageLayout;
use crate::locks::SessionLocks;
use crate::mutation::MutationGateway;
use crate::query::QueryEngine;
use crate::record::{RecordStore, SessionHypothesisFile};

/// Hypothesis storage rooted at one base directory.
///
/// Cheap to clone; clones share configuration and, when enabled, session locks.
#[derive(Clone)]
pub struct HypothesisStorage {
    config: Arc<StorageConfig>,
    records: RecordStore,
    index: IndexCache,
    queries: QueryEngine,
    mutations: MutationGateway,
}

impl HypothesisStorage {
    pub fn new(config: StorageConfig) -> Self {
        Self::with_critique_ledger(config, Arc::new(NoCritiques))
    }

    pub fn with_critique_ledger(config: StorageConfig, critiques: Arc<dyn CritiqueLedger>) -> Self {
        let layout = StorageLayout::new(config.base_dir.clone());
        let records = RecordStore::new(layout, config.atomic_writes);
        let index = IndexCache::new(
            records.clone(),
            config.index_failure_policy,
            critiques,
            config.atomic_writes,
        );
        let queries = QueryEngine::new(records.clone(), index.clone());
        let locks = config.serialize_session_writes.then(SessionLocks::new);
        let mutations = MutationGateway::new(
            records.clone(),
            index.clone(),
            config.auto_rebuild_index,
            locks,
        );

        debug!(
            base_dir = %config.base_dir.display(),
            auto_rebuild_index = config.auto_rebuild_index,
            policy = ?config.index_failure_policy,
            "Hypothesis storage ready"
        );

        Self {
            config: Arc::new(config),
            records,
            index,
            queries,
            mutations,
        }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    pub fn layout(&self) -> &StorageLayout {
        self.records.layout()
    }

    pub fn records(&self) -> &RecordStore {
        &self.records
    }

    pub fn index(&self) -> &IndexCache {
        &self.index
    }

    pub fn queries(&self) -> &QueryEngine {
        &self.queries
    }

    pub fn mutations(&self) -> &MutationGateway {
        &self.mutations
    }

    // ── Record store ────────────────────────────────────────────────────

    pub async fn load_session_hypotheses(&self, session: &str) -> StoreResult<Vec<Hypothesis>> {
        let session = SessionId::new(session)?;
        self.records.load_session_hypotheses(&session).await
    }

    pub async fn load_session_file(&self, session: &str) -> StoreResult<Option<SessionHypothesisFile>> {
        let session = SessionId::new(session)?;
        self.records.load_session_file(&session).await
    }

    pub async fn save_session_hypotheses(
        &self,
        session: &str,
        hypotheses: Vec<Hypothesis>,
    ) -> StoreResult<SessionHypothesisFile> {
        let session = SessionId::new(session)?;
        self.records.save_session_hypotheses(&session, hypotheses).await
    }

    // ── Index ───────────────────────────────────────────────────────────

    pub async fn rebuild_index(&self) -> StoreResult<Index> {
        self.index.rebuild_index().await
    }

    pub async fn load_index(&self) -> StoreResult<Index> {
        self.index.load_index().await
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub async fn get_hypothesis_by_id(&self, id: &str) -> StoreResult<Option<Hypothesis>> {
        self.queries.get_hypothesis_by_id(id).await
    }

    pub async fn get_active_hypotheses(&self) -> StoreResult<Vec<Hypothesis>> {
        self.queries.get_active_hypotheses().await
    }

    pub async fn search_hypotheses(&self, query: &str) -> StoreResult<Vec<Hypothesis>> {
        self.queries.search_hypotheses(query).await
    }

    pub async fn get_all_hypotheses(&self) -> StoreResult<Vec<Hypothesis>> {
        self.queries.get_all_hypotheses().await
    }

    pub async fn list_sessions(&self) -> StoreResult<Vec<SessionId>> {
        self.queries.list_sessions().await
    }

    pub async fn filter_index(&self, filter: &IndexFilter) -> StoreResult<Vec<IndexEntry>> {
        self.queries.filter_index(filter).await
    }

    pub async fn index_summary(&self) -> StoreResult<IndexSummary> {
        self.queries.index_summary().await
    }

    // ── Mutations ───────────────────────────────────────────────────────

    pub async fn save_hypothesis(&self, record: Hypothesis) -> StoreResult<Hypothesis> {
        self.mutations.save_hypothesis(record).await
    }

    pub async fn delete_hypothesis(&self, id: &str) -> StoreResult<bool> {
        self.mutations.delete_hypothesis(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;

    #[tokio::test]
    async fn invalid_session_names_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let storage = HypothesisStorage::new(StorageConfig::new(dir.path()));

        for bad in ["", "../escape", "-lead", "a/b"] {
            let err = storage.load_session_hypotheses(bad).await.unwrap_err();
            assert!(matches!(err, StoreError::InvalidInput(_)), "{bad:?}");
        }
        assert!(!storage.layout().research_dir().exists());
    }

    #[tokio::test]
    async fn components_share_the_layout() {
        let dir = tempfile::tempdir().unwrap();
        let storage = HypothesisStorage::new(
            StorageConfig::new(dir.path()).with_serialized_session_writes(true),
        );
        assert_eq!(storage.layout().base_dir(), dir.path());
        assert!(storage.config().serialize_session_writes);
        assert!(storage.mutations().auto_rebuild_index());
    }
}
