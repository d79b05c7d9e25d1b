//! Read operations.

use std::collections::HashMap;

use research_types::{Hypothesis, HypothesisId, HypothesisState, SessionId};
use tracing::debug;

use crate::error::StoreResult;
use crate::index::{IndexCache, IndexEntry, IndexFilter, IndexSummary};
use crate::record::RecordStore;

#[derive(Clone)]
pub struct QueryEngine {
    records: RecordStore,
    index: IndexCache,
}

impl QueryEngine {
    pub fn new(records: RecordStore, index: IndexCache) -> Self {
        Self { records, index }
    }

    /// Point lookup. A malformed id is `None` and touches no files; otherwise
    /// only the owning session file is read.
    pub async fn get_hypothesis_by_id(&self, id: &str) -> StoreResult<Option<Hypothesis>> {
        let Ok(id) = HypothesisId::parse(id) else {
            debug!(id, "Malformed hypothesis id, treating as not found");
            return Ok(None);
        };

        let hypotheses = self.records.load_session_hypotheses(&id.session_id()).await?;
        Ok(hypotheses.into_iter().find(|h| h.id == id))
    }

    /// Hypotheses whose state is `active`, in index order.
    ///
    /// Uses the persisted index to pick candidates, then checks the stored
    /// record. Entries whose record has since disappeared or left `active`
    /// are dropped.
    pub async fn get_active_hypotheses(&self) -> StoreResult<Vec<Hypothesis>> {
        let index = self.index.load_index().await?;
        let filter = IndexFilter::new().state(HypothesisState::Active);
        let mut active = self.resolve(index.filter(&filter)).await?;
        active.retain(|h| {
            let current = h.state == HypothesisState::Active;
            if !current {
                debug!(id = %h.id, state = %h.state, "Indexed as active but stored state differs");
            }
            current
        });
        Ok(active)
    }

    /// Case-insensitive substring search over statement, mechanism, notes,
    /// tags and id. Linear scan of every session. A blank query matches nothing.
    pub async fn search_hypotheses(&self, query: &str) -> StoreResult<Vec<Hypothesis>> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits = self.get_all_hypotheses().await?;
        hits.retain(|h| h.matches_lowercase(&needle));
        debug!(query, hits = hits.len(), "Searched hypotheses");
        Ok(hits)
    }

    /// Every hypothesis, session by session in enumeration order.
    pub async fn get_all_hypotheses(&self) -> StoreResult<Vec<Hypothesis>> {
        let mut all = Vec::new();
        for session in self.records.list_sessions().await? {
            all.extend(self.records.load_session_hypotheses(&session).await?);
        }
        Ok(all)
    }

    pub async fn list_sessions(&self) -> StoreResult<Vec<SessionId>> {
        self.records.list_sessions().await
    }

    /// Index entries matching `filter`, from the loaded (or lazily rebuilt) index.
    pub async fn filter_index(&self, filter: &IndexFilter) -> StoreResult<Vec<IndexEntry>> {
        let index = self.index.load_index().await?;
        Ok(index.filter(filter).cloned().collect())
    }

    pub async fn index_summary(&self) -> StoreResult<IndexSummary> {
        Ok(self.index.load_index().await?.summary())
    }

    /// Resolve index entries to full records, reading each session at most once.
    async fn resolve<'a>(
        &self,
        entries: impl Iterator<Item = &'a IndexEntry>,
    ) -> StoreResult<Vec<Hypothesis>> {
        let mut sessions: HashMap<SessionId, Vec<Hypothesis>> = HashMap::new();
        let mut resolved = Vec::new();

        for entry in entries {
            if !sessions.contains_key(&entry.session_id) {
                let loaded = self.records.load_session_hypotheses(&entry.session_id).await?;
                sessions.insert(entry.session_id.clone(), loaded);
            }
            let found = sessions
                .get(&entry.session_id)
                .and_then(|list| list.iter().find(|h| h.id == entry.id));
            match found {
                Some(h) => resolved.push(h.clone()),
                None => debug!(id = %entry.id, "Indexed hypothesis no longer stored"),
            }
        }
        Ok(resolved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::IndexFailurePolicy;
    use crate::critique::NoCritiques;
    use crate::layout::StorageLayout;
    use research_types::{HypothesisCategory, HypothesisConfidence};
    use std::sync::Arc;

    fn engine(dir: &tempfile::TempDir) -> (RecordStore, IndexCache, QueryEngine) {
        let records = RecordStore::new(StorageLayout::new(dir.path()), false);
        let index = IndexCache::new(
            records.clone(),
            IndexFailurePolicy::FailFast,
            Arc::new(NoCritiques),
            false,
        );
        let engine = QueryEngine::new(records.clone(), index.clone());
        (records, index, engine)
    }

    fn hyp(id: &str, statement: &str) -> Hypothesis {
        Hypothesis::new(
            HypothesisId::parse(id).unwrap(),
            statement,
            HypothesisCategory::Phenomenological,
            HypothesisConfidence::High,
        )
    }

    async fn seed(records: &RecordStore) {
        records
            .save_session_hypotheses(
                &SessionId::new("ALPHA").unwrap(),
                vec![
                    hyp("H-ALPHA-001", "Calcium waves precede contraction")
                        .with_state(HypothesisState::Active),
                    hyp("H-ALPHA-002", "Temperature has no effect")
                        .with_tags(["Thermal"])
                        .with_notes("check incubator logs"),
                ],
            )
            .await
            .unwrap();
        records
            .save_session_hypotheses(
                &SessionId::new("BETA").unwrap(),
                vec![hyp("H-BETA-001", "Noise is instrumental")
                    .with_mechanism("Amplifier drift")
                    .with_state(HypothesisState::Active)],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn malformed_id_is_none_without_io() {
        let dir = tempfile::tempdir().unwrap();
        let (records, _, engine) = engine(&dir);

        // An unreadable session file would fail any lookup that reached disk.
        let path = records.layout().session_file(&SessionId::new("X").unwrap());
        tokio::fs::create_dir_all(path.parent().unwrap()).await.unwrap();
        tokio::fs::write(&path, b"garbage").await.unwrap();

        for bad in ["", "X", "H-X", "H-X-", "H-X-abc", "h-x-001", "H-X-001 "] {
            assert!(engine.get_hypothesis_by_id(bad).await.unwrap().is_none());
        }
        assert!(engine.get_hypothesis_by_id("H-X-001").await.is_err());
    }

    #[tokio::test]
    async fn lookup_by_id() {
        let dir = tempfile::tempdir().unwrap();
        let (records, _, engine) = engine(&dir);
        seed(&records).await;

        let h = engine.get_hypothesis_by_id("H-BETA-001").await.unwrap().unwrap();
        assert_eq!(h.statement, "Noise is instrumental");
        assert!(engine.get_hypothesis_by_id("H-BETA-002").await.unwrap().is_none());
        assert!(engine.get_hypothesis_by_id("H-GAMMA-001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn active_hypotheses_come_from_index() {
        let dir = tempfile::tempdir().unwrap();
        let (records, index, engine) = engine(&dir);
        seed(&records).await;

        let active: Vec<String> = engine
            .get_active_hypotheses()
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.id.to_string())
            .collect();
        assert_eq!(active, vec!["H-ALPHA-001", "H-BETA-001"]);
        assert!(index.index_exists());

        // Stale index entries for removed records are dropped.
        records
            .save_session_hypotheses(&SessionId::new("BETA").unwrap(), vec![])
            .await
            .unwrap();
        let active = engine.get_active_hypotheses().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id.as_str(), "H-ALPHA-001");
    }

    #[tokio::test]
    async fn stale_index_never_yields_inactive_records() {
        let dir = tempfile::tempdir().unwrap();
        let (records, index, engine) = engine(&dir);
        seed(&records).await;
        index.rebuild_index().await.unwrap();

        // Confirmed on disk while the index still lists it as active.
        let alpha = SessionId::new("ALPHA").unwrap();
        let mut list = records.load_session_hypotheses(&alpha).await.unwrap();
        list[0].state = HypothesisState::Confirmed;
        records.save_session_hypotheses(&alpha, list).await.unwrap();

        let stale = engine
            .filter_index(&IndexFilter::new().state(HypothesisState::Active))
            .await
            .unwrap();
        assert_eq!(stale.len(), 2);

        let active = engine.get_active_hypotheses().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id.as_str(), "H-BETA-001");
        assert!(active.iter().all(|h| h.state == HypothesisState::Active));
    }

    #[tokio::test]
    async fn search_matches_fields_case_insensitively() {
        let dir = tempfile::tempdir().unwrap();
        let (records, _, engine) = engine(&dir);
        seed(&records).await;

        let ids = |hits: Vec<Hypothesis>| -> Vec<String> {
            hits.into_iter().map(|h| h.id.to_string()).collect()
        };

        assert_eq!(ids(engine.search_hypotheses("CALCIUM").await.unwrap()), vec!["H-ALPHA-001"]);
        assert_eq!(ids(engine.search_hypotheses("thermal").await.unwrap()), vec!["H-ALPHA-002"]);
        assert_eq!(ids(engine.search_hypotheses("incubator").await.unwrap()), vec!["H-ALPHA-002"]);
        assert_eq!(ids(engine.search_hypotheses("drift").await.unwrap()), vec!["H-BETA-001"]);
        assert_eq!(ids(engine.search_hypotheses("h-beta").await.unwrap()), vec!["H-BETA-001"]);
        assert_eq!(engine.search_hypotheses("-001").await.unwrap().len(), 2);
        assert!(engine.search_hypotheses("dopamine").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn blank_search_matches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let (records, _, engine) = engine(&dir);
        seed(&records).await;

        assert!(engine.search_hypotheses("").await.unwrap().is_empty());
        assert!(engine.search_hypotheses("   ").await.unwrap().is_empty());
        assert!(engine.search_hypotheses("\t\n").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn all_hypotheses_in_session_order() {
        let dir = tempfile::tempdir().unwrap();
        let (records, _, engine) = engine(&dir);
        seed(&records).await;

        let ids: Vec<String> = engine
            .get_all_hypotheses()
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.id.to_string())
            .collect();
        assert_eq!(ids, vec!["H-ALPHA-001", "H-ALPHA-002", "H-BETA-001"]);

        let sessions: Vec<String> = engine
            .list_sessions()
            .await
            .unwrap()
            .into_iter()
            .map(String::from)
            .collect();
        assert_eq!(sessions, vec!["ALPHA", "BETA"]);
    }

    #[tokio::test]
    async fn filter_and_summary_through_engine() {
        let dir = tempfile::tempdir().unwrap();
        let (records, _, engine) = engine(&dir);
        seed(&records).await;

        let hits = engine
            .filter_index(&IndexFilter::new().session(SessionId::new("ALPHA").unwrap()))
            .await
            .unwrap();
        assert_eq!(hits.len(), 2);

        let summary = engine.index_summary().await.unwrap();
        assert_eq!(summary.total, 3);
        assert_eq!(summary.by_state.get(&HypothesisState::Active), Some(&2));
    }
}
