//! Derived cross-session index.
//!
//! The index is a cache over the session files. It is never authoritative:
//! deleting `hypothesis-index.json` and calling [`IndexCache::rebuild_index`]
//! reproduces equivalent content. It does not track staleness; callers that
//! need a fresh view rebuild explicitly or run with `auto_rebuild_index`.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use research_types::{
    Hypothesis, HypothesisCategory, HypothesisConfidence, HypothesisId, HypothesisState, SessionId,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::IndexFailurePolicy;
use crate::critique::CritiqueLedger;
use crate::error::{StoreError, StoreResult};
use crate::fsio::{read_json, write_json};
use crate::record::RecordStore;

pub const INDEX_VERSION: &str = "1.0.0";

// ── Index Entry ─────────────────────────────────────────────────────────

/// Summary of one hypothesis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexEntry {
    pub id: HypothesisId,
    pub session_id: SessionId,
    pub category: HypothesisCategory,
    pub confidence: HypothesisConfidence,
    pub state: HypothesisState,
    pub has_mechanism: bool,
    pub unresolved_critique_count: u32,
    pub last_updated: DateTime<Utc>,
}

impl IndexEntry {
    pub fn from_hypothesis(hypothesis: &Hypothesis, unresolved_critique_count: u32) -> Self {
        Self {
            id: hypothesis.id.clone(),
            session_id: hypothesis.session_id.clone(),
            category: hypothesis.category,
            confidence: hypothesis.confidence,
            state: hypothesis.state,
            has_mechanism: hypothesis.has_mechanism(),
            unresolved_critique_count,
            last_updated: hypothesis.updated_at,
        }
    }
}

// ── Index ───────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    pub version: String,
    pub built_at: DateTime<Utc>,
    pub entries: Vec<IndexEntry>,
}

impl Index {
    pub fn new(entries: Vec<IndexEntry>) -> Self {
        Self {
            version: INDEX_VERSION.to_string(),
            built_at: Utc::now(),
            entries,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn filter<'a>(&'a self, filter: &'a IndexFilter) -> impl Iterator<Item = &'a IndexEntry> + 'a {
        self.entries.iter().filter(move |entry| filter.matches(entry))
    }

    pub fn summary(&self) -> IndexSummary {
        let mut summary = IndexSummary {
            built_at: self.built_at,
            ..IndexSummary::default()
        };
        for entry in &self.entries {
            summary.total += 1;
            *summary.by_state.entry(entry.state).or_default() += 1;
            *summary.by_category.entry(entry.category).or_default() += 1;
            *summary.by_confidence.entry(entry.confidence).or_default() += 1;
            *summary.by_session.entry(entry.session_id.clone()).or_default() += 1;
            if entry.has_mechanism {
                summary.with_mechanism += 1;
            }
            summary.unresolved_critiques += u64::from(entry.unresolved_critique_count);
        }
        summary
    }
}

/// Conjunctive filter over index entries. Unset fields match everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexFilter {
    pub session: Option<SessionId>,
    pub state: Option<HypothesisState>,
    pub category: Option<HypothesisCategory>,
    pub confidence: Option<HypothesisConfidence>,
    pub has_mechanism: Option<bool>,
}

impl IndexFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(mut self, session: SessionId) -> Self {
        self.session = Some(session);
        self
    }

    pub fn state(mut self, state: HypothesisState) -> Self {
        self.state = Some(state);
        self
    }

    pub fn category(mut self, category: HypothesisCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn confidence(mut self, confidence: HypothesisConfidence) -> Self {
        self.confidence = Some(confidence);
        self
    }

    pub fn has_mechanism(mut self, has_mechanism: bool) -> Self {
        self.has_mechanism = Some(has_mechanism);
        self
    }

    pub fn matches(&self, entry: &IndexEntry) -> bool {
        self.session.as_ref().map_or(true, |s| *s == entry.session_id)
            && self.state.map_or(true, |s| s == entry.state)
            && self.category.map_or(true, |c| c == entry.category)
            && self.confidence.map_or(true, |c| c == entry.confidence)
            && self.has_mechanism.map_or(true, |m| m == entry.has_mechanism)
    }
}

/// Aggregate counts over an index.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSummary {
    pub built_at: DateTime<Utc>,
    pub total: usize,
    pub with_mechanism: usize,
    pub unresolved_critiques: u64,
    pub by_state: BTreeMap<HypothesisState, usize>,
    pub by_category: BTreeMap<HypothesisCategory, usize>,
    pub by_confidence: BTreeMap<HypothesisConfidence, usize>,
    pub by_session: BTreeMap<SessionId, usize>,
}

// ── Index Cache ─────────────────────────────────────────────────────────

/// Builds, persists and loads the index.
#[derive(Clone)]
pub struct IndexCache {
    records: RecordStore,
    policy: IndexFailurePolicy,
    critiques: Arc<dyn CritiqueLedger>,
    atomic_writes: bool,
}

impl IndexCache {
    pub fn new(
        records: RecordStore,
        policy: IndexFailurePolicy,
        critiques: Arc<dyn CritiqueLedger>,
        atomic_writes: bool,
    ) -> Self {
        Self {
            records,
            policy,
            critiques,
            atomic_writes,
        }
    }

    pub fn policy(&self) -> IndexFailurePolicy {
        self.policy
    }

    /// Derive the index from every session file, persist it, and return it.
    ///
    /// Under [`IndexFailurePolicy::FailFast`] the first unreadable session
    /// aborts the rebuild and the persisted index is left as it was.
    pub async fn rebuild_index(&self) -> StoreResult<Index> {
        let sessions = self.records.list_sessions().await?;
        let mut entries = Vec::new();
        let mut skipped = 0usize;

        for session in &sessions {
            let hypotheses = match self.records.load_session_hypotheses(session).await {
                Ok(hypotheses) => hypotheses,
                Err(err) => match self.policy {
                    IndexFailurePolicy::FailFast => return Err(err),
                    IndexFailurePolicy::SkipCorrupt => {
                        warn!(session = %session, error = %err, "Skipping unreadable session during index rebuild");
                        skipped += 1;
                        continue;
                    }
                },
            };

            for hypothesis in &hypotheses {
                let critiques = self.critiques.unresolved_count(&hypothesis.id).await?;
                entries.push(IndexEntry::from_hypothesis(hypothesis, critiques));
            }
        }

        let index = Index::new(entries);
        write_json(&self.records.layout().index_file(), &index, self.atomic_writes).await?;
        info!(
            sessions = sessions.len(),
            skipped,
            entries = index.len(),
            "Rebuilt hypothesis index"
        );
        Ok(index)
    }

    /// The persisted index, rebuilt first if it is missing.
    ///
    /// A persisted index that does not decode, or carries another version, is
    /// discarded and rebuilt.
    pub async fn load_index(&self) -> StoreResult<Index> {
        let path = self.records.layout().index_file();
        match read_json::<Index>(&path).await {
            Ok(Some(index)) if index.version == INDEX_VERSION => {
                debug!(entries = index.len(), "Loaded persisted hypothesis index");
                Ok(index)
            }
            Ok(Some(index)) => {
                warn!(found = %index.version, expected = INDEX_VERSION, "Index version mismatch, rebuilding");
                self.rebuild_index().await
            }
            Ok(None) => {
                debug!("No persisted hypothesis index, rebuilding");
                self.rebuild_index().await
            }
            Err(err @ StoreError::Decode { .. }) => {
                warn!(error = %err, "Discarding undecodable hypothesis index");
                self.rebuild_index().await
            }
            Err(err) => Err(err),
        }
    }

    pub fn index_exists(&self) -> bool {
        self.records.layout().index_file().exists()
    }
}
