//! Write operations.
//!
//! Each mutation is a read-modify-write of one session file. Unless
//! [`SessionLocks`] are configured, two concurrent mutations of the same
//! session race and the last write wins.

use chrono::Utc;
use research_types::{Hypothesis, HypothesisId, SessionId};
use tokio::sync::OwnedMutexGuard;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::index::IndexCache;
use crate::locks::SessionLocks;
use crate::record::RecordStore;

#[derive(Clone)]
pub struct MutationGateway {
    records: RecordStore,
    index: IndexCache,
    auto_rebuild_index: bool,
    locks: Option<SessionLocks>,
}

impl MutationGateway {
    pub fn new(
        records: RecordStore,
        index: IndexCache,
        auto_rebuild_index: bool,
        locks: Option<SessionLocks>,
    ) -> Self {
        Self {
            records,
            index,
            auto_rebuild_index,
            locks,
        }
    }

    pub fn auto_rebuild_index(&self) -> bool {
        self.auto_rebuild_index
    }

    /// Insert or replace a hypothesis in its owning session.
    ///
    /// An existing record with the same id is replaced in place and keeps its
    /// stored `createdAt`. A new record is appended with the `createdAt` it
    /// carries. `updatedAt` is set to now, but never earlier than `createdAt`.
    /// Returns the record as stored.
    pub async fn save_hypothesis(&self, mut record: Hypothesis) -> StoreResult<Hypothesis> {
        if !record.session_matches_id() {
            return Err(StoreError::InvalidInput(format!(
                "hypothesis {} belongs to session {}, not {}",
                record.id,
                record.id.session_id(),
                record.session_id
            )));
        }

        let session = record.session_id.clone();
        let guard = self.lock(&session).await;

        let mut hypotheses = self.records.load_session_hypotheses(&session).await?;
        let now = Utc::now();

        match hypotheses.iter_mut().find(|h| h.id == record.id) {
            Some(slot) => {
                record.created_at = slot.created_at;
                record.updated_at = now.max(record.created_at);
                *slot = record.clone();
                debug!(id = %record.id, "Replacing hypothesis in place");
            }
            None => {
                record.updated_at = now.max(record.created_at);
                hypotheses.push(record.clone());
                debug!(id = %record.id, "Appending new hypothesis");
            }
        }

        self.records.save_session_hypotheses(&session, hypotheses).await?;
        drop(guard);

        self.after_mutation().await?;
        Ok(record)
    }

    /// Remove a hypothesis. Returns `false` for a malformed id or one not
    /// present in its session at the time of the call, so repeated deletes
    /// are not errors.
    pub async fn delete_hypothesis(&self, id: &str) -> StoreResult<bool> {
        let Ok(id) = HypothesisId::parse(id) else {
            debug!(id, "Malformed hypothesis id, nothing to delete");
            return Ok(false);
        };

        let session = id.session_id();
        let guard = self.lock(&session).await;

        // Always a fresh read: a record seen earlier may be gone by now.
        let mut hypotheses = self.records.load_session_hypotheses(&session).await?;
        let Some(position) = hypotheses.iter().position(|h| h.id == id) else {
            debug!(id = %id, "Hypothesis already absent");
            return Ok(false);
        };

        hypotheses.remove(position);
        self.records.save_session_hypotheses(&session, hypotheses).await?;
        drop(guard);

        info!(id = %id, session = %session, "Deleted hypothesis");
        self.after_mutation().await?;
        Ok(true)
    }

    async fn lock(&self, session: &SessionId) -> Option<OwnedMutexGuard<()>> {
        match &self.locks {
            Some(locks) => Some(locks.acquire(session).await),
            None => None,
        }
    }

    async fn after_mutation(&self) -> StoreResult<()> {
        if self.auto_rebuild_index {
            self.index.rebuild_index().await?;
        }
        Ok(())
    }
}
