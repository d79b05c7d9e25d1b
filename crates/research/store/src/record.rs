//! Per-session record files.
//!
//! [`RecordStore`] is the only component that reads or writes
//! `<SESSION>-hypotheses.json`. Everything else goes through it.
//!
//! Writes replace the whole file. There is no per-record locking inside a
//! file, so two concurrent writers to the same session race and the last
//! one wins.

use std::collections::HashSet;
use std::io::ErrorKind;

use chrono::{DateTime, Duration, Utc};
use research_types::{Hypothesis, SessionId};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::fsio::{read_json, write_json};
use crate::layout::StorageLayout;

/// The persisted unit for one session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionHypothesisFile {
    pub session_id: SessionId,
    /// Set at the first write and never changed afterwards.
    pub created_at: DateTime<Utc>,
    /// Strictly advances on every write.
    pub updated_at: DateTime<Utc>,
    /// Insertion order, never re-sorted.
    pub hypotheses: Vec<Hypothesis>,
}

/// Reader and writer of session files.
#[derive(Debug, Clone)]
pub struct RecordStore {
    layout: StorageLayout,
    atomic_writes: bool,
}

impl RecordStore {
    pub fn new(layout: StorageLayout, atomic_writes: bool) -> Self {
        Self {
            layout,
            atomic_writes,
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    /// Load the whole session file, or `None` when the session has never been written.
    pub async fn load_session_file(
        &self,
        session: &SessionId,
    ) -> StoreResult<Option<SessionHypothesisFile>> {
        let path = self.layout.session_file(session);
        let Some(file) = read_json::<SessionHypothesisFile>(&path).await? else {
            return Ok(None);
        };

        if &file.session_id != session {
            return Err(StoreError::Corrupt {
                path,
                reason: format!(
                    "file declares session {} but is stored as session {session}",
                    file.session_id
                ),
            });
        }

        debug!(session = %session, hypotheses = file.hypotheses.len(), "Loaded session file");
        Ok(Some(file))
    }

    /// Hypotheses of one session in insertion order. Empty when no file exists.
    pub async fn load_session_hypotheses(&self, session: &SessionId) -> StoreResult<Vec<Hypothesis>> {
        Ok(self
            .load_session_file(session)
            .await?
            .map(|file| file.hypotheses)
            .unwrap_or_default())
    }

    /// Persist the full list for a session, replacing the file.
    ///
    /// Every record must belong to `session` and ids must be unique within
    /// the list, else `InvalidInput` and nothing is written. An existing file
    /// that cannot be decoded is not overwritten; the error is returned so
    /// the operator can recover it by hand.
    pub async fn save_session_hypotheses(
        &self,
        session: &SessionId,
        hypotheses: Vec<Hypothesis>,
    ) -> StoreResult<SessionHypothesisFile> {
        check_membership(session, &hypotheses)?;

        let previous = self.load_session_file(session).await?;
        let now = Utc::now();

        let (created_at, updated_at) = match previous {
            Some(prev) => (prev.created_at, advance(prev.updated_at, now)),
            None => (now, now),
        };

        let file = SessionHypothesisFile {
            session_id: session.clone(),
            created_at,
            updated_at,
            hypotheses,
        };

        let path = self.layout.session_file(session);
        write_json(&path, &file, self.atomic_writes).await?;
        debug!(
            session = %session,
            hypotheses = file.hypotheses.len(),
            updated_at = %file.updated_at,
            "Saved session file"
        );
        Ok(file)
    }

    /// Session ids with a persisted file, sorted. A missing storage directory
    /// means no sessions.
    pub async fn list_sessions(&self) -> StoreResult<Vec<SessionId>> {
        let dir = self.layout.hypotheses_dir();
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(source) if source.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(StoreError::Io { path: dir, source }),
        };

        let mut sessions = Vec::new();
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(source) => return Err(StoreError::Io { path: dir, source }),
            };
            let name = entry.file_name();
            if let Some(session) = name.to_str().and_then(StorageLayout::session_from_file_name) {
                sessions.push(session);
            }
        }

        sessions.sort();
        sessions.dedup();
        Ok(sessions)
    }
}

fn check_membership(session: &SessionId, hypotheses: &[Hypothesis]) -> StoreResult<()> {
    let mut seen = HashSet::with_capacity(hypotheses.len());
    for h in hypotheses {
        if &h.session_id != session {
            return Err(StoreError::InvalidInput(format!(
                "hypothesis {} has sessionId {} but is being saved to session {session}",
                h.id, h.session_id
            )));
        }
        if !h.session_matches_id() {
            return Err(StoreError::InvalidInput(format!(
                "hypothesis {} does not belong to session {}",
                h.id, h.session_id
            )));
        }
        if !seen.insert(&h.id) {
            return Err(StoreError::InvalidInput(format!(
                "duplicate hypothesis id {} in session {session}",
                h.id
            )));
        }
    }
    Ok(())
}

/// `now`, unless the clock has not moved past `previous`.
fn advance(previous: DateTime<Utc>, now: DateTime<Utc>) -> DateTime<Utc> {
    if now > previous {
        now
    } else {
        previous + Duration::milliseconds(1)
    }
}
