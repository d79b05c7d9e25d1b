//! Opt-in per-session advisory locks.
//!
//! Without these, mutations follow a last-writer-wins model at session-file
//! granularity. With them, read-modify-write sequences against the same
//! session are serialized within this process. Other processes are not
//! coordinated.

use std::collections::HashMap;
use std::sync::Arc;

use research_types::SessionId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// One slot per session ever locked. Slots are never evicted, so memory
/// grows with the number of distinct sessions this process has written.
#[derive(Debug, Clone, Default)]
pub struct SessionLocks {
    slots: Arc<Mutex<HashMap<SessionId, Arc<Mutex<()>>>>>,
}

impl SessionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `session`. Released when the guard drops.
    pub async fn acquire(&self, session: &SessionId) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots
                .entry(session.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        slot.lock_owned().await
    }
}
