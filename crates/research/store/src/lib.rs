//! # research-store
//!
//! Durable storage for research hypotheses, one JSON file per session, plus a
//! derived cross-session index.
//!
//! ## Architecture
//!
//! ```text
//!          callers (CLI, API wrappers)
//!                     │
//!            ┌────────▼─────────┐
//!            │ HypothesisStorage│
//!            └───┬──────────┬───┘
//!                ▼          ▼
//!     ┌──────────────┐  ┌────────────────┐
//!     │ QueryEngine  │  │ MutationGateway│
//!     └──┬────────┬──┘  └──┬─────────┬───┘
//!        │        ▼        ▼         │
//!        │   ┌──────────────────┐    │
//!        │   │    IndexCache    │    │  derived, rebuildable
//!        │   └────────┬─────────┘    │
//!        ▼            ▼              ▼
//!     ┌─────────────────────────────────┐
//!     │           RecordStore           │  authoritative session files
//!     └─────────────────────────────────┘
//! ```
//!
//! ## Guarantees
//!
//! - A session file that exists but cannot be decoded is an error, never an
//!   empty session.
//! - Lookups by a malformed id return `None` without touching disk.
//! - Deletes are idempotent.
//! - The index can always be deleted and rebuilt from the session files.
//!
//! Writes are whole-file and last-writer-wins per session unless
//! `serialize_session_writes` is enabled.

#![deny(unsafe_code)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod critique;
mod error;
mod fsio;
pub mod index;
pub mod layout;
pub mod locks;
pub mod mutation;
pub mod query;
pub mod record;
mod storage;

pub use config::{IndexFailurePolicy, StorageConfig};
pub use critique::{CritiqueLedger, NoCritiques, StaticCritiques};
pub use error::{StoreError, StoreResult};
pub use index::{Index, IndexCache, IndexEntry, IndexFilter, IndexSummary, INDEX_VERSION};
pub use layout::StorageLayout;
pub use mutation::MutationGateway;
pub use query::QueryEngine;
pub use record::{RecordStore, SessionHypothesisFile};
pub use storage::HypothesisStorage;

pub use research_types as types;
