//! Storage configuration.
//!
//! Loaded from an optional TOML file, then overridden from the environment:
//!
//! ```toml
//! base_dir = "/srv/lab"
//! auto_rebuild_index = true
//! index_failure_policy = "fail_fast"   # or "skip_corrupt"
//! serialize_session_writes = false
//! atomic_writes = false
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

pub const ENV_BASE_DIR: &str = "RESEARCH_BASE_DIR";
pub const ENV_AUTO_REBUILD_INDEX: &str = "RESEARCH_AUTO_REBUILD_INDEX";

/// What an index rebuild does when one session file cannot be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexFailurePolicy {
    /// Abort the rebuild and leave the persisted index untouched.
    #[default]
    FailFast,
    /// Log and leave the unreadable session out of the index.
    SkipCorrupt,
}

/// Construction-time options for [`crate::HypothesisStorage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory containing `.research/`.
    pub base_dir: PathBuf,
    /// Rebuild the index synchronously after every successful mutation.
    pub auto_rebuild_index: bool,
    pub index_failure_policy: IndexFailurePolicy,
    /// Serialize read-modify-write sequences per session inside this process.
    pub serialize_session_writes: bool,
    /// Write to a temp file and rename over the target.
    pub atomic_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("."),
            auto_rebuild_index: true,
            index_failure_policy: IndexFailurePolicy::FailFast,
            serialize_session_writes: false,
            atomic_writes: false,
        }
    }
}

impl StorageConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            ..Self::default()
        }
    }

    pub fn with_auto_rebuild_index(mut self, enabled: bool) -> Self {
        self.auto_rebuild_index = enabled;
        self
    }

    pub fn with_index_failure_policy(mut self, policy: IndexFailurePolicy) -> Self {
        self.index_failure_policy = policy;
        self
    }

    pub fn with_serialized_session_writes(mut self, enabled: bool) -> Self {
        self.serialize_session_writes = enabled;
        self
    }

    pub fn with_atomic_writes(mut self, enabled: bool) -> Self {
        self.atomic_writes = enabled;
        self
    }

    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> StoreResult<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&contents)
            .map_err(|e| StoreError::Config(format!("{}: {e}", path.display())))
    }

    /// Apply `RESEARCH_BASE_DIR` and `RESEARCH_AUTO_REBUILD_INDEX`.
    pub fn with_env_overrides(self) -> StoreResult<Self> {
        self.apply_overrides(|key| std::env::var(key).ok())
    }

    fn apply_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> StoreResult<Self> {
        if let Some(dir) = lookup(ENV_BASE_DIR).filter(|d| !d.trim().is_empty()) {
            self.base_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_AUTO_REBUILD_INDEX) {
            self.auto_rebuild_index = parse_flag(&raw).ok_or_else(|| {
                StoreError::Config(format!("{ENV_AUTO_REBUILD_INDEX} must be a boolean, got {raw:?}"))
            })?;
        }
        Ok(self)
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
