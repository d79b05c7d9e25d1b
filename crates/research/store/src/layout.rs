//! On-disk layout under a base directory.
//!
//! ```text
//! <base>/.research/hypotheses/<SESSION>-hypotheses.json
//! <base>/.research/hypothesis-index.json
//! ```

use std::path::{Path, PathBuf};

use research_types::SessionId;

pub const RESEARCH_DIR: &str = ".research";
pub const HYPOTHESES_DIR: &str = "hypotheses";
pub const INDEX_FILE: &str = "hypothesis-index.json";
pub const SESSION_FILE_SUFFIX: &str = "-hypotheses.json";

/// Resolves every path the store reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageLayout {
    base_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn research_dir(&self) -> PathBuf {
        self.base_dir.join(RESEARCH_DIR)
    }

    pub fn hypotheses_dir(&self) -> PathBuf {
        self.research_dir().join(HYPOTHESES_DIR)
    }

    pub fn session_file(&self, session: &SessionId) -> PathBuf {
        self.hypotheses_dir()
            .join(format!("{session}{SESSION_FILE_SUFFIX}"))
    }

    pub fn index_file(&self) -> PathBuf {
        self.research_dir().join(INDEX_FILE)
    }

    /// Session id for a file name in the hypotheses directory, if it is one.
    pub fn session_from_file_name(name: &str) -> Option<SessionId> {
        let stem = name.strip_suffix(SESSION_FILE_SUFFIX)?;
        SessionId::new(stem).ok()
    }
}
