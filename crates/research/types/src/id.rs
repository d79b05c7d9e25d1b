//! Session and hypothesis identifiers.
//!
//! Hypothesis ids have the shape `H-<SESSION>-<SEQ>` where `<SESSION>` is a
//! session code and `<SEQ>` is one or more ASCII digits. Session codes use
//! `[A-Za-z0-9_-]` and neither start nor end with `-`. The sequence never
//! contains `-`, so the owning session is everything between the `H-` prefix
//! and the last `-` (`H-RS-2025-001` belongs to `RS-2025`).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{TypesError, TypesResult};

const HYPOTHESIS_PREFIX: &str = "H-";

fn is_session_code(value: &str) -> bool {
    !value.is_empty()
        && !value.starts_with('-')
        && !value.ends_with('-')
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

// ── Session Id ──────────────────────────────────────────────────────────

/// Short code naming a research session.
///
/// Used verbatim in file names, so only `[A-Za-z0-9_-]` is accepted, with no
/// leading or trailing `-`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SessionId(String);

impl SessionId {
    /// Validate and wrap a session code.
    pub fn new(value: impl Into<String>) -> TypesResult<Self> {
        let value = value.into();
        if !is_session_code(&value) {
            return Err(TypesError::MalformedSessionId(value));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for SessionId {
    type Err = TypesError;

    fn from_str(s: &str) -> TypesResult<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for SessionId {
    type Error = TypesError;

    fn try_from(value: String) -> TypesResult<Self> {
        Self::new(value)
    }
}

impl From<SessionId> for String {
    fn from(id: SessionId) -> Self {
        id.0
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// ── Hypothesis Id ───────────────────────────────────────────────────────

/// Global hypothesis identifier, `H-<SESSION>-<SEQ>`.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct HypothesisId {
    raw: String,
    session_end: usize,
}

impl HypothesisId {
    /// Parse an id, rejecting anything not shaped like `H-<SESSION>-<SEQ>`.
    pub fn parse(value: impl Into<String>) -> TypesResult<Self> {
        let raw = value.into();
        let session_end = match Self::split(&raw) {
            Some((session, _)) => HYPOTHESIS_PREFIX.len() + session.len(),
            None => return Err(TypesError::MalformedHypothesisId(raw)),
        };
        Ok(Self { raw, session_end })
    }

    /// Build an id from a session and a sequence number, zero-padded to three digits.
    pub fn from_parts(session: &SessionId, sequence: u64) -> Self {
        let raw = format!("{HYPOTHESIS_PREFIX}{session}-{sequence:03}");
        let session_end = HYPOTHESIS_PREFIX.len() + session.as_str().len();
        Self { raw, session_end }
    }

    fn split(raw: &str) -> Option<(&str, &str)> {
        let rest = raw.strip_prefix(HYPOTHESIS_PREFIX)?;
        let (session, seq) = rest.rsplit_once('-')?;
        let session_ok = is_session_code(session);
        let seq_ok = !seq.is_empty() && seq.chars().all(|c| c.is_ascii_digit());
        (session_ok && seq_ok).then_some((session, seq))
    }

    /// The owning session.
    pub fn session_id(&self) -> SessionId {
        SessionId(self.raw[HYPOTHESIS_PREFIX.len()..self.session_end].to_string())
    }

    /// The sequence component, digits only, as written.
    pub fn sequence(&self) -> &str {
        &self.raw[self.session_end + 1..]
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl fmt::Display for HypothesisId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for HypothesisId {
    type Err = TypesError;

    fn from_str(s: &str) -> TypesResult<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for HypothesisId {
    type Error = TypesError;

    fn try_from(value: String) -> TypesResult<Self> {
        Self::parse(value)
    }
}

impl From<HypothesisId> for String {
    fn from(id: HypothesisId) -> Self {
        id.raw
    }
}

impl AsRef<str> for HypothesisId {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}
