//! Hypothesis records and their lifecycle enums.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{TypesError, TypesResult};
use crate::id::{HypothesisId, SessionId};

// ── Category ────────────────────────────────────────────────────────────

/// The logical role a hypothesis plays within its session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisCategory {
    /// Proposes a causal mechanism.
    Mechanistic,
    /// Describes an observed regularity without a mechanism.
    Phenomenological,
    /// Marks where an effect stops holding.
    Boundary,
    /// Supports another hypothesis.
    Auxiliary,
    /// An explanation outside the two leading candidates.
    ThirdAlternative,
}

impl HypothesisCategory {
    pub const ALL: [Self; 5] = [
        Self::Mechanistic,
        Self::Phenomenological,
        Self::Boundary,
        Self::Auxiliary,
        Self::ThirdAlternative,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mechanistic => "mechanistic",
            Self::Phenomenological => "phenomenological",
            Self::Boundary => "boundary",
            Self::Auxiliary => "auxiliary",
            Self::ThirdAlternative => "third_alternative",
        }
    }
}

// ── Confidence ──────────────────────────────────────────────────────────

/// Qualitative confidence assigned by the researcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisConfidence {
    High,
    Medium,
    Low,
    Speculative,
}

impl HypothesisConfidence {
    pub const ALL: [Self; 4] = [Self::High, Self::Medium, Self::Low, Self::Speculative];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
            Self::Speculative => "speculative",
        }
    }
}

// ── State ───────────────────────────────────────────────────────────────

/// Lifecycle state of a hypothesis.
///
/// Storage persists whatever state it is handed. The transition relation in
/// [`HypothesisState::can_transition_to`] is for layers that enforce it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HypothesisState {
    Proposed,
    Active,
    Confirmed,
    Refuted,
    Superseded,
    Deferred,
}

impl HypothesisState {
    pub const ALL: [Self; 6] = [
        Self::Proposed,
        Self::Active,
        Self::Confirmed,
        Self::Refuted,
        Self::Superseded,
        Self::Deferred,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Proposed => "proposed",
            Self::Active => "active",
            Self::Confirmed => "confirmed",
            Self::Refuted => "refuted",
            Self::Superseded => "superseded",
            Self::Deferred => "deferred",
        }
    }

    /// `proposed → active → {confirmed, refuted, superseded, deferred}` and
    /// `deferred → active`.
    pub fn can_transition_to(&self, next: Self) -> bool {
        use HypothesisState::*;
        matches!(
            (*self, next),
            (Proposed, Active)
                | (Active, Confirmed)
                | (Active, Refuted)
                | (Active, Superseded)
                | (Active, Deferred)
                | (Deferred, Active)
        )
    }

    /// Whether no further transition leaves this state.
    pub fn is_terminal(&self) -> bool {
        Self::ALL.iter().all(|next| !self.can_transition_to(*next))
    }
}

macro_rules! impl_enum_text {
    ($ty:ty, $kind:literal) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = TypesError;

            fn from_str(s: &str) -> TypesResult<Self> {
                let wanted = s.trim().to_ascii_lowercase();
                Self::ALL
                    .into_iter()
                    .find(|v| v.as_str() == wanted)
                    .ok_or_else(|| TypesError::UnknownVariant {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }
    };
}

impl_enum_text!(HypothesisCategory, "category");
impl_enum_text!(HypothesisConfidence, "confidence");
impl_enum_text!(HypothesisState, "state");

// ── Hypothesis ──────────────────────────────────────────────────────────

/// A single tracked candidate explanation within a research session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hypothesis {
    /// Global id; immutable once assigned.
    pub id: HypothesisId,
    /// Owning session. Must agree with the session embedded in `id`.
    pub session_id: SessionId,
    pub statement: String,
    pub category: HypothesisCategory,
    pub confidence: HypothesisConfidence,
    pub state: HypothesisState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<String>,
    #[serde(default)]
    pub tags: BTreeSet<String>,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Hypothesis {
    /// A freshly proposed hypothesis owned by the session embedded in `id`.
    pub fn new(
        id: HypothesisId,
        statement: impl Into<String>,
        category: HypothesisCategory,
        confidence: HypothesisConfidence,
    ) -> Self {
        let now = Utc::now();
        Self {
            session_id: id.session_id(),
            id,
            statement: statement.into(),
            category,
            confidence,
            state: HypothesisState::Proposed,
            mechanism: None,
            tags: BTreeSet::new(),
            notes: String::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_state(mut self, state: HypothesisState) -> Self {
        self.state = state;
        self
    }

    pub fn with_mechanism(mut self, mechanism: impl Into<String>) -> Self {
        self.mechanism = Some(mechanism.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Mechanism present and not blank.
    pub fn has_mechanism(&self) -> bool {
        self.mechanism
            .as_deref()
            .is_some_and(|m| !m.trim().is_empty())
    }

    /// Whether `session_id` agrees with the session encoded in `id`.
    pub fn session_matches_id(&self) -> bool {
        self.id.session_id() == self.session_id
    }

    /// Case-insensitive substring match over statement, mechanism, notes,
    /// tags and id. `needle` must already be lowercased.
    pub fn matches_lowercase(&self, needle: &str) -> bool {
        let contains = |text: &str| text.to_lowercase().contains(needle);
        contains(self.statement.as_str())
            || self.mechanism.as_deref().is_some_and(contains)
            || contains(self.notes.as_str())
            || self.tags.iter().any(|tag| contains(tag.as_str()))
            || contains(self.id.as_str())
    }
}
