//! # research-types
//!
//! Data model for research hypotheses tracked per research session.
//!
//! A [`Hypothesis`] is a single candidate explanation. Its [`HypothesisId`]
//! (`H-<SESSION>-<SEQ>`) embeds the owning [`SessionId`], which is how the
//! storage layer routes point lookups to a single session file without
//! scanning every session.
//!
//! Records arrive already validated by the hypothesis schema; these types only
//! guarantee structural well-formedness (id shape, enum values). Lifecycle
//! transition rules are exposed through [`HypothesisState::can_transition_to`]
//! for callers that want to enforce them; storage itself never does.

#![deny(unsafe_code)]

mod error;
mod hypothesis;
mod id;

pub use error::{TypesError, TypesResult};
pub use hypothesis::{Hypothesis, HypothesisCategory, HypothesisConfidence, HypothesisState};
pub use id::{HypothesisId, SessionId};
