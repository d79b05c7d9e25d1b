//! CLI command implementations

pub mod hypothesis;
pub mod index;
