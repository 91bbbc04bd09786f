//! RulingResult - what a caller gets back for one rules question.

use serde::{Deserialize, Serialize};

use crate::state_change::StateChange;

/// A retrieved rule passage the answer is grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub text: String,
    /// Page, section, or chunk reference when the retrieval store has one.
    pub locator: Option<String>,
    pub score: Option<f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RulingResult {
    pub answer: String,
    /// Retrieved passages, in retrieval order. Never fabricated.
    pub citations: Vec<Citation>,
    /// Every attempted change, including rejected ones, in emitted order.
    pub changes: Vec<StateChange>,
    /// Set when retrieval returned nothing to ground the answer on.
    pub weak_grounding: bool,
}

impl RulingResult {
    pub fn applied_changes(&self) -> impl Iterator<Item = &StateChange> {
        self.changes.iter().filter(|c| c.is_applied())
    }

    pub fn rejected_changes(&self) -> impl Iterator<Item = &StateChange> {
        self.changes.iter().filter(|c| c.is_rejected())
    }
}
