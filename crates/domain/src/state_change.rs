//! StateChange - the record of one attempted mutation and its outcome.

use serde::{Deserialize, Serialize};

/// What kind of mutation was attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Health,
    Mana,
    EffectAdded,
    EffectRemoved,
    GlobalEffectAdded,
    GlobalEffectRemoved,
    Resource,
    RoundAdvance,
    Unrecognized,
}

/// Outcome of validating an invocation against a session snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChangeStatus {
    /// The mutation changed state.
    Applied,
    /// Valid but a no-op (re-applied effect, removing an absent effect).
    Unchanged,
    Rejected { reason: String },
}

impl ChangeStatus {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected {
            reason: reason.into(),
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    pub fn rejection_reason(&self) -> Option<&str> {
        match self {
            Self::Rejected { reason } => Some(reason),
            _ => None,
        }
    }
}

/// One attempted mutation, as reported back to the caller.
///
/// `before` and `after` carry the numeric values the change touched: hp for
/// health, quantity for resources, the round for round advances. Effect
/// changes leave them empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateChange {
    /// Tool name as emitted by the model.
    pub action: String,
    pub kind: ChangeKind,
    pub target: Option<String>,
    /// Requested delta for numeric changes.
    pub magnitude: Option<i64>,
    /// Effect or resource name.
    pub label: Option<String>,
    pub before: Option<i64>,
    pub after: Option<i64>,
    pub description: String,
    pub reason: Option<String>,
    pub status: ChangeStatus,
}

impl StateChange {
    pub(crate) fn new(action: impl Into<String>, kind: ChangeKind) -> Self {
        Self {
            action: action.into(),
            kind,
            target: None,
            magnitude: None,
            label: None,
            before: None,
            after: None,
            description: String::new(),
            reason: None,
            status: ChangeStatus::Applied,
        }
    }

    pub(crate) fn target(mut self, player: impl Into<String>) -> Self {
        self.target = Some(player.into());
        self
    }

    pub(crate) fn magnitude(mut self, delta: i64) -> Self {
        self.magnitude = Some(delta);
        self
    }

    pub(crate) fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub(crate) fn values(mut self, before: i64, after: i64) -> Self {
        self.before = Some(before);
        self.after = Some(after);
        self
    }

    pub(crate) fn reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub(crate) fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub(crate) fn unchanged(mut self) -> Self {
        self.status = ChangeStatus::Unchanged;
        self
    }

    /// Mark rejected; the description becomes the reason unless one was set.
    pub(crate) fn reject(mut self, reason: impl Into<String>) -> Self {
        let reason = reason.into();
        if self.description.is_empty() {
            self.description = format!("Rejected {}: {}", self.action, reason);
        }
        self.status = ChangeStatus::Rejected { reason };
        self
    }

    pub fn is_applied(&self) -> bool {
        self.status.is_applied()
    }

    pub fn is_rejected(&self) -> bool {
        self.status.is_rejected()
    }
}
