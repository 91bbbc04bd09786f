//! Ruling use cases: grounded answers to rules questions.

mod prompt;
mod rule_question;
mod tool_schema;

use std::sync::Arc;

pub use prompt::{state_summary, EMPTY_ANSWER_PLACEHOLDER, SYSTEM_PROMPT};
pub use rule_question::{RuleQuestion, RulingConfig};
pub use tool_schema::tool_definitions;

/// Container for ruling use cases.
pub struct RulingUseCases {
    pub rule: Arc<RuleQuestion>,
}

impl RulingUseCases {
    pub fn new(rule: Arc<RuleQuestion>) -> Self {
        Self { rule }
    }
}
