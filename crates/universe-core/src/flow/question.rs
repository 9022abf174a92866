//! Generated clarifying questions stored alongside a flow

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Lowest and highest question priority
pub const MIN_PRIORITY: u8 = 1;
pub const MAX_PRIORITY: u8 = 5;

fn default_priority() -> u8 {
    3
}

/// A clarifying question and, once answered, its answer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedQuestion {
    pub question: String,

    #[serde(default)]
    pub context: String,

    /// 1 (low) to 5 (high)
    #[serde(default = "default_priority")]
    pub priority: u8,

    #[serde(default)]
    pub answered: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answered_at: Option<DateTime<Utc>>,
}

impl GeneratedQuestion {
    pub fn new(question: impl Into<String>, context: impl Into<String>, priority: u8) -> Self {
        Self {
            question: question.into(),
            context: context.into(),
            priority: priority.clamp(MIN_PRIORITY, MAX_PRIORITY),
            answered: false,
            answer: None,
            answered_at: None,
        }
    }

    /// Record an answer and stamp the time
    pub fn answer(&mut self, answer: impl Into<String>) {
        self.answer = Some(answer.into());
        self.answered = true;
        self.answered_at = Some(Utc::now());
    }
}
