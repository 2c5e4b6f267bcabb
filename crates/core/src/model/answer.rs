use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::QuestionId;
use crate::model::question::{LIKERT_MAX, LIKERT_MIN};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur when constructing an answer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AnswerError {
    #[error("likert value {0} is outside the {LIKERT_MIN}..={LIKERT_MAX} scale")]
    ValueOutOfRange(u8),
}

//
// ─── ANSWER VALUE ─────────────────────────────────────────────────────────────
//

/// The response a user gave to one question.
///
/// Likert instruments carry a numeric 1..=5 value; other formats carry the
/// chosen option id. Only Likert values participate in dimension averaging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerValue {
    Likert(u8),
    Choice(String),
}

impl AnswerValue {
    /// Creates a Likert value, validating the fixed scale bounds.
    ///
    /// # Errors
    ///
    /// Returns `AnswerError::ValueOutOfRange` if the value is not in 1..=5.
    pub fn likert(value: u8) -> Result<Self, AnswerError> {
        if (LIKERT_MIN..=LIKERT_MAX).contains(&value) {
            Ok(Self::Likert(value))
        } else {
            Err(AnswerError::ValueOutOfRange(value))
        }
    }

    /// Returns the Likert value if this is a Likert answer.
    #[must_use]
    pub fn as_likert(&self) -> Option<u8> {
        match self {
            AnswerValue::Likert(v) => Some(*v),
            AnswerValue::Choice(_) => None,
        }
    }
}

//
// ─── USER ANSWER ──────────────────────────────────────────────────────────────
//

/// Record of one answered question within a session.
///
/// A session holds at most one `UserAnswer` per question id; resubmitting
/// replaces the earlier record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAnswer {
    pub question_id: QuestionId,
    pub value: AnswerValue,
    pub answered_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_ms: Option<u64>,
    /// Self-reported confidence, 0..=100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<u8>,
}

impl UserAnswer {
    #[must_use]
    pub fn new(question_id: QuestionId, value: AnswerValue, answered_at: DateTime<Utc>) -> Self {
        Self {
            question_id,
            value,
            answered_at,
            time_spent_ms: None,
            confidence: None,
        }
    }

    #[must_use]
    pub fn with_time_spent(mut self, millis: u64) -> Self {
        self.time_spent_ms = Some(millis);
        self
    }

    /// Attaches self-reported confidence, clamped to the 0..=100 scale.
    #[must_use]
    pub fn with_confidence(mut self, confidence: u8) -> Self {
        self.confidence = Some(confidence.min(100));
        self
    }
}
