use serde::{Deserialize, Serialize};

use crate::model::ids::{DimensionId, OptionId, QuestionId};

/// Lower bound of the fixed Likert response scale.
pub const LIKERT_MIN: u8 = 1;
/// Upper bound of the fixed Likert response scale.
pub const LIKERT_MAX: u8 = 5;

/// One selectable response for a question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: OptionId,
    pub text: String,
    /// Likert value on the fixed 1..=5 scale.
    pub value: u8,
}

impl AnswerOption {
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>, value: u8) -> Self {
        Self {
            id: OptionId::new(id),
            text: text.into(),
            value,
        }
    }
}

/// A single questionnaire item.
///
/// Reverse-scored items are phrased against their dimension and inverted
/// before aggregation; neutral items exist for instrument balance and are
/// never averaged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    id: QuestionId,
    text: String,
    dimension: DimensionId,
    #[serde(default)]
    is_reverse_scored: bool,
    #[serde(default)]
    is_neutral: bool,
    /// Presentation position within the instrument.
    order: u32,
    options: Vec<AnswerOption>,
}

impl Question {
    /// Creates a Likert question with the standard five-option scale.
    #[must_use]
    pub fn likert(
        id: impl Into<String>,
        text: impl Into<String>,
        dimension: impl Into<DimensionId>,
        order: u32,
    ) -> Self {
        let id = QuestionId::new(id);
        let options = standard_likert_options(&id);
        Self {
            id,
            text: text.into(),
            dimension: dimension.into(),
            is_reverse_scored: false,
            is_neutral: false,
            order,
            options,
        }
    }

    /// Marks the question as reverse-scored.
    #[must_use]
    pub fn reverse_scored(mut self) -> Self {
        self.is_reverse_scored = true;
        self
    }

    /// Marks the question as neutral (excluded from dimension averaging).
    #[must_use]
    pub fn neutral(mut self) -> Self {
        self.is_neutral = true;
        self
    }

    /// Replaces the generated options with custom ones.
    #[must_use]
    pub fn with_options(mut self, options: Vec<AnswerOption>) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn dimension(&self) -> &DimensionId {
        &self.dimension
    }

    #[must_use]
    pub fn is_reverse_scored(&self) -> bool {
        self.is_reverse_scored
    }

    #[must_use]
    pub fn is_neutral(&self) -> bool {
        self.is_neutral
    }

    #[must_use]
    pub fn order(&self) -> u32 {
        self.order
    }

    #[must_use]
    pub fn options(&self) -> &[AnswerOption] {
        &self.options
    }
}

/// Builds the standard five-option agree/disagree scale for a question.
#[must_use]
pub fn standard_likert_options(question_id: &QuestionId) -> Vec<AnswerOption> {
    const LABELS: [&str; 5] = [
        "Strongly Disagree",
        "Disagree",
        "Neutral",
        "Agree",
        "Strongly Agree",
    ];
    LABELS
        .iter()
        .zip(LIKERT_MIN..=LIKERT_MAX)
        .map(|(label, value)| {
            AnswerOption::new(format!("{question_id}-{value}"), *label, value)
        })
        .collect()
}
