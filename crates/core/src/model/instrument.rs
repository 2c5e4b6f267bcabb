use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::AnswerError;
use crate::model::ids::{DimensionId, QuestionId};
use crate::model::question::{LIKERT_MAX, LIKERT_MIN, Question};
use crate::model::test_type::TestType;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors raised while validating questions or answers against an instrument.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("question {question} declares undeclared dimension {dimension}")]
    UnknownDimension {
        question: QuestionId,
        dimension: DimensionId,
    },

    #[error("answer references unknown question {question}")]
    UnknownQuestion { question: QuestionId },

    #[error("question {question} declares no option {option}")]
    UnknownOption { question: QuestionId, option: String },

    #[error(transparent)]
    Answer(#[from] AnswerError),
}

//
// ─── DIMENSION ────────────────────────────────────────────────────────────────
//

/// One scored facet of an instrument, with its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimension {
    id: DimensionId,
    name: String,
}

impl Dimension {
    #[must_use]
    pub fn new(id: impl Into<DimensionId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    #[must_use]
    pub fn id(&self) -> &DimensionId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

//
// ─── INSTRUMENT CONFIG ────────────────────────────────────────────────────────
//

/// Configuration shared by every instrument: its closed dimension set in
/// canonical declaration order, and the Likert bounds.
///
/// The declaration order doubles as the tie-break order when two dimensions
/// score equally, so it is part of the instrument's contract, not cosmetics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    test_type: TestType,
    dimensions: Vec<Dimension>,
    likert_min: u8,
    likert_max: u8,
}

impl InstrumentConfig {
    /// Builds a config with the fixed 1..=5 Likert scale.
    #[must_use]
    pub fn new(test_type: TestType, dimensions: Vec<Dimension>) -> Self {
        Self {
            test_type,
            dimensions,
            likert_min: LIKERT_MIN,
            likert_max: LIKERT_MAX,
        }
    }

    /// Canonical configuration for the given instrument.
    #[must_use]
    pub fn for_test_type(test_type: TestType) -> Self {
        let dimensions = match test_type {
            TestType::LoveLanguage => vec![
                Dimension::new("words_of_affirmation", "Words of Affirmation"),
                Dimension::new("quality_time", "Quality Time"),
                Dimension::new("receiving_gifts", "Receiving Gifts"),
                Dimension::new("acts_of_service", "Acts of Service"),
                Dimension::new("physical_touch", "Physical Touch"),
            ],
            TestType::LoveStyle => vec![
                Dimension::new("eros", "Eros"),
                Dimension::new("ludus", "Ludus"),
                Dimension::new("storge", "Storge"),
                Dimension::new("pragma", "Pragma"),
                Dimension::new("mania", "Mania"),
                Dimension::new("agape", "Agape"),
            ],
            TestType::Interpersonal => vec![
                Dimension::new("communication", "Communication"),
                Dimension::new("empathy", "Empathy"),
                Dimension::new("conflict_resolution", "Conflict Resolution"),
                Dimension::new("cooperation", "Cooperation"),
            ],
            TestType::Disc => vec![
                Dimension::new("dominance", "Dominance"),
                Dimension::new("influence", "Influence"),
                Dimension::new("steadiness", "Steadiness"),
                Dimension::new("conscientiousness", "Conscientiousness"),
            ],
            TestType::Holland => vec![
                Dimension::new("realistic", "Realistic"),
                Dimension::new("investigative", "Investigative"),
                Dimension::new("artistic", "Artistic"),
                Dimension::new("social", "Social"),
                Dimension::new("enterprising", "Enterprising"),
                Dimension::new("conventional", "Conventional"),
            ],
            TestType::Leadership => vec![
                Dimension::new("visionary", "Visionary"),
                Dimension::new("coaching", "Coaching"),
                Dimension::new("democratic", "Democratic"),
                Dimension::new("pacesetting", "Pacesetting"),
                Dimension::new("commanding", "Commanding"),
            ],
        };
        Self::new(test_type, dimensions)
    }

    #[must_use]
    pub fn test_type(&self) -> TestType {
        self.test_type
    }

    /// Dimensions in canonical declaration order.
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    #[must_use]
    pub fn likert_min(&self) -> u8 {
        self.likert_min
    }

    #[must_use]
    pub fn likert_max(&self) -> u8 {
        self.likert_max
    }

    #[must_use]
    pub fn contains(&self, dimension: &DimensionId) -> bool {
        self.dimensions.iter().any(|d| d.id() == dimension)
    }

    /// Display name for a declared dimension.
    #[must_use]
    pub fn display_name(&self, dimension: &DimensionId) -> Option<&str> {
        self.dimensions
            .iter()
            .find(|d| d.id() == dimension)
            .map(Dimension::name)
    }

    /// Inverts a raw value for a reverse-scored item (`6 - raw` on 1..=5).
    #[must_use]
    pub fn invert(&self, raw: u8) -> u8 {
        self.likert_min + self.likert_max - raw
    }

    /// Checks that every question's dimension is declared by this instrument.
    ///
    /// Runs at configuration-load time so typo'd dimension names fail loudly
    /// instead of silently accumulating into a phantom dimension.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnknownDimension` for the first offending
    /// question.
    pub fn validate_questions(&self, questions: &[Question]) -> Result<(), ValidationError> {
        for question in questions {
            if !self.contains(question.dimension()) {
                return Err(ValidationError::UnknownDimension {
                    question: question.id().clone(),
                    dimension: question.dimension().clone(),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_instrument_has_the_documented_dimension_count() {
        let expected = [
            (TestType::LoveLanguage, 5),
            (TestType::LoveStyle, 6),
            (TestType::Interpersonal, 4),
            (TestType::Disc, 4),
            (TestType::Holland, 6),
            (TestType::Leadership, 5),
        ];
        for (test_type, count) in expected {
            let config = InstrumentConfig::for_test_type(test_type);
            assert_eq!(config.dimensions().len(), count, "{test_type}");
        }
    }

    #[test]
    fn invert_reflects_on_the_scale() {
        let config = InstrumentConfig::for_test_type(TestType::Disc);
        assert_eq!(config.invert(1), 5);
        assert_eq!(config.invert(3), 3);
        assert_eq!(config.invert(5), 1);
    }

    #[test]
    fn undeclared_dimension_fails_validation() {
        let config = InstrumentConfig::for_test_type(TestType::Disc);
        let questions = vec![
            Question::likert("q1", "ok", "dominance", 0),
            Question::likert("q2", "typo", "dominence", 1),
        ];
        let err = config.validate_questions(&questions).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::UnknownDimension { ref dimension, .. }
                if dimension.as_str() == "dominence"
        ));
    }

    #[test]
    fn declared_dimensions_validate() {
        let config = InstrumentConfig::for_test_type(TestType::Holland);
        let questions: Vec<Question> = config
            .dimensions()
            .iter()
            .enumerate()
            .map(|(i, d)| Question::likert(format!("q{i}"), "x", d.id().as_str(), i as u32))
            .collect();
        assert!(config.validate_questions(&questions).is_ok());
    }
}
