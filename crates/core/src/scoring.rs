use std::collections::HashMap;

use thiserror::Error;

use crate::model::{
    DimensionId, DimensionScores, InstrumentConfig, Question, QuestionId, UserAnswer,
};

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors that can occur during scoring.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("instrument declares {provided} dimensions, need at least 2 to classify")]
    TooFewDimensions { provided: usize },
}

//
// ─── SCORE REPORT ─────────────────────────────────────────────────────────────
//

/// Output of the scoring engine for one completed answer set.
///
/// `skipped_answers` counts answers that could not contribute: the question
/// is missing from the supplied set (typically a stale cached question set),
/// or its dimension is not declared by the config (an unvalidated source).
/// They are excluded from aggregation but surfaced here so callers can log
/// them instead of losing them silently.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreReport {
    pub scores: DimensionScores,
    pub primary_type: DimensionId,
    pub secondary_type: DimensionId,
    pub skipped_answers: usize,
}

//
// ─── SCORING ──────────────────────────────────────────────────────────────────
//

/// Scores an answer set against an instrument.
///
/// Pure and deterministic: the same `(config, questions, answers)` always
/// yields the same report. The aggregation is instrument-agnostic; the
/// config supplies the dimension list and Likert bounds.
///
/// Rules:
/// - neutral questions never contribute to dimension averages;
/// - reverse-scored values are inverted on the scale (`6 - raw` for 1..=5);
/// - a dimension with no contributing answers scores `0.0`;
/// - ranking is a stable descending sort, so equal scores resolve to the
///   dimension declared first in the instrument's configuration.
///
/// # Errors
///
/// Returns `ScoringError::TooFewDimensions` if the instrument declares fewer
/// than two dimensions, since primary/secondary classification needs both.
pub fn score(
    config: &InstrumentConfig,
    questions: &[Question],
    answers: &[UserAnswer],
) -> Result<ScoreReport, ScoringError> {
    let dimensions = config.dimensions();
    if dimensions.len() < 2 {
        return Err(ScoringError::TooFewDimensions {
            provided: dimensions.len(),
        });
    }

    let by_id: HashMap<&QuestionId, &Question> =
        questions.iter().map(|q| (q.id(), q)).collect();

    let mut sums = vec![0u32; dimensions.len()];
    let mut counts = vec![0u32; dimensions.len()];
    let mut skipped_answers = 0usize;

    for answer in answers {
        let Some(question) = by_id.get(&answer.question_id) else {
            skipped_answers += 1;
            continue;
        };
        if question.is_neutral() {
            continue;
        }
        // Choice answers carry no Likert value and stay out of the averages.
        let Some(raw) = answer.value.as_likert() else {
            continue;
        };
        let effective = if question.is_reverse_scored() {
            config.invert(raw)
        } else {
            raw
        };
        if let Some(slot) = dimensions
            .iter()
            .position(|d| d.id() == question.dimension())
        {
            sums[slot] += u32::from(effective);
            counts[slot] += 1;
        } else {
            // Undeclared dimension: the set bypassed load-time validation.
            skipped_answers += 1;
        }
    }

    let scores: Vec<(DimensionId, f64)> = dimensions
        .iter()
        .enumerate()
        .map(|(i, dimension)| {
            let average = if counts[i] == 0 {
                0.0
            } else {
                f64::from(sums[i]) / f64::from(counts[i])
            };
            (dimension.id().clone(), average)
        })
        .collect();

    // Stable sort keeps canonical declaration order for equal scores.
    let mut ranked: Vec<usize> = (0..scores.len()).collect();
    ranked.sort_by(|&a, &b| {
        scores[b]
            .1
            .partial_cmp(&scores[a].1)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let primary_type = scores[ranked[0]].0.clone();
    let secondary_type = scores[ranked[1]].0.clone();

    Ok(ScoreReport {
        scores: DimensionScores::new(scores),
        primary_type,
        secondary_type,
        skipped_answers,
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
