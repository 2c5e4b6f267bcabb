use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::{DimensionId, SessionId};
use crate::model::test_type::TestType;

//
// ─── DIMENSION SCORES ─────────────────────────────────────────────────────────
//

/// Per-dimension average scores, kept in the instrument's canonical
/// declaration order.
///
/// A score of `0.0` marks a dimension with no answered questions; real
/// averages always fall inside the Likert bounds (1.0..=5.0).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DimensionScores(Vec<(DimensionId, f64)>);

impl DimensionScores {
    #[must_use]
    pub fn new(scores: Vec<(DimensionId, f64)>) -> Self {
        Self(scores)
    }

    #[must_use]
    pub fn get(&self, dimension: &DimensionId) -> Option<f64> {
        self.0
            .iter()
            .find(|(id, _)| id == dimension)
            .map(|(_, score)| *score)
    }

    /// Iterates scores in canonical dimension order.
    pub fn iter(&self) -> impl Iterator<Item = (&DimensionId, f64)> {
        self.0.iter().map(|(id, score)| (id, *score))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

//
// ─── NARRATIVE ────────────────────────────────────────────────────────────────
//

/// Where the narrative text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeSource {
    /// Produced by the remote analysis collaborator.
    Remote,
    /// Produced by the deterministic local template generator.
    LocalFallback,
}

/// Free-text interpretation attached to a result.
///
/// Narrative content is best-effort enrichment: scores and classification
/// never depend on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub interpretation: String,
    pub recommendations: String,
    pub strengths: String,
    pub areas_for_growth: String,
}

//
// ─── TEST RESULT ──────────────────────────────────────────────────────────────
//

/// Final outcome of a completed session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub session_id: SessionId,
    pub test_type: TestType,
    pub scores: DimensionScores,
    pub primary_type: DimensionId,
    pub secondary_type: DimensionId,
    pub narrative: Narrative,
    pub narrative_source: NarrativeSource,
    pub completed_at: DateTime<Utc>,
}
