mod client;
mod fallback;

pub use client::{NarrativeClient, NarrativeConfig};
pub use fallback::LocalNarrativeGenerator;

use chrono::{DateTime, Utc};
use tracing::debug;

use quiz_core::model::{
    InstrumentConfig, NarrativeSource, SessionId, TestResult, TestType,
};
use quiz_core::scoring::ScoreReport;

/// Merges scoring output with narrative text into a [`TestResult`].
///
/// The remote collaborator is tried first; any failure (disabled, network,
/// timeout, malformed response) falls back to the deterministic local
/// generator, so assembly itself never fails. Scores and classification
/// always come from the scoring engine, never from the remote response.
#[derive(Clone)]
pub struct ResultAssembler {
    client: NarrativeClient,
    fallback: LocalNarrativeGenerator,
}

impl ResultAssembler {
    #[must_use]
    pub fn new(client: NarrativeClient) -> Self {
        Self {
            client,
            fallback: LocalNarrativeGenerator::new(),
        }
    }

    #[must_use]
    pub fn from_env() -> Self {
        Self::new(NarrativeClient::from_env())
    }

    pub async fn assemble(
        &self,
        session_id: SessionId,
        config: &InstrumentConfig,
        report: ScoreReport,
        completed_at: DateTime<Utc>,
    ) -> TestResult {
        let test_type: TestType = config.test_type();
        let (narrative, narrative_source) = match self
            .client
            .generate(
                test_type,
                &report.primary_type,
                &report.secondary_type,
                &report.scores,
            )
            .await
        {
            Ok(narrative) => (narrative, NarrativeSource::Remote),
            Err(error) => {
                debug!(%test_type, %error, "remote narrative unavailable, using local generator");
                let narrative = self.fallback.generate(
                    config,
                    &report.primary_type,
                    &report.secondary_type,
                    &report.scores,
                );
                (narrative, NarrativeSource::LocalFallback)
            }
        };

        TestResult {
            session_id,
            test_type,
            scores: report.scores,
            primary_type: report.primary_type,
            secondary_type: report.secondary_type,
            narrative,
            narrative_source,
            completed_at,
        }
    }
}
