use std::env;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};

use quiz_core::model::{DimensionId, DimensionScores, Narrative, TestType};

use crate::error::NarrativeError;

/// Default client-side timeout before falling back to the local generator.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Clone, Debug)]
pub struct NarrativeConfig {
    pub base_url: String,
    pub api_key: String,
    /// Upstream model identifier; the service default applies when unset.
    pub model: Option<String>,
    pub timeout: Duration,
}

impl NarrativeConfig {
    /// Reads configuration from `QUIZ_AI_*` environment variables.
    ///
    /// Returns `None` (service disabled) when no API key is set.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("QUIZ_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url = env::var("QUIZ_AI_BASE_URL")
            .unwrap_or_else(|_| "https://api.example.com/v1".into());
        let model = env::var("QUIZ_AI_MODEL")
            .ok()
            .filter(|v| !v.trim().is_empty());
        let timeout_secs = env::var("QUIZ_AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Some(Self {
            base_url,
            api_key,
            model,
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

/// Remote analysis collaborator producing narrative text for a scored result.
///
/// Best-effort enrichment only: the result assembler treats every failure
/// here as a signal to use the local generator instead.
#[derive(Clone)]
pub struct NarrativeClient {
    client: Client,
    config: Option<NarrativeConfig>,
}

impl NarrativeClient {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(NarrativeConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<NarrativeConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    /// Request a narrative for a scored result.
    ///
    /// # Errors
    ///
    /// Returns `NarrativeError` when the service is disabled, the request
    /// fails or times out, or the response is empty.
    pub async fn generate(
        &self,
        test_type: TestType,
        primary_type: &DimensionId,
        secondary_type: &DimensionId,
        scores: &DimensionScores,
    ) -> Result<Narrative, NarrativeError> {
        let config = self.config.as_ref().ok_or(NarrativeError::Disabled)?;

        let url = format!("{}/analyze", config.base_url.trim_end_matches('/'));
        let payload = AnalyzeRequest {
            test_type,
            model: config.model.clone(),
            primary_type: primary_type.to_string(),
            secondary_type: secondary_type.to_string(),
            scores: scores
                .iter()
                .map(|(id, score)| ScoreEntry {
                    dimension: id.to_string(),
                    score,
                })
                .collect(),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .timeout(config.timeout)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(NarrativeError::HttpStatus(response.status()));
        }

        let body: AnalyzeResponse = response.json().await?;
        body.into_narrative()
    }
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest {
    test_type: TestType,
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    primary_type: String,
    secondary_type: String,
    scores: Vec<ScoreEntry>,
}

#[derive(Debug, Serialize)]
struct ScoreEntry {
    dimension: String,
    score: f64,
}

#[derive(Debug, Deserialize)]
struct AnalyzeResponse {
    interpretation: Option<String>,
    recommendations: Option<String>,
    strengths: Option<String>,
    areas_for_growth: Option<String>,
}

impl AnalyzeResponse {
    fn into_narrative(self) -> Result<Narrative, NarrativeError> {
        let field = |value: Option<String>| {
            value
                .filter(|v| !v.trim().is_empty())
                .ok_or(NarrativeError::EmptyResponse)
        };
        Ok(Narrative {
            interpretation: field(self.interpretation)?,
            recommendations: field(self.recommendations)?,
            strengths: field(self.strengths)?,
            areas_for_growth: field(self.areas_for_growth)?,
        })
    }
}
