//! Shared error types for the services crate.
//!
//! Errors that affect the answer set or session integrity always surface to
//! the caller; errors that only affect narrative richness are absorbed by the
//! local fallback generator and never block result delivery.

use thiserror::Error;

use quiz_core::model::{SessionStateError, TestType, ValidationError};
use quiz_core::scoring::ScoringError;

/// Errors emitted while fetching question sets.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionSourceError {
    #[error("no questions available for {0}")]
    NotFound(TestType),

    #[error("question fetch failed: {0}")]
    Network(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors emitted by the remote narrative client.
///
/// These never escape the result assembler; every variant routes to the
/// local fallback generator.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum NarrativeError {
    #[error("narrative service is not configured")]
    Disabled,

    #[error("narrative service returned an empty response")]
    EmptyResponse,

    #[error("narrative request failed with status {0}")]
    HttpStatus(reqwest::StatusCode),

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by the session manager.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionManagerError {
    #[error("no active session")]
    NoActiveSession,

    #[error("no resumable session for {0}")]
    NothingToResume(TestType),

    #[error(transparent)]
    InvalidState(#[from] SessionStateError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Questions(#[from] QuestionSourceError),

    #[error(transparent)]
    Scoring(#[from] ScoringError),
}
