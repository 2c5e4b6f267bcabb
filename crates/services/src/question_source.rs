use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use tracing::debug;

use quiz_core::model::{InstrumentConfig, Question, TestType};
use storage::CacheService;

use crate::error::QuestionSourceError;

/// TTL for cached question sets.
const QUESTION_TTL_HOURS: i64 = 1;

/// Cache key for a question set within its per-type namespace.
const QUESTION_SET_KEY: &str = "question-set";

/// Supplies ordered question sets per test type.
///
/// The transport behind a source (HTTP, bundled data, CMS) is out of scope;
/// the session manager only depends on this contract.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch the question set for an instrument.
    ///
    /// # Errors
    ///
    /// Returns `QuestionSourceError::NotFound` when no questions resolve, or
    /// `QuestionSourceError::Network` for transport failures.
    async fn fetch_questions(
        &self,
        test_type: TestType,
    ) -> Result<Vec<Question>, QuestionSourceError>;
}

//
// ─── STATIC SOURCE ────────────────────────────────────────────────────────────
//

/// In-memory question source for bundled instruments and tests.
#[derive(Clone, Default)]
pub struct StaticQuestionSource {
    sets: HashMap<TestType, Vec<Question>>,
}

impl StaticQuestionSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_set(mut self, test_type: TestType, questions: Vec<Question>) -> Self {
        self.sets.insert(test_type, questions);
        self
    }
}

#[async_trait]
impl QuestionSource for StaticQuestionSource {
    async fn fetch_questions(
        &self,
        test_type: TestType,
    ) -> Result<Vec<Question>, QuestionSourceError> {
        match self.sets.get(&test_type) {
            Some(questions) if !questions.is_empty() => Ok(questions.clone()),
            _ => Err(QuestionSourceError::NotFound(test_type)),
        }
    }
}

//
// ─── CACHED SOURCE ────────────────────────────────────────────────────────────
//

/// Caches question sets from an inner source with a 1-hour TTL, one cache
/// namespace per test type.
///
/// Fetched sets are sorted by presentation order and validated against the
/// instrument's declared dimensions before they are served or cached, so a
/// typo'd dimension fails at load time rather than skewing scores later.
pub struct CachedQuestionSource {
    inner: Arc<dyn QuestionSource>,
    cache: CacheService,
}

impl CachedQuestionSource {
    #[must_use]
    pub fn new(inner: Arc<dyn QuestionSource>, cache: CacheService) -> Self {
        Self { inner, cache }
    }

    fn namespace(test_type: TestType) -> String {
        format!("questions-{}", test_type.slug())
    }

    /// Drops the cached set for one test type (e.g. after an instrument
    /// update).
    pub fn invalidate(&self, test_type: TestType) -> bool {
        self.cache.clear_namespace(&Self::namespace(test_type))
    }
}

#[async_trait]
impl QuestionSource for CachedQuestionSource {
    async fn fetch_questions(
        &self,
        test_type: TestType,
    ) -> Result<Vec<Question>, QuestionSourceError> {
        let namespace = Self::namespace(test_type);
        if let Some(cached) = self
            .cache
            .get::<Vec<Question>>(QUESTION_SET_KEY, Some(&namespace))
        {
            debug!(%test_type, count = cached.len(), "question set served from cache");
            return Ok(cached);
        }

        let mut questions = self.inner.fetch_questions(test_type).await?;
        if questions.is_empty() {
            return Err(QuestionSourceError::NotFound(test_type));
        }
        questions.sort_by_key(Question::order);

        let config = InstrumentConfig::for_test_type(test_type);
        config.validate_questions(&questions)?;

        self.cache.set(
            QUESTION_SET_KEY,
            &questions,
            Duration::hours(QUESTION_TTL_HOURS),
            Some(&namespace),
        );
        Ok(questions)
    }
}
