use std::sync::Arc;

use tracing::{debug, info, warn};

use quiz_core::Clock;
use quiz_core::model::{
    AnswerValue, InstrumentConfig, Question, QuestionId, SessionStateError, SessionStatus,
    TestResult, TestSession, TestType, UserAnswer, ValidationError,
};
use quiz_core::scoring::score;
use storage::ProgressStore;

use crate::error::SessionManagerError;
use crate::narrative::ResultAssembler;
use crate::question_source::QuestionSource;

/// The active test: the session plus the question set and instrument
/// configuration it was started against.
struct ActiveTest {
    session: TestSession,
    questions: Vec<Question>,
    config: InstrumentConfig,
}

/// Finite-state machine orchestrating one active [`TestSession`].
///
/// `NotStarted → InProgress ⇄ Paused → Finalizing → Completed`, with
/// `reset_test` returning to `NotStarted` from anywhere. The manager owns
/// the live session exclusively; the progress store only ever sees
/// serialized snapshots.
///
/// Exactly one session is active per manager. Starting a different test
/// type replaces the in-memory session, but persisted progress for other
/// types stays retrievable until deleted or expired (namespace isolation,
/// not deletion).
pub struct SessionManager {
    clock: Clock,
    questions: Arc<dyn QuestionSource>,
    progress: ProgressStore,
    assembler: ResultAssembler,
    active: Option<ActiveTest>,
    current_result: Option<TestResult>,
    show_results: bool,
}

impl SessionManager {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionSource>,
        progress: ProgressStore,
        assembler: ResultAssembler,
    ) -> Self {
        Self {
            clock,
            questions,
            progress,
            assembler,
            active: None,
            current_result: None,
            show_results: false,
        }
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.active
            .as_ref()
            .map_or(SessionStatus::NotStarted, |a| a.session.status())
    }

    #[must_use]
    pub fn session(&self) -> Option<&TestSession> {
        self.active.as_ref().map(|a| &a.session)
    }

    /// The question at the session's current index.
    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        let active = self.active.as_ref()?;
        active
            .questions
            .get(active.session.current_question_index())
    }

    #[must_use]
    pub fn current_result(&self) -> Option<&TestResult> {
        self.current_result.as_ref()
    }

    #[must_use]
    pub fn show_results(&self) -> bool {
        self.show_results
    }

    /// Starts a new session for the given instrument.
    ///
    /// The question set must resolve (cached with a 1-hour TTL by the
    /// question source); any previously active session of another type is
    /// replaced in memory without touching its persisted progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionManagerError::Questions` when no questions resolve or
    /// the fetch fails.
    pub async fn start_test(
        &mut self,
        test_type: TestType,
    ) -> Result<&TestSession, SessionManagerError> {
        let questions = self.questions.fetch_questions(test_type).await?;
        let config = InstrumentConfig::for_test_type(test_type);

        let mut session = TestSession::start(test_type, questions.len(), self.clock.now());
        self.progress.save_progress(&mut session);
        info!(%test_type, session_id = %session.id(), total = questions.len(), "test started");

        self.current_result = None;
        self.show_results = false;
        let active = self.active.insert(ActiveTest {
            session,
            questions,
            config,
        });
        Ok(&active.session)
    }

    /// Rehydrates the most recent unfinished session for the instrument.
    ///
    /// # Errors
    ///
    /// Returns `SessionManagerError::NothingToResume` when no resumable
    /// record exists, or `SessionManagerError::Questions` when the question
    /// set cannot be fetched.
    pub async fn resume_from_saved(
        &mut self,
        test_type: TestType,
    ) -> Result<&TestSession, SessionManagerError> {
        let session = self
            .progress
            .find_resumable(test_type)
            .ok_or(SessionManagerError::NothingToResume(test_type))?;
        let questions = self.questions.fetch_questions(test_type).await?;
        let config = InstrumentConfig::for_test_type(test_type);
        info!(
            %test_type,
            session_id = %session.id(),
            answered = session.answers().len(),
            "recovered saved session"
        );

        self.current_result = None;
        self.show_results = false;
        let active = self.active.insert(ActiveTest {
            session,
            questions,
            config,
        });
        Ok(&active.session)
    }

    /// Records an answer for the active session.
    ///
    /// Legal only in `InProgress`. The answer must reference a question in
    /// the active set; Likert values must fall inside the scale bounds and
    /// choice values must name one of the question's declared options.
    /// Invalid answers are rejected without mutating the session.
    /// Resubmitting a question replaces the earlier answer without advancing
    /// the index twice.
    ///
    /// # Errors
    ///
    /// Returns `SessionManagerError::NoActiveSession`,
    /// `SessionManagerError::InvalidState`, or
    /// `SessionManagerError::Validation`.
    pub fn submit_answer(
        &mut self,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Result<(), SessionManagerError> {
        let active = self
            .active
            .as_mut()
            .ok_or(SessionManagerError::NoActiveSession)?;
        active.session.ensure_accepts_answers()?;

        let Some(question) = active.questions.iter().find(|q| q.id() == &question_id) else {
            return Err(ValidationError::UnknownQuestion {
                question: question_id,
            }
            .into());
        };
        match &value {
            // Re-validate the scale even for directly constructed values.
            AnswerValue::Likert(raw) => {
                AnswerValue::likert(*raw).map_err(ValidationError::from)?;
            }
            AnswerValue::Choice(option) => {
                if !question.options().iter().any(|o| o.id.as_str() == option) {
                    return Err(ValidationError::UnknownOption {
                        question: question_id,
                        option: option.clone(),
                    }
                    .into());
                }
            }
        }

        let answer = UserAnswer::new(question_id, value, self.clock.now());
        let replaced = active.session.upsert_answer(answer);
        if !replaced {
            active.session.advance();
        }
        self.progress.save_progress(&mut active.session);
        Ok(())
    }

    /// Moves to the next question; no-op at the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionManagerError::NoActiveSession` or
    /// `SessionManagerError::InvalidState` once the session stopped
    /// accepting interaction.
    pub fn go_to_next_question(&mut self) -> Result<usize, SessionManagerError> {
        let active = self.navigable_session()?;
        active.advance();
        Ok(active.current_question_index())
    }

    /// Moves to the previous question; no-op at the first one.
    ///
    /// # Errors
    ///
    /// Same conditions as [`Self::go_to_next_question`].
    pub fn go_to_previous_question(&mut self) -> Result<usize, SessionManagerError> {
        let active = self.navigable_session()?;
        active.go_back();
        Ok(active.current_question_index())
    }

    /// `InProgress → Paused`, answers untouched.
    ///
    /// # Errors
    ///
    /// Returns `SessionManagerError::NoActiveSession` or
    /// `SessionManagerError::InvalidState`.
    pub fn pause_test(&mut self) -> Result<(), SessionManagerError> {
        let active = self
            .active
            .as_mut()
            .ok_or(SessionManagerError::NoActiveSession)?;
        active.session.pause()?;
        self.progress.save_progress(&mut active.session);
        Ok(())
    }

    /// `Paused → InProgress`.
    ///
    /// # Errors
    ///
    /// Returns `SessionManagerError::NoActiveSession` or
    /// `SessionManagerError::InvalidState`.
    pub fn resume_test(&mut self) -> Result<(), SessionManagerError> {
        let active = self
            .active
            .as_mut()
            .ok_or(SessionManagerError::NoActiveSession)?;
        active.session.resume()?;
        self.progress.save_progress(&mut active.session);
        Ok(())
    }

    /// Scores the session and assembles the final result.
    ///
    /// Legal from `InProgress` or `Paused`. The session sits in the
    /// transient `Finalizing` state while this runs, so concurrent
    /// `submit_answer` calls are rejected. On scoring failure the session
    /// drops back to `InProgress` and the error surfaces; narrative
    /// failures never surface (local fallback). On success the session is
    /// `Completed`, its progress record is deleted, and `show_results` is
    /// set.
    ///
    /// # Errors
    ///
    /// Returns `SessionManagerError::NoActiveSession`,
    /// `SessionManagerError::InvalidState`, or
    /// `SessionManagerError::Scoring`.
    pub async fn end_test(&mut self) -> Result<&TestResult, SessionManagerError> {
        let active = self
            .active
            .as_mut()
            .ok_or(SessionManagerError::NoActiveSession)?;
        active.session.begin_finalizing()?;

        let report = match score(&active.config, &active.questions, active.session.answers()) {
            Ok(report) => report,
            Err(error) => {
                // No partial-completion state: fall back to InProgress.
                active.session.abort_finalizing()?;
                return Err(error.into());
            }
        };
        if report.skipped_answers > 0 {
            warn!(
                session_id = %active.session.id(),
                skipped = report.skipped_answers,
                "answers referenced questions missing from the active set"
            );
        }

        let now = self.clock.now();
        let result = self
            .assembler
            .assemble(active.session.id().clone(), &active.config, report, now)
            .await;

        active.session.complete(now)?;
        let test_type = active.session.test_type();
        self.progress
            .delete_progress(test_type, active.session.id());
        info!(%test_type, session_id = %active.session.id(), primary = %result.primary_type, "test completed");

        self.show_results = true;
        Ok(self.current_result.insert(result))
    }

    /// Clears the active session and its persisted progress, returning the
    /// manager to `NotStarted`. Reachable from any state.
    pub fn reset_test(&mut self) {
        if let Some(active) = self.active.take() {
            let test_type = active.session.test_type();
            let removed = self.progress.clear_test_type(test_type);
            debug!(%test_type, removed, "session reset");
        }
        self.current_result = None;
        self.show_results = false;
    }

    fn navigable_session(&mut self) -> Result<&mut TestSession, SessionManagerError> {
        let active = self
            .active
            .as_mut()
            .ok_or(SessionManagerError::NoActiveSession)?;
        if !active.session.is_resumable() {
            return Err(SessionStateError::Invalid {
                operation: "navigate",
                status: active.session.status(),
            }
            .into());
        }
        Ok(&mut active.session)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::{NarrativeClient, ResultAssembler};
    use crate::question_source::StaticQuestionSource;
    use quiz_core::model::NarrativeSource;
    use quiz_core::time::fixed_clock;
    use storage::{CacheService, MemoryBackend, ProgressStore};

    fn disc_questions() -> Vec<Question> {
        vec![
            Question::likert("d1", "I take charge", "dominance", 0),
            Question::likert("d2", "I persuade easily", "influence", 1),
            Question::likert("d3", "I avoid sudden change", "steadiness", 2),
            Question::likert("d4", "I double-check details", "conscientiousness", 3),
        ]
    }

    fn manager_with(backend: &MemoryBackend, clock: Clock) -> SessionManager {
        let cache = CacheService::new(Arc::new(backend.clone()), clock);
        let progress = ProgressStore::new(cache);
        let source =
            Arc::new(StaticQuestionSource::new().with_set(TestType::Disc, disc_questions()));
        SessionManager::new(
            clock,
            source,
            progress,
            ResultAssembler::new(NarrativeClient::new(None)),
        )
    }

    fn manager() -> SessionManager {
        manager_with(&MemoryBackend::new(), fixed_clock())
    }

    #[tokio::test]
    async fn start_requires_available_questions() {
        let mut manager = manager();
        let err = manager.start_test(TestType::Holland).await.unwrap_err();
        assert!(matches!(err, SessionManagerError::Questions(_)));
        assert_eq!(manager.status(), SessionStatus::NotStarted);
    }

    #[tokio::test]
    async fn start_creates_in_progress_session_at_index_zero() {
        let mut manager = manager();
        manager.start_test(TestType::Disc).await.unwrap();
        assert_eq!(manager.status(), SessionStatus::InProgress);
        let session = manager.session().unwrap();
        assert_eq!(session.current_question_index(), 0);
        assert_eq!(session.total_questions(), 4);
        assert_eq!(manager.current_question().unwrap().id().as_str(), "d1");
    }

    #[tokio::test]
    async fn submit_answer_validates_and_advances() {
        let mut manager = manager();
        manager.start_test(TestType::Disc).await.unwrap();

        manager
            .submit_answer(QuestionId::new("d1"), AnswerValue::likert(4).unwrap())
            .unwrap();
        let session = manager.session().unwrap();
        assert_eq!(session.answers().len(), 1);
        assert_eq!(session.current_question_index(), 1);

        let err = manager
            .submit_answer(QuestionId::new("nope"), AnswerValue::likert(3).unwrap())
            .unwrap_err();
        assert!(matches!(err, SessionManagerError::Validation(_)));

        let err = manager
            .submit_answer(QuestionId::new("d2"), AnswerValue::Likert(9))
            .unwrap_err();
        assert!(matches!(err, SessionManagerError::Validation(_)));
        // Rejected answers never mutate the session.
        assert_eq!(manager.session().unwrap().answers().len(), 1);
    }

    #[tokio::test]
    async fn choice_answers_must_name_a_declared_option() {
        let mut manager = manager();
        manager.start_test(TestType::Disc).await.unwrap();

        // Standard scale options carry "<question>-<value>" ids.
        manager
            .submit_answer(QuestionId::new("d1"), AnswerValue::Choice("d1-4".into()))
            .unwrap();
        assert_eq!(manager.session().unwrap().answers().len(), 1);

        let err = manager
            .submit_answer(QuestionId::new("d2"), AnswerValue::Choice("bogus".into()))
            .unwrap_err();
        assert!(matches!(err, SessionManagerError::Validation(_)));
        assert_eq!(manager.session().unwrap().answers().len(), 1);
    }

    #[tokio::test]
    async fn navigation_clamps_at_both_ends() {
        let mut manager = manager();
        manager.start_test(TestType::Disc).await.unwrap();

        assert_eq!(manager.go_to_previous_question().unwrap(), 0);
        for _ in 0..10 {
            manager.go_to_next_question().unwrap();
        }
        assert_eq!(manager.session().unwrap().current_question_index(), 3);
    }

    #[tokio::test]
    async fn pause_blocks_answers_until_resume() {
        let mut manager = manager();
        manager.start_test(TestType::Disc).await.unwrap();
        manager.pause_test().unwrap();
        assert_eq!(manager.status(), SessionStatus::Paused);

        let err = manager
            .submit_answer(QuestionId::new("d1"), AnswerValue::likert(3).unwrap())
            .unwrap_err();
        assert!(matches!(err, SessionManagerError::InvalidState(_)));

        manager.resume_test().unwrap();
        manager
            .submit_answer(QuestionId::new("d1"), AnswerValue::likert(3).unwrap())
            .unwrap();
    }

    #[tokio::test]
    async fn end_test_scores_and_completes() {
        let mut manager = manager();
        manager.start_test(TestType::Disc).await.unwrap();
        for (id, value) in [("d1", 5), ("d2", 4), ("d3", 2), ("d4", 3)] {
            manager
                .submit_answer(QuestionId::new(id), AnswerValue::likert(value).unwrap())
                .unwrap();
        }

        let result = manager.end_test().await.unwrap();
        assert_eq!(result.primary_type.as_str(), "dominance");
        assert_eq!(result.secondary_type.as_str(), "influence");
        assert_eq!(result.narrative_source, NarrativeSource::LocalFallback);

        assert_eq!(manager.status(), SessionStatus::Completed);
        assert!(manager.show_results());
        assert!(manager.current_result().is_some());
    }

    #[tokio::test]
    async fn end_test_is_legal_from_paused() {
        let mut manager = manager();
        manager.start_test(TestType::Disc).await.unwrap();
        manager
            .submit_answer(QuestionId::new("d1"), AnswerValue::likert(5).unwrap())
            .unwrap();
        manager.pause_test().unwrap();

        manager.end_test().await.unwrap();
        assert_eq!(manager.status(), SessionStatus::Completed);
    }

    #[tokio::test]
    async fn completed_session_rejects_answers_without_mutation() {
        let mut manager = manager();
        manager.start_test(TestType::Disc).await.unwrap();
        manager
            .submit_answer(QuestionId::new("d1"), AnswerValue::likert(4).unwrap())
            .unwrap();
        manager.end_test().await.unwrap();

        let before = manager.session().unwrap().answers().to_vec();
        let err = manager
            .submit_answer(QuestionId::new("d2"), AnswerValue::likert(2).unwrap())
            .unwrap_err();
        assert!(matches!(err, SessionManagerError::InvalidState(_)));
        assert_eq!(manager.session().unwrap().answers(), before.as_slice());
    }

    #[tokio::test]
    async fn end_test_deletes_the_progress_record() {
        let backend = MemoryBackend::new();
        let mut manager = manager_with(&backend, fixed_clock());
        manager.start_test(TestType::Disc).await.unwrap();
        manager
            .submit_answer(QuestionId::new("d1"), AnswerValue::likert(4).unwrap())
            .unwrap();

        let progress =
            ProgressStore::new(CacheService::new(Arc::new(backend.clone()), fixed_clock()));
        assert_eq!(progress.get_all_progress().len(), 1);

        manager.end_test().await.unwrap();
        assert!(progress.get_all_progress().is_empty());
    }

    #[tokio::test]
    async fn reset_returns_to_not_started_and_clears_progress() {
        let backend = MemoryBackend::new();
        let mut manager = manager_with(&backend, fixed_clock());
        manager.start_test(TestType::Disc).await.unwrap();
        manager
            .submit_answer(QuestionId::new("d1"), AnswerValue::likert(4).unwrap())
            .unwrap();

        manager.reset_test();
        assert_eq!(manager.status(), SessionStatus::NotStarted);
        assert!(manager.current_result().is_none());
        assert!(!manager.show_results());

        let progress =
            ProgressStore::new(CacheService::new(Arc::new(backend.clone()), fixed_clock()));
        assert!(progress.get_all_progress().is_empty());
    }

    #[tokio::test]
    async fn saved_progress_can_be_resumed_by_a_fresh_manager() {
        let backend = MemoryBackend::new();
        let session_id;
        {
            let mut manager = manager_with(&backend, fixed_clock());
            manager.start_test(TestType::Disc).await.unwrap();
            manager
                .submit_answer(QuestionId::new("d1"), AnswerValue::likert(4).unwrap())
                .unwrap();
            manager
                .submit_answer(QuestionId::new("d2"), AnswerValue::likert(2).unwrap())
                .unwrap();
            session_id = manager.session().unwrap().id().clone();
        }

        // New manager over the same backend, as after a crash.
        let mut manager = manager_with(&backend, fixed_clock());
        let session = manager.resume_from_saved(TestType::Disc).await.unwrap();
        assert_eq!(session.id(), &session_id);
        assert_eq!(session.answers().len(), 2);
        assert_eq!(session.current_question_index(), 2);

        let err = manager
            .resume_from_saved(TestType::Holland)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SessionManagerError::NothingToResume(TestType::Holland)
        ));
    }

    #[tokio::test]
    async fn operations_without_a_session_fail_cleanly() {
        let mut manager = manager();
        assert!(matches!(
            manager
                .submit_answer(QuestionId::new("d1"), AnswerValue::likert(1).unwrap())
                .unwrap_err(),
            SessionManagerError::NoActiveSession
        ));
        assert!(matches!(
            manager.pause_test().unwrap_err(),
            SessionManagerError::NoActiveSession
        ));
        assert!(matches!(
            manager.end_test().await.unwrap_err(),
            SessionManagerError::NoActiveSession
        ));
    }
}
