use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::answer::UserAnswer;
use crate::model::ids::SessionId;
use crate::model::test_type::TestType;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Errors raised when an operation is illegal for the session's current state.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionStateError {
    #[error("{operation} is not allowed while the session is {status}")]
    Invalid {
        operation: &'static str,
        status: SessionStatus,
    },
}

//
// ─── STATUS ───────────────────────────────────────────────────────────────────
//

/// Lifecycle state of a test session.
///
/// `NotStarted → InProgress ⇄ Paused → Finalizing → Completed`, with reset
/// reaching `NotStarted` from anywhere. `Finalizing` is the transient window
/// while scoring and narrative assembly run; answers are rejected there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    NotStarted,
    InProgress,
    Paused,
    Finalizing,
    Completed,
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionStatus::NotStarted => "not started",
            SessionStatus::InProgress => "in progress",
            SessionStatus::Paused => "paused",
            SessionStatus::Finalizing => "finalizing",
            SessionStatus::Completed => "completed",
        };
        write!(f, "{label}")
    }
}

//
// ─── TEST SESSION ─────────────────────────────────────────────────────────────
//

/// One user's passage through a questionnaire.
///
/// The session manager owns the live value; the progress store persists a
/// serialized copy for pause/resume and crash recovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSession {
    id: SessionId,
    test_type: TestType,
    status: SessionStatus,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    current_question_index: usize,
    answers: Vec<UserAnswer>,
    total_questions: usize,
    last_update_time: DateTime<Utc>,
}

impl TestSession {
    /// Starts a fresh session in `InProgress` at question 0.
    #[must_use]
    pub fn start(test_type: TestType, total_questions: usize, now: DateTime<Utc>) -> Self {
        Self {
            id: SessionId::generate(),
            test_type,
            status: SessionStatus::InProgress,
            started_at: now,
            ended_at: None,
            current_question_index: 0,
            answers: Vec::new(),
            total_questions,
            last_update_time: now,
        }
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn test_type(&self) -> TestType {
        self.test_type
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn current_question_index(&self) -> usize {
        self.current_question_index
    }

    #[must_use]
    pub fn answers(&self) -> &[UserAnswer] {
        &self.answers
    }

    #[must_use]
    pub fn total_questions(&self) -> usize {
        self.total_questions
    }

    #[must_use]
    pub fn last_update_time(&self) -> DateTime<Utc> {
        self.last_update_time
    }

    /// Fraction of questions answered, 0.0..=1.0.
    #[must_use]
    pub fn progress(&self) -> f64 {
        if self.total_questions == 0 {
            return 0.0;
        }
        self.answers.len() as f64 / self.total_questions as f64
    }

    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == SessionStatus::Completed
    }

    /// True when the session can still accept answers after recovery.
    #[must_use]
    pub fn is_resumable(&self) -> bool {
        matches!(
            self.status,
            SessionStatus::InProgress | SessionStatus::Paused
        )
    }

    /// Records the answer, replacing any earlier answer to the same question.
    ///
    /// Returns `true` if an earlier answer was replaced.
    pub fn upsert_answer(&mut self, answer: UserAnswer) -> bool {
        if let Some(existing) = self
            .answers
            .iter_mut()
            .find(|a| a.question_id == answer.question_id)
        {
            *existing = answer;
            true
        } else {
            self.answers.push(answer);
            false
        }
    }

    /// Moves to the next question, clamped at the last one.
    pub fn advance(&mut self) {
        if self.current_question_index + 1 < self.total_questions {
            self.current_question_index += 1;
        }
    }

    /// Moves to the previous question, clamped at the first one.
    pub fn go_back(&mut self) {
        self.current_question_index = self.current_question_index.saturating_sub(1);
    }

    /// Refreshes `last_update_time` before persisting.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_update_time = now;
    }

    /// `InProgress → Paused`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Invalid` unless the session is in progress.
    pub fn pause(&mut self) -> Result<(), SessionStateError> {
        self.transition("pause", SessionStatus::InProgress, SessionStatus::Paused)
    }

    /// `Paused → InProgress`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Invalid` unless the session is paused.
    pub fn resume(&mut self) -> Result<(), SessionStateError> {
        self.transition("resume", SessionStatus::Paused, SessionStatus::InProgress)
    }

    /// Enters the transient finalizing window; legal from `InProgress` or
    /// `Paused`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Invalid` for any other state.
    pub fn begin_finalizing(&mut self) -> Result<(), SessionStateError> {
        if !self.is_resumable() {
            return Err(SessionStateError::Invalid {
                operation: "end test",
                status: self.status,
            });
        }
        self.status = SessionStatus::Finalizing;
        Ok(())
    }

    /// Aborts finalization, returning the session to `InProgress`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Invalid` unless the session is finalizing.
    pub fn abort_finalizing(&mut self) -> Result<(), SessionStateError> {
        self.transition(
            "abort finalizing",
            SessionStatus::Finalizing,
            SessionStatus::InProgress,
        )
    }

    /// `Finalizing → Completed`, stamping `ended_at`.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Invalid` unless the session is finalizing.
    pub fn complete(&mut self, now: DateTime<Utc>) -> Result<(), SessionStateError> {
        self.transition("complete", SessionStatus::Finalizing, SessionStatus::Completed)?;
        self.ended_at = Some(now);
        self.last_update_time = now;
        Ok(())
    }

    /// Guards that answers may be recorded right now.
    ///
    /// # Errors
    ///
    /// Returns `SessionStateError::Invalid` unless the session is in progress.
    pub fn ensure_accepts_answers(&self) -> Result<(), SessionStateError> {
        if self.status == SessionStatus::InProgress {
            Ok(())
        } else {
            Err(SessionStateError::Invalid {
                operation: "submit answer",
                status: self.status,
            })
        }
    }

    fn transition(
        &mut self,
        operation: &'static str,
        from: SessionStatus,
        to: SessionStatus,
    ) -> Result<(), SessionStateError> {
        if self.status != from {
            return Err(SessionStateError::Invalid {
                operation,
                status: self.status,
            });
        }
        self.status = to;
        Ok(())
    }
}
