//! Orchestration layer for the assessment subsystem: question sourcing,
//! the session state machine, scoring hand-off, and result assembly.

#![forbid(unsafe_code)]

pub mod error;
pub mod narrative;
pub mod question_source;
pub mod quiz_services;
pub mod session_manager;

pub use error::{NarrativeError, QuestionSourceError, SessionManagerError};
pub use narrative::{LocalNarrativeGenerator, NarrativeClient, NarrativeConfig, ResultAssembler};
pub use question_source::{CachedQuestionSource, QuestionSource, StaticQuestionSource};
pub use quiz_services::QuizServices;
pub use session_manager::SessionManager;

pub use quiz_core::Clock;
