mod answer;
mod ids;
mod instrument;
mod question;
mod result;
mod session;
mod test_type;

pub use answer::{AnswerError, AnswerValue, UserAnswer};
pub use ids::{DimensionId, OptionId, QuestionId, SessionId};
pub use instrument::{Dimension, InstrumentConfig, ValidationError};
pub use question::{
    AnswerOption, LIKERT_MAX, LIKERT_MIN, Question, standard_likert_options,
};
pub use result::{DimensionScores, Narrative, NarrativeSource, TestResult};
pub use session::{SessionStateError, SessionStatus, TestSession};
pub use test_type::{TestType, TestTypeError};
