//! End-to-end flows through the wired subsystem: start, answer, pause,
//! resume, finish, and crash recovery over a file-backed store.

use std::sync::Arc;

use quiz_core::model::{
    AnswerValue, NarrativeSource, Question, QuestionId, SessionStatus, TestType,
};
use quiz_core::time::fixed_clock;
use services::{QuizServices, SessionManagerError, StaticQuestionSource};

fn love_language_questions() -> Vec<Question> {
    vec![
        Question::likert("ll-01", "Hearing 'I appreciate you' makes my day", "words_of_affirmation", 0),
        Question::likert("ll-02", "Compliments make me uncomfortable", "words_of_affirmation", 1)
            .reverse_scored(),
        Question::likert("ll-03", "Undivided attention matters more than gifts", "quality_time", 2),
        Question::likert("ll-04", "I plan one-on-one time deliberately", "quality_time", 3),
        Question::likert("ll-05", "A small surprise gift delights me", "receiving_gifts", 4),
        Question::likert("ll-06", "I keep gifts as reminders of people", "receiving_gifts", 5),
        Question::likert("ll-07", "Help with chores feels like love", "acts_of_service", 6),
        Question::likert("ll-08", "I show care by doing practical things", "acts_of_service", 7),
        Question::likert("ll-09", "A hug says more than words", "physical_touch", 8),
        Question::likert("ll-10", "I reach for a hand without thinking", "physical_touch", 9),
        Question::likert("ll-11", "Select 'agree' for this statement", "words_of_affirmation", 10)
            .neutral(),
    ]
}

fn source() -> Arc<StaticQuestionSource> {
    Arc::new(StaticQuestionSource::new().with_set(TestType::LoveLanguage, love_language_questions()))
}

fn answer(services: &mut QuizServices, id: &str, value: u8) {
    services
        .manager_mut()
        .submit_answer(QuestionId::new(id), AnswerValue::likert(value).unwrap())
        .unwrap();
}

#[tokio::test]
async fn full_flow_from_start_to_classified_result() {
    let mut services = QuizServices::in_memory(source(), fixed_clock());
    services
        .manager_mut()
        .start_test(TestType::LoveLanguage)
        .await
        .unwrap();
    assert_eq!(services.manager().status(), SessionStatus::InProgress);

    // Reverse-scored ll-02 answered 1 counts as 5 for its dimension.
    answer(&mut services, "ll-01", 5);
    answer(&mut services, "ll-02", 1);
    answer(&mut services, "ll-03", 4);
    answer(&mut services, "ll-04", 4);
    answer(&mut services, "ll-05", 1);

    // A break in the middle of the run.
    services.manager_mut().pause_test().unwrap();
    assert_eq!(services.manager().status(), SessionStatus::Paused);
    services.manager_mut().resume_test().unwrap();

    answer(&mut services, "ll-06", 1);
    answer(&mut services, "ll-07", 3);
    answer(&mut services, "ll-08", 3);
    answer(&mut services, "ll-09", 2);
    answer(&mut services, "ll-10", 2);
    answer(&mut services, "ll-11", 5); // neutral, must not skew anything

    let result = services.manager_mut().end_test().await.unwrap();
    assert_eq!(result.primary_type.as_str(), "words_of_affirmation");
    assert_eq!(result.secondary_type.as_str(), "quality_time");
    assert_eq!(result.scores.get(&"words_of_affirmation".into()), Some(5.0));
    assert_eq!(result.scores.get(&"quality_time".into()), Some(4.0));
    assert_eq!(result.scores.get(&"receiving_gifts".into()), Some(1.0));
    // No remote service configured in tests.
    assert_eq!(result.narrative_source, NarrativeSource::LocalFallback);

    assert_eq!(services.manager().status(), SessionStatus::Completed);
    assert!(services.manager().show_results());
    assert!(services.progress().get_all_progress().is_empty());
}

#[tokio::test]
async fn paused_session_survives_a_process_restart() {
    let dir = tempfile::tempdir().unwrap();
    let store = dir.path().join("quiz-store.json");

    {
        let mut services = QuizServices::file_backed(&store, source());
        services
            .manager_mut()
            .start_test(TestType::LoveLanguage)
            .await
            .unwrap();
        answer(&mut services, "ll-01", 5);
        answer(&mut services, "ll-02", 2);
        services.manager_mut().pause_test().unwrap();
    } // process "dies" here

    let mut services = QuizServices::file_backed(&store, source());
    let session = services
        .manager_mut()
        .resume_from_saved(TestType::LoveLanguage)
        .await
        .unwrap();
    assert_eq!(session.answers().len(), 2);
    assert_eq!(session.current_question_index(), 2);
    assert_eq!(session.status(), SessionStatus::Paused);

    services.manager_mut().resume_test().unwrap();
    for id in ["ll-03", "ll-04", "ll-05", "ll-06", "ll-07", "ll-08", "ll-09", "ll-10", "ll-11"] {
        answer(&mut services, id, 3);
    }
    let result = services.manager_mut().end_test().await.unwrap();
    assert_eq!(result.primary_type.as_str(), "words_of_affirmation");
}

#[tokio::test]
async fn rejected_inputs_leave_the_run_intact() {
    let mut services = QuizServices::in_memory(source(), fixed_clock());
    services
        .manager_mut()
        .start_test(TestType::LoveLanguage)
        .await
        .unwrap();

    let err = services
        .manager_mut()
        .submit_answer(QuestionId::new("not-a-question"), AnswerValue::likert(3).unwrap())
        .unwrap_err();
    assert!(matches!(err, SessionManagerError::Validation(_)));

    let err = services
        .manager_mut()
        .submit_answer(QuestionId::new("ll-01"), AnswerValue::Likert(0))
        .unwrap_err();
    assert!(matches!(err, SessionManagerError::Validation(_)));

    services.manager_mut().pause_test().unwrap();
    let err = services
        .manager_mut()
        .submit_answer(QuestionId::new("ll-01"), AnswerValue::likert(3).unwrap())
        .unwrap_err();
    assert!(matches!(err, SessionManagerError::InvalidState(_)));
    services.manager_mut().resume_test().unwrap();

    for (question, value) in [
        ("ll-01", 4), ("ll-02", 2), ("ll-03", 3), ("ll-04", 3), ("ll-05", 2),
        ("ll-06", 2), ("ll-07", 3), ("ll-08", 3), ("ll-09", 1), ("ll-10", 1),
        ("ll-11", 3),
    ] {
        answer(&mut services, question, value);
    }
    let result = services.manager_mut().end_test().await.unwrap();
    assert_eq!(result.primary_type.as_str(), "words_of_affirmation");
    assert_eq!(services.manager().status(), SessionStatus::Completed);
}

#[tokio::test]
async fn reset_allows_a_clean_second_attempt() {
    let mut services = QuizServices::in_memory(source(), fixed_clock());
    services
        .manager_mut()
        .start_test(TestType::LoveLanguage)
        .await
        .unwrap();
    answer(&mut services, "ll-01", 5);

    services.manager_mut().reset_test();
    assert_eq!(services.manager().status(), SessionStatus::NotStarted);
    assert!(services.progress().get_all_progress().is_empty());

    let session = services
        .manager_mut()
        .start_test(TestType::LoveLanguage)
        .await
        .unwrap();
    assert!(session.answers().is_empty());
}
