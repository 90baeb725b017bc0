use tuvung_backend_rust::game::{CreateSessionInput, GameError, SubmitAnswerInput};

mod common;

fn level_input() -> CreateSessionInput {
    CreateSessionInput {
        source_language_id: common::SOURCE_LANGUAGE,
        target_language_id: common::TARGET_LANGUAGE,
        mode: "level".to_string(),
        level_id: Some(common::LEVEL_ID),
        topic_ids: vec![],
    }
}

#[tokio::test]
async fn create_session_generates_the_requested_question_count() {
    let service = common::build_game_service(10, 5);

    let session = service
        .create_session(level_input(), common::TEST_USER_ID)
        .await
        .unwrap();

    assert_eq!(session.total_questions, 5);
    assert_eq!(session.correct_questions, 0);
    assert!(session.ended_at.is_none());

    let (_, questions, options) = service
        .get_session_with_questions(session.id, common::TEST_USER_ID)
        .await
        .unwrap();
    assert_eq!(questions.len(), 5);
    assert_eq!(options.len(), 20);
}

#[tokio::test]
async fn create_session_with_too_small_pool_is_insufficient() {
    let service = common::build_game_service(1, 5);

    let err = service
        .create_session(level_input(), common::TEST_USER_ID)
        .await
        .unwrap_err();

    assert!(matches!(err, GameError::InsufficientWords));
}

#[tokio::test]
async fn answers_drive_statistics_three_of_five_is_sixty_percent() {
    let service = common::build_game_service(10, 5);

    let session = service
        .create_session(level_input(), common::TEST_USER_ID)
        .await
        .unwrap();
    let (_, questions, options) = service
        .get_session_with_questions(session.id, common::TEST_USER_ID)
        .await
        .unwrap();

    // Answer correctly for the first three questions, wrongly for the rest.
    for (index, question) in questions.iter().enumerate() {
        let question_options: Vec<_> = options
            .iter()
            .filter(|o| o.question_id == question.id)
            .collect();
        let pick = if index < 3 {
            question_options.iter().find(|o| o.is_correct).unwrap()
        } else {
            question_options.iter().find(|o| !o.is_correct).unwrap()
        };

        let answer = service
            .submit_answer(
                session.id,
                common::TEST_USER_ID,
                SubmitAnswerInput {
                    question_id: question.id,
                    selected_option_id: pick.id,
                    response_time_ms: Some(500),
                },
            )
            .await
            .unwrap();
        assert_eq!(answer.is_correct, index < 3);
    }

    let ended = service
        .end_session(session.id, common::TEST_USER_ID)
        .await
        .unwrap();
    assert!(ended.ended_at.is_some());

    let stats = service
        .session_statistics(session.id, common::TEST_USER_ID)
        .await
        .unwrap();
    assert_eq!(stats.total_questions, 5);
    assert_eq!(stats.correct_answers, 3);
    assert_eq!(stats.wrong_answers, 2);
    assert!((stats.accuracy_percentage - 60.0).abs() < f64::EPSILON);
    assert!((stats.average_response_time_ms - 500.0).abs() < f64::EPSILON);
}

#[tokio::test]
async fn correct_count_never_exceeds_total() {
    let service = common::build_game_service(10, 5);

    let session = service
        .create_session(level_input(), common::TEST_USER_ID)
        .await
        .unwrap();
    let (_, questions, options) = service
        .get_session_with_questions(session.id, common::TEST_USER_ID)
        .await
        .unwrap();

    for question in &questions {
        let correct = options
            .iter()
            .find(|o| o.question_id == question.id && o.is_correct)
            .unwrap();
        service
            .submit_answer(
                session.id,
                common::TEST_USER_ID,
                SubmitAnswerInput {
                    question_id: question.id,
                    selected_option_id: correct.id,
                    response_time_ms: None,
                },
            )
            .await
            .unwrap();
    }

    let (refreshed, _, _) = service
        .get_session_with_questions(session.id, common::TEST_USER_ID)
        .await
        .unwrap();
    assert_eq!(refreshed.correct_questions, refreshed.total_questions);
}

#[tokio::test]
async fn duplicate_answer_is_a_conflict() {
    let service = common::build_game_service(10, 5);

    let session = service
        .create_session(level_input(), common::TEST_USER_ID)
        .await
        .unwrap();
    let (_, questions, options) = service
        .get_session_with_questions(session.id, common::TEST_USER_ID)
        .await
        .unwrap();

    let question = &questions[0];
    let option = options
        .iter()
        .find(|o| o.question_id == question.id)
        .unwrap();
    let input = SubmitAnswerInput {
        question_id: question.id,
        selected_option_id: option.id,
        response_time_ms: None,
    };

    service
        .submit_answer(session.id, common::TEST_USER_ID, input.clone())
        .await
        .unwrap();

    let err = service
        .submit_answer(session.id, common::TEST_USER_ID, input)
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::AnswerAlreadySubmitted { .. }));
}

#[tokio::test]
async fn racing_duplicate_answers_let_exactly_one_through() {
    let service = common::build_game_service(10, 5);

    let session = service
        .create_session(level_input(), common::TEST_USER_ID)
        .await
        .unwrap();
    let (_, questions, options) = service
        .get_session_with_questions(session.id, common::TEST_USER_ID)
        .await
        .unwrap();

    let question = &questions[0];
    let option = options
        .iter()
        .find(|o| o.question_id == question.id)
        .unwrap();
    let input = SubmitAnswerInput {
        question_id: question.id,
        selected_option_id: option.id,
        response_time_ms: None,
    };

    let (first, second) = tokio::join!(
        service.submit_answer(session.id, common::TEST_USER_ID, input.clone()),
        service.submit_answer(session.id, common::TEST_USER_ID, input),
    );

    let accepted = [first.is_ok(), second.is_ok()]
        .iter()
        .filter(|ok| **ok)
        .count();
    assert_eq!(accepted, 1);
    let rejected = [first, second]
        .into_iter()
        .find(Result::is_err)
        .unwrap()
        .unwrap_err();
    assert!(matches!(rejected, GameError::AnswerAlreadySubmitted { .. }));

    let stats = service
        .session_statistics(session.id, common::TEST_USER_ID)
        .await
        .unwrap();
    assert_eq!(stats.correct_answers + stats.wrong_answers, 1);
}

#[tokio::test]
async fn nonpositive_response_time_is_rejected() {
    let service = common::build_game_service(10, 5);

    let session = service
        .create_session(level_input(), common::TEST_USER_ID)
        .await
        .unwrap();
    let (_, questions, options) = service
        .get_session_with_questions(session.id, common::TEST_USER_ID)
        .await
        .unwrap();
    let option = options
        .iter()
        .find(|o| o.question_id == questions[0].id)
        .unwrap();

    let err = service
        .submit_answer(
            session.id,
            common::TEST_USER_ID,
            SubmitAnswerInput {
                question_id: questions[0].id,
                selected_option_id: option.id,
                response_time_ms: Some(0),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::Validation {
            field: "responseTimeMs",
            ..
        }
    ));
}

#[tokio::test]
async fn other_users_cannot_touch_the_session() {
    let service = common::build_game_service(10, 5);

    let session = service
        .create_session(level_input(), common::TEST_USER_ID)
        .await
        .unwrap();

    let err = service
        .end_session(session.id, common::OTHER_USER_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::Forbidden { .. }));

    let err = service
        .session_statistics(session.id, common::OTHER_USER_ID)
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::Forbidden { .. }));
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let service = common::build_game_service(10, 5);

    let err = service
        .end_session(9999, common::TEST_USER_ID)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        GameError::SessionNotFound { session_id: 9999 }
    ));
}

#[tokio::test]
async fn end_session_is_idempotent() {
    let service = common::build_game_service(10, 5);

    let session = service
        .create_session(level_input(), common::TEST_USER_ID)
        .await
        .unwrap();

    let first = service
        .end_session(session.id, common::TEST_USER_ID)
        .await
        .unwrap();
    let second = service
        .end_session(session.id, common::TEST_USER_ID)
        .await
        .unwrap();

    assert_eq!(first.ended_at, second.ended_at);
}

#[tokio::test]
async fn question_from_another_session_is_rejected() {
    let service = common::build_game_service(10, 5);

    let first = service
        .create_session(level_input(), common::TEST_USER_ID)
        .await
        .unwrap();
    let second = service
        .create_session(level_input(), common::TEST_USER_ID)
        .await
        .unwrap();

    let (_, questions, options) = service
        .get_session_with_questions(second.id, common::TEST_USER_ID)
        .await
        .unwrap();
    let option = options
        .iter()
        .find(|o| o.question_id == questions[0].id)
        .unwrap();

    let err = service
        .submit_answer(
            first.id,
            common::TEST_USER_ID,
            SubmitAnswerInput {
                question_id: questions[0].id,
                selected_option_id: option.id,
                response_time_ms: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, GameError::QuestionNotInSession { .. }));
}
