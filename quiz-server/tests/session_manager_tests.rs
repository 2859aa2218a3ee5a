
use std::time::Duration;
use test_helpers::*;

use quiz_types::{PowerUpKind, ServerMessage, SessionError, SessionPhase};

// Long reveal delay keeps the scheduled advance out of the way so tests
// can step the session with finish_reveal() themselves.
const MANUAL_REVEAL: u64 = 300;

#[tokio::test]
async fn test_start_session_with_empty_bank_fails() {
    let harness = harness(0, MANUAL_REVEAL).await;

    let result = harness
        .session_manager
        .start_session(harness.connection_id)
        .await;

    assert_eq!(result, Err(SessionError::EmptyQuestionSet));
    assert_eq!(harness.session_manager.session_count().await, 0);
}

#[tokio::test]
async fn test_start_session_truncates_to_session_length() {
    let mut harness = harness(50, MANUAL_REVEAL).await;

    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();

    let messages = drain(&mut harness.receiver);
    let snapshot = messages
        .iter()
        .find_map(|m| match m {
            ServerMessage::SessionState { snapshot } => Some(snapshot.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(snapshot.questions_total, 30);
    assert_eq!(snapshot.phase, SessionPhase::Playing);
    assert_eq!(snapshot.lives, 3);
}

#[tokio::test]
async fn test_ticks_count_down_and_time_out() {
    let mut harness = harness(3, MANUAL_REVEAL).await;
    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();
    drain(&mut harness.receiver);

    for _ in 0..25 {
        harness.session_manager.tick(harness.connection_id).await;
    }

    let messages = drain(&mut harness.receiver);
    let resolved = messages
        .iter()
        .find_map(|m| match m {
            ServerMessage::AnswerResolved {
                correct, snapshot, ..
            } => Some((*correct, snapshot.clone())),
            _ => None,
        })
        .expect("Expected the timer to resolve the question");

    assert!(!resolved.0);
    assert_eq!(resolved.1.lives, 2);
    assert_eq!(resolved.1.streak, 0);
    assert!(resolved.1.result_revealed);

    // Once revealed, further ticks idle instead of resolving again
    harness.session_manager.tick(harness.connection_id).await;
    let extra = drain(&mut harness.receiver);
    assert!(!extra
        .iter()
        .any(|m| matches!(m, ServerMessage::AnswerResolved { .. })));
}

#[tokio::test]
async fn test_correct_answer_persists_broken_record() {
    let mut harness = harness(3, MANUAL_REVEAL).await;
    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();
    let messages = drain(&mut harness.receiver);
    let question = latest_question(&messages).unwrap();

    harness
        .session_manager
        .submit_answer(harness.connection_id, correct_answer_for(&question))
        .await
        .unwrap();

    let messages = drain(&mut harness.receiver);
    assert!(messages.iter().any(|m| matches!(
        m,
        ServerMessage::AnswerResolved { correct: true, points_earned: Some(140), .. }
    )));

    // The record write is fire-and-forget; give it a moment to land
    tokio::time::sleep(Duration::from_millis(50)).await;
    let records = harness.store.load_records().await.unwrap();
    assert_eq!(records.highest_score, 140);
    assert_eq!(records.highest_streak, 1);
}

#[tokio::test]
async fn test_answer_during_reveal_is_dropped() {
    let mut harness = harness(3, MANUAL_REVEAL).await;
    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();
    let messages = drain(&mut harness.receiver);
    let question = latest_question(&messages).unwrap();

    harness
        .session_manager
        .submit_answer(harness.connection_id, correct_answer_for(&question))
        .await
        .unwrap();
    drain(&mut harness.receiver);

    harness
        .session_manager
        .submit_answer(harness.connection_id, "anything".to_string())
        .await
        .unwrap();

    let messages = drain(&mut harness.receiver);
    assert!(!messages
        .iter()
        .any(|m| matches!(m, ServerMessage::AnswerResolved { .. })));
}

#[tokio::test]
async fn test_finish_reveal_advances_to_next_question() {
    let mut harness = harness(3, MANUAL_REVEAL).await;
    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();
    let messages = drain(&mut harness.receiver);
    let question = latest_question(&messages).unwrap();

    harness
        .session_manager
        .submit_answer(harness.connection_id, correct_answer_for(&question))
        .await
        .unwrap();
    drain(&mut harness.receiver);

    harness
        .session_manager
        .finish_reveal(harness.connection_id)
        .await;

    let messages = drain(&mut harness.receiver);
    let snapshot = messages
        .iter()
        .find_map(|m| match m {
            ServerMessage::SessionState { snapshot } => Some(snapshot.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(snapshot.question_index, 1);
    assert!(!snapshot.result_revealed);
    assert_eq!(snapshot.time_left, 25);
}

#[tokio::test]
async fn test_scheduled_reveal_fires_without_manual_stepping() {
    let mut harness = harness(2, 0).await;
    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();
    let messages = drain(&mut harness.receiver);
    let question = latest_question(&messages).unwrap();

    harness
        .session_manager
        .submit_answer(harness.connection_id, correct_answer_for(&question))
        .await
        .unwrap();

    // Zero reveal delay: the scheduled advance runs on its own
    tokio::time::sleep(Duration::from_millis(50)).await;

    let messages = drain(&mut harness.receiver);
    assert!(messages.iter().any(|m| matches!(
        m,
        ServerMessage::SessionState { snapshot } if snapshot.question_index == 1
    )));
}

#[tokio::test]
async fn test_session_completion_persists_everything() {
    let mut harness = harness(1, MANUAL_REVEAL).await;
    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();
    let messages = drain(&mut harness.receiver);
    let question = latest_question(&messages).unwrap();

    harness
        .session_manager
        .submit_answer(harness.connection_id, correct_answer_for(&question))
        .await
        .unwrap();
    harness
        .session_manager
        .finish_reveal(harness.connection_id)
        .await;

    let messages = drain(&mut harness.receiver);
    let (summary, report) = messages
        .iter()
        .find_map(|m| match m {
            ServerMessage::SessionComplete {
                summary, report, ..
            } => Some((summary.clone(), report.clone())),
            _ => None,
        })
        .expect("Expected the session to complete");

    assert_eq!(summary.final_score, 140);
    assert_eq!(summary.questions_answered, 1);
    assert_eq!(report.correct_answers, 1);
    assert_eq!(report.accuracy, 1.0);

    tokio::time::sleep(Duration::from_millis(50)).await;
    let stored = harness.store.load_performance().await.unwrap().unwrap();
    assert_eq!(stored.final_score, 140);
    // The streak standing at the end, not the historical best
    assert_eq!(stored.final_streak, 1);
    assert_eq!(stored.ledger.total_questions, 1);

    let mastery = harness.store.load_mastery().await.unwrap();
    assert_eq!(mastery.len(), 1);
    assert_eq!(*mastery.values().next().unwrap(), 1);

    let records = harness.store.load_records().await.unwrap();
    assert_eq!(records.highest_score, 140);

    // The analytics endpoint now has something to report
    let report = harness.session_manager.stored_report().await.unwrap();
    assert_eq!(report.total_questions, 1);
}

#[tokio::test]
async fn test_lives_exhaustion_ends_session_early() {
    let mut harness = harness(10, MANUAL_REVEAL).await;
    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();
    drain(&mut harness.receiver);

    for _ in 0..3 {
        harness
            .session_manager
            .submit_answer(harness.connection_id, "wrong on purpose".to_string())
            .await
            .unwrap();
        harness
            .session_manager
            .finish_reveal(harness.connection_id)
            .await;
    }

    let messages = drain(&mut harness.receiver);
    let summary = messages
        .iter()
        .find_map(|m| match m {
            ServerMessage::SessionComplete { summary, .. } => Some(summary.clone()),
            _ => None,
        })
        .expect("Expected lives to end the session");

    assert_eq!(summary.final_score, 0);
    assert_eq!(summary.questions_answered, 3);
    assert_eq!(summary.questions_total, 10);
}

#[tokio::test]
async fn test_skip_power_up_advances_without_penalty() {
    let mut harness = harness(3, MANUAL_REVEAL).await;
    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();
    drain(&mut harness.receiver);

    harness
        .session_manager
        .use_power_up(harness.connection_id, PowerUpKind::Skip)
        .await
        .unwrap();

    let messages = drain(&mut harness.receiver);
    let (remaining, snapshot) = messages
        .iter()
        .find_map(|m| match m {
            ServerMessage::PowerUpApplied {
                kind: PowerUpKind::Skip,
                remaining,
                snapshot,
            } => Some((*remaining, snapshot.clone())),
            _ => None,
        })
        .unwrap();

    assert_eq!(remaining, 1);
    assert_eq!(snapshot.question_index, 1);
    assert_eq!(snapshot.lives, 3);
    assert_eq!(snapshot.score, 0);
}

#[tokio::test]
async fn test_exhausted_power_up_is_silent() {
    let mut harness = harness(5, MANUAL_REVEAL).await;
    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();
    drain(&mut harness.receiver);

    for _ in 0..3 {
        harness
            .session_manager
            .use_power_up(harness.connection_id, PowerUpKind::ExtraTime)
            .await
            .unwrap();
    }

    let messages = drain(&mut harness.receiver);
    let applied = messages
        .iter()
        .filter(|m| matches!(m, ServerMessage::PowerUpApplied { .. }))
        .count();
    // Two charges, third use is a no-op
    assert_eq!(applied, 2);
}

#[tokio::test]
async fn test_restart_after_results() {
    let mut harness = harness(1, MANUAL_REVEAL).await;
    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();
    drain(&mut harness.receiver);

    harness
        .session_manager
        .submit_answer(harness.connection_id, "wrong on purpose".to_string())
        .await
        .unwrap();
    harness
        .session_manager
        .finish_reveal(harness.connection_id)
        .await;
    drain(&mut harness.receiver);

    harness
        .session_manager
        .restart(harness.connection_id)
        .await
        .unwrap();

    let messages = drain(&mut harness.receiver);
    let snapshot = messages
        .iter()
        .find_map(|m| match m {
            ServerMessage::SessionState { snapshot } => Some(snapshot.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(snapshot.phase, SessionPhase::Playing);
    assert_eq!(snapshot.question_index, 0);
    assert_eq!(snapshot.score, 0);
    assert_eq!(snapshot.lives, 3);
}

#[tokio::test]
async fn test_restart_mid_session_is_rejected() {
    let mut harness = harness(3, MANUAL_REVEAL).await;
    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();
    drain(&mut harness.receiver);

    let result = harness.session_manager.restart(harness.connection_id).await;
    assert_eq!(result, Err(SessionError::NotInResults));
}

#[tokio::test]
async fn test_return_to_menu_cancels_pending_reveal() {
    let mut harness = harness(3, 0).await;
    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();
    let messages = drain(&mut harness.receiver);
    let question = latest_question(&messages).unwrap();

    harness
        .session_manager
        .submit_answer(harness.connection_id, correct_answer_for(&question))
        .await
        .unwrap();
    harness
        .session_manager
        .return_to_menu(harness.connection_id)
        .await;
    drain(&mut harness.receiver);

    // The zero-delay reveal task was aborted along with the session, so
    // nothing advances a session that no longer exists
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(harness.session_manager.session_count().await, 0);
    let messages = drain(&mut harness.receiver);
    assert!(!messages.iter().any(|m| matches!(
        m,
        ServerMessage::SessionState { snapshot } if snapshot.phase == SessionPhase::Playing
    )));
}

#[tokio::test]
async fn test_stored_records_seed_new_sessions() {
    let mut harness = harness(3, MANUAL_REVEAL).await;
    harness
        .store
        .set("highestScore", "9000".to_string())
        .await
        .unwrap();
    harness
        .store
        .set("highestStreak", "12".to_string())
        .await
        .unwrap();

    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();

    let messages = drain(&mut harness.receiver);
    let snapshot = messages
        .iter()
        .find_map(|m| match m {
            ServerMessage::SessionState { snapshot } => Some(snapshot.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(snapshot.records.highest_score, 9000);
    assert_eq!(snapshot.records.highest_streak, 12);
}

#[tokio::test]
async fn test_cleanup_removes_abandoned_sessions() {
    let mut harness = harness(3, MANUAL_REVEAL).await;
    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();
    drain(&mut harness.receiver);
    assert_eq!(harness.session_manager.session_count().await, 1);

    tokio::time::sleep(Duration::from_millis(20)).await;
    harness
        .session_manager
        .cleanup_abandoned_sessions(Duration::from_millis(10))
        .await;

    assert_eq!(harness.session_manager.session_count().await, 0);
}

#[tokio::test]
async fn test_cleanup_spares_recently_active_sessions() {
    let mut harness = harness(3, MANUAL_REVEAL).await;
    harness
        .session_manager
        .start_session(harness.connection_id)
        .await
        .unwrap();
    drain(&mut harness.receiver);

    // An answer counts as activity, resetting the abandonment clock
    tokio::time::sleep(Duration::from_millis(30)).await;
    harness
        .session_manager
        .submit_answer(harness.connection_id, "wrong on purpose".to_string())
        .await
        .unwrap();
    harness
        .session_manager
        .cleanup_abandoned_sessions(Duration::from_millis(20))
        .await;

    assert_eq!(harness.session_manager.session_count().await, 1);
}
