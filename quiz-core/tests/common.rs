use quiz_core::{QuizEvent, QuizEventHandler, QuizSession, SessionRules};
use quiz_types::{Difficulty, PersonalRecords, QuestionRecord};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Creates a deterministic question with a recognizable correct answer
pub fn test_question(index: usize, difficulty: Difficulty) -> QuestionRecord {
    QuestionRecord {
        id: Uuid::new_v4(),
        question: format!("Question {}", index),
        correct: format!("Correct {}", index),
        options: vec![
            format!("Correct {}", index),
            format!("Wrong A{}", index),
            format!("Wrong B{}", index),
            format!("Wrong C{}", index),
        ],
        difficulty,
        mastery_level: 0,
    }
}

/// Creates `count` medium questions
pub fn test_questions(count: usize) -> Vec<QuestionRecord> {
    (0..count)
        .map(|i| test_question(i, Difficulty::Medium))
        .collect()
}

/// Creates a seeded session that is still on the menu screen
pub fn menu_session(questions: Vec<QuestionRecord>) -> QuizSession {
    QuizSession::with_seed(
        questions,
        PersonalRecords::default(),
        SessionRules::default(),
        42,
    )
    .unwrap()
}

/// Creates a seeded session with the first question open
pub fn playing_session(count: usize) -> QuizSession {
    let mut session = menu_session(test_questions(count));
    session.start().unwrap();
    session
}

/// The correct answer text for the session's current question
pub fn correct_answer(session: &QuizSession) -> String {
    session.questions[session.question_index].correct.clone()
}

/// Answers the current question correctly and returns the points earned
pub fn answer_correctly(session: &mut QuizSession) -> u32 {
    let answer = correct_answer(session);
    let resolution = session.submit_answer(&answer).unwrap();
    resolution.event.points_earned.unwrap_or(0)
}

/// Answers the current question incorrectly
pub fn answer_wrong(session: &mut QuizSession) {
    session.submit_answer("not even close").unwrap();
}

/// Event collector for testing event emissions
#[derive(Clone)]
pub struct EventCollector {
    events: Arc<Mutex<Vec<QuizEvent>>>,
}

impl EventCollector {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn get_events(&self) -> Vec<QuizEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn last_event(&self) -> Option<QuizEvent> {
        self.events.lock().unwrap().last().cloned()
    }

    pub fn event_count(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn has_event(&self, check_fn: impl Fn(&QuizEvent) -> bool) -> bool {
        self.events.lock().unwrap().iter().any(check_fn)
    }
}

impl QuizEventHandler for EventCollector {
    fn handle_event(&mut self, event: QuizEvent) {
        self.events.lock().unwrap().push(event);
    }
}

/// Attaches a fresh collector to the session's event bus
pub fn attach_collector(session: &mut QuizSession) -> EventCollector {
    let collector = EventCollector::new();
    session.event_bus.add_handler(Box::new(collector.clone()));
    collector
}
