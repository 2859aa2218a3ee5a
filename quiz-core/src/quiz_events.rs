use quiz_types::{AnswerEvent, PersonalRecords, PowerUpKind, SessionSummary, SoundKind};

#[derive(Debug, Clone)]
pub enum QuizEvent {
    SessionStarted {
        questions_total: usize,
    },
    QuestionAdvanced {
        index: usize,
    },
    AnswerResolved {
        event: AnswerEvent,
    },
    PowerUpUsed {
        kind: PowerUpKind,
        remaining: u32,
    },
    RecordBroken {
        records: PersonalRecords,
    },
    SessionCompleted {
        summary: SessionSummary,
    },
    SoundRequested {
        kind: SoundKind,
    },
    SpeakRequested {
        text: String,
        rate: f32,
    },
}

/// Event handler trait for processing session events.
/// Handlers must be Send + Sync because sessions live behind shared
/// async locks and are driven from multiple tasks.
pub trait QuizEventHandler: Send + Sync {
    fn handle_event(&mut self, event: QuizEvent);
}

/// Simple event bus for distributing session events
pub struct QuizEventBus {
    handlers: Vec<Box<dyn QuizEventHandler>>,
}

impl QuizEventBus {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    pub fn add_handler(&mut self, handler: Box<dyn QuizEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn publish(&mut self, event: QuizEvent) {
        for handler in &mut self.handlers {
            handler.handle_event(event.clone());
        }
    }
}

impl Default for QuizEventBus {
    fn default() -> Self {
        Self::new()
    }
}
