use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::question::QuestionView;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SessionPhase {
    Menu,    // Start screen, no live question
    Playing, // Question sequence in progress
    Results, // Terminal summary screen
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum PowerUpKind {
    Skip,
    ExtraTime,
    FiftyFifty,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PowerUpInventory {
    pub skip: u32,
    pub extra_time: u32,
    pub fifty_fifty: u32,
}

impl PowerUpInventory {
    pub fn new(charges: u32) -> Self {
        PowerUpInventory {
            skip: charges,
            extra_time: charges,
            fifty_fifty: charges,
        }
    }

    pub fn charges(&self, kind: PowerUpKind) -> u32 {
        match kind {
            PowerUpKind::Skip => self.skip,
            PowerUpKind::ExtraTime => self.extra_time,
            PowerUpKind::FiftyFifty => self.fifty_fifty,
        }
    }

    /// Spends one charge, returning false when none remain
    pub fn consume(&mut self, kind: PowerUpKind) -> bool {
        let slot = match kind {
            PowerUpKind::Skip => &mut self.skip,
            PowerUpKind::ExtraTime => &mut self.extra_time,
            PowerUpKind::FiftyFifty => &mut self.fifty_fifty,
        };
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }
}

/// Sounds the client is asked to play; actual playback happens client-side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SoundKind {
    Correct,
    Wrong,
    Click,
    PowerUp,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PersonalRecords {
    pub highest_score: u32,
    pub highest_streak: u32,
}

impl PersonalRecords {
    /// Feed a live score/streak pair into the records.
    /// Updates whichever record the pair beats and reports whether anything improved.
    pub fn report_candidate(&mut self, score: u32, streak: u32) -> bool {
        let mut improved = false;
        if score > self.highest_score {
            self.highest_score = score;
            improved = true;
        }
        if streak > self.highest_streak {
            self.highest_streak = streak;
            improved = true;
        }
        improved
    }
}

/// Safe snapshot of a quiz session that doesn't expose correct answers
/// Sent to clients after every state change
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub question_index: u32,
    pub questions_total: u32,
    pub question: Option<QuestionView>,
    pub score: u32,
    pub streak: u32,
    pub max_streak: u32,
    pub lives: i32,
    pub time_left: u32,
    pub power_ups: PowerUpInventory,
    pub selected_answer: Option<String>,
    pub result_revealed: bool,
    pub last_answer_correct: Option<bool>,
    pub records: PersonalRecords,
}

impl SessionSnapshot {
    /// Snapshot for a connection that has no live session yet
    pub fn menu(records: PersonalRecords, questions_total: u32) -> Self {
        SessionSnapshot {
            phase: SessionPhase::Menu,
            question_index: 0,
            questions_total,
            question: None,
            score: 0,
            streak: 0,
            max_streak: 0,
            lives: 0,
            time_left: 0,
            power_ups: PowerUpInventory::new(0),
            selected_answer: None,
            result_revealed: false,
            last_answer_correct: None,
            records,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SessionSummary {
    pub final_score: u32,
    pub max_streak: u32,
    pub questions_answered: u32,
    pub questions_total: u32,
    pub rating: String,
}
