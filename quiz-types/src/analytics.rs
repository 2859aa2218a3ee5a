use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::question::Difficulty;

/// One entry in the per-session answer history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AnswerEvent {
    pub question: String,
    pub user_answer: Option<String>, // None when the timer ran out
    pub correct_answer: String,
    pub is_correct: bool,
    pub difficulty: Difficulty,
    pub mastery_level_after: u8,
    pub timestamp: String, // ISO 8601 string
    pub time_left_at_answer: u32,
    pub streak_after: u32,
    pub points_earned: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AreaCount {
    pub question: String,
    pub count: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DifficultyBucket {
    pub correct: u32,
    pub total: u32,
}

impl DifficultyBucket {
    pub fn record(&mut self, is_correct: bool) {
        self.total += 1;
        if is_correct {
            self.correct += 1;
        }
    }

    /// Fraction of attempts answered correctly, 0.0 when nothing was attempted
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DifficultyBreakdown {
    pub easy: DifficultyBucket,
    pub medium: DifficultyBucket,
    pub hard: DifficultyBucket,
}

impl DifficultyBreakdown {
    pub fn bucket(&self, difficulty: Difficulty) -> &DifficultyBucket {
        match difficulty {
            Difficulty::Easy => &self.easy,
            Difficulty::Medium => &self.medium,
            Difficulty::Hard => &self.hard,
        }
    }

    pub fn bucket_mut(&mut self, difficulty: Difficulty) -> &mut DifficultyBucket {
        match difficulty {
            Difficulty::Easy => &mut self.easy,
            Difficulty::Medium => &mut self.medium,
            Difficulty::Hard => &mut self.hard,
        }
    }
}

/// Session-scoped answer ledger.
/// Weak/strong areas keep first-seen order so reports stay stable across
/// serialization round trips.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PerformanceLedger {
    pub total_questions: u32,
    pub correct_answers: u32,
    pub incorrect_answers: u32,
    pub weak_areas: Vec<AreaCount>,
    pub strong_areas: Vec<AreaCount>,
    pub difficulty_stats: DifficultyBreakdown,
    pub history: Vec<AnswerEvent>,
}

impl PerformanceLedger {
    pub fn is_empty(&self) -> bool {
        self.total_questions == 0
    }

    /// Overall fraction correct, 0.0 for an empty ledger
    pub fn accuracy(&self) -> f64 {
        if self.total_questions == 0 {
            0.0
        } else {
            self.correct_answers as f64 / self.total_questions as f64
        }
    }
}

/// Ledger plus end-of-session markers, as persisted between sessions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct StoredPerformance {
    pub ledger: PerformanceLedger,
    pub session_end_time: String, // ISO 8601 string
    pub final_score: u32,
    pub final_streak: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DifficultyAccuracy {
    pub easy: f64,
    pub medium: f64,
    pub hard: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum InsightKind {
    EasyProficiency,
    MediumProgress,
    EasyRemediation,
    HardReassurance,
    MasterySummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

/// Digest of a ledger for the results screen and the analytics endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct AnalyticsReport {
    pub total_questions: u32,
    pub correct_answers: u32,
    pub accuracy: f64,
    pub difficulty_accuracy: DifficultyAccuracy,
    pub weak_areas: Vec<AreaCount>,
    pub strong_areas: Vec<AreaCount>,
    pub mastery_percent: f64,
    pub insights: Vec<Insight>,
    pub recommendations: Vec<String>,
}
