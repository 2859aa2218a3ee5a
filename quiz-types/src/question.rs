use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Mastery levels run 0..=5 per question
pub const MASTERY_LEVEL_MAX: u8 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Default for Difficulty {
    fn default() -> Self {
        Difficulty::Easy
    }
}

/// Authoritative question record as loaded from a question file.
/// Records missing an id or difficulty get defaults so older files stay loadable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionRecord {
    #[serde(default = "Uuid::new_v4")]
    pub id: Uuid,
    pub question: String,
    pub correct: String,
    pub options: Vec<String>,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default)]
    pub mastery_level: u8,
}

/// Safe version of QuestionRecord that doesn't expose the correct answer
/// Options are in current display order (shuffled, possibly reduced by a power-up)
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct QuestionView {
    pub id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub difficulty: Difficulty,
    pub mastery_level: u8,
}
