use anyhow::{Context, Result};
use quiz_types::{MASTERY_LEVEL_MAX, QuestionRecord};
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use tracing::warn;
use uuid::Uuid;

/// Pool of playable questions that sessions draw from
pub struct QuestionBank {
    questions: Vec<QuestionRecord>,
}

impl QuestionBank {
    /// Build a bank from raw records, dropping any that can't be played
    pub fn new(records: Vec<QuestionRecord>) -> Self {
        let questions = records
            .into_iter()
            .filter(|record| {
                if record.options.len() != 4 {
                    warn!(
                        "Dropping question with {} options: {}",
                        record.options.len(),
                        record.question
                    );
                    return false;
                }
                if !record.options.contains(&record.correct) {
                    warn!(
                        "Dropping question whose answer is missing from its options: {}",
                        record.question
                    );
                    return false;
                }
                true
            })
            .map(|mut record| {
                if record.mastery_level > MASTERY_LEVEL_MAX {
                    warn!(
                        "Clamping mastery level {} to {} for question: {}",
                        record.mastery_level, MASTERY_LEVEL_MAX, record.question
                    );
                    record.mastery_level = MASTERY_LEVEL_MAX;
                }
                record
            })
            .collect();

        Self { questions }
    }

    /// Parse a question file in the JSON array format
    pub fn from_json(raw: &str) -> Result<Self> {
        let records: Vec<QuestionRecord> =
            serde_json::from_str(raw).context("Malformed question file")?;
        Ok(Self::new(records))
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[QuestionRecord] {
        &self.questions
    }

    /// Shuffled sample of at most `length` questions for one session
    pub fn draw_session(&self, length: usize, rng: &mut impl Rng) -> Vec<QuestionRecord> {
        let mut drawn = self.questions.clone();
        drawn.shuffle(rng);
        drawn.truncate(length);
        drawn
    }
}

/// Overlay previously earned mastery levels onto question copies
pub fn overlay_mastery(questions: &mut [QuestionRecord], levels: &HashMap<Uuid, u8>) {
    for question in questions.iter_mut() {
        if let Some(level) = levels.get(&question.id) {
            question.mastery_level = (*level).min(MASTERY_LEVEL_MAX);
        }
    }
}
