use crate::{AdvanceOutcome, QuizEvent, QuizSession};
use quiz_types::{PowerUpKind, SessionPhase, SoundKind};

pub const EXTRA_TIME_BONUS_SECONDS: u32 = 10;

/// What applying a power-up did to the session
#[derive(Debug, Clone)]
pub enum PowerUpEffect {
    /// Skip advanced past the question without touching lives or streak
    Skipped(AdvanceOutcome),
    TimeExtended {
        time_left: u32,
    },
    /// Fifty-fifty removed up to two incorrect options from display
    OptionsReduced {
        removed: Vec<String>,
    },
}

impl QuizSession {
    /// Spend a charge and apply the power-up.
    /// Returns None without side effects when no charge remains or no
    /// question is open for input.
    pub fn use_power_up(&mut self, kind: PowerUpKind) -> Option<PowerUpEffect> {
        if self.phase != SessionPhase::Playing || self.result_revealed {
            return None;
        }
        if self.question_index >= self.questions.len() {
            return None;
        }
        if !self.power_ups.consume(kind) {
            return None;
        }

        self.event_bus.publish(QuizEvent::SoundRequested {
            kind: SoundKind::PowerUp,
        });
        self.event_bus.publish(QuizEvent::PowerUpUsed {
            kind,
            remaining: self.power_ups.charges(kind),
        });

        let effect = match kind {
            PowerUpKind::Skip => PowerUpEffect::Skipped(self.advance()),
            PowerUpKind::ExtraTime => {
                // Bonus seconds never push past the full question budget
                self.time_left =
                    (self.time_left + EXTRA_TIME_BONUS_SECONDS).min(self.rules.question_time_limit);
                PowerUpEffect::TimeExtended {
                    time_left: self.time_left,
                }
            }
            PowerUpKind::FiftyFifty => {
                let correct = self.questions[self.question_index].correct.clone();
                let removed: Vec<String> = self
                    .display_options
                    .iter()
                    .filter(|option| **option != correct)
                    .take(2)
                    .cloned()
                    .collect();
                self.display_options.retain(|option| !removed.contains(option));
                PowerUpEffect::OptionsReduced { removed }
            }
        };

        Some(effect)
    }
}
