use crate::{AnalyticsEngine, QuizEvent, QuizEventBus, ScoringEngine};
use anyhow::{Result, anyhow};
use quiz_types::{
    AnalyticsReport, AnswerEvent, MASTERY_LEVEL_MAX, PerformanceLedger, PersonalRecords,
    PowerUpInventory, QuestionRecord, QuestionView, SessionPhase, SessionSnapshot, SessionSummary,
    SoundKind,
};
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

pub type SessionId = Uuid;

pub const STARTING_LIVES: i32 = 3;
pub const QUESTION_TIME_LIMIT_SECONDS: u32 = 25;
pub const REVEAL_DELAY_SECONDS: u64 = 2;
pub const POWER_UP_CHARGES: u32 = 2;
pub const DEFAULT_SESSION_LENGTH: usize = 30;
pub const DEFAULT_SPEECH_RATE: f32 = 1.0;

/// Tunable per-session rules; defaults match the classic game
#[derive(Debug, Clone)]
pub struct SessionRules {
    pub question_time_limit: u32,
    pub starting_lives: i32,
    pub power_up_charges: u32,
}

impl Default for SessionRules {
    fn default() -> Self {
        Self {
            question_time_limit: QUESTION_TIME_LIMIT_SECONDS,
            starting_lives: STARTING_LIVES,
            power_up_charges: POWER_UP_CHARGES,
        }
    }
}

/// What a resolved answer did to the session
#[derive(Debug, Clone)]
pub struct AnswerResolution {
    pub event: AnswerEvent,
    pub record_broken: bool,
}

/// Result of one timer tick
#[derive(Debug, Clone)]
pub enum TickOutcome {
    /// Timer is not running (menu, results, or reveal window)
    Idle,
    Counting {
        time_left: u32,
    },
    /// Timer hit zero and the question resolved as a miss
    TimedOut(AnswerResolution),
}

/// Result of moving past a resolved (or skipped) question
#[derive(Debug, Clone)]
pub enum AdvanceOutcome {
    Next {
        index: usize,
    },
    Finished {
        summary: SessionSummary,
        report: AnalyticsReport,
    },
    /// Advance arrived after the session already left the playing phase
    Ignored,
}

/// One player's run through a drawn question sequence.
///
/// All transitions are synchronous; the caller owns the clock and feeds
/// `tick()` once per second while a question is open.
pub struct QuizSession {
    pub id: SessionId,
    pub questions: Vec<QuestionRecord>,
    pub rules: SessionRules,
    pub phase: SessionPhase,
    pub question_index: usize,
    pub score: u32,
    pub streak: u32,
    pub max_streak: u32,
    pub lives: i32,
    pub power_ups: PowerUpInventory,
    pub time_left: u32,
    pub selected_answer: Option<String>,
    pub result_revealed: bool,
    pub last_answer_correct: Option<bool>,
    /// Options of the current question in display order
    pub display_options: Vec<String>,
    pub ledger: PerformanceLedger,
    pub records: PersonalRecords,
    pub event_bus: QuizEventBus,
    rng: StdRng,
}

impl QuizSession {
    pub fn new(
        questions: Vec<QuestionRecord>,
        records: PersonalRecords,
        rules: SessionRules,
    ) -> Result<Self> {
        Self::with_rng(questions, records, rules, StdRng::from_entropy())
    }

    /// Deterministic variant for tests
    pub fn with_seed(
        questions: Vec<QuestionRecord>,
        records: PersonalRecords,
        rules: SessionRules,
        seed: u64,
    ) -> Result<Self> {
        Self::with_rng(questions, records, rules, StdRng::seed_from_u64(seed))
    }

    fn with_rng(
        questions: Vec<QuestionRecord>,
        records: PersonalRecords,
        rules: SessionRules,
        rng: StdRng,
    ) -> Result<Self> {
        if questions.is_empty() {
            return Err(anyhow!("Cannot create a session with no questions"));
        }

        Ok(Self {
            id: Uuid::new_v4(),
            phase: SessionPhase::Menu,
            question_index: 0,
            score: 0,
            streak: 0,
            max_streak: 0,
            lives: rules.starting_lives,
            power_ups: PowerUpInventory::new(rules.power_up_charges),
            time_left: 0,
            selected_answer: None,
            result_revealed: false,
            last_answer_correct: None,
            display_options: Vec::new(),
            ledger: PerformanceLedger::default(),
            records,
            event_bus: QuizEventBus::new(),
            rng,
            questions,
            rules,
        })
    }

    /// Leave the menu and open the first question
    pub fn start(&mut self) -> Result<()> {
        if self.phase != SessionPhase::Menu {
            return Err(anyhow!("Session already started"));
        }
        self.begin_run();
        Ok(())
    }

    /// Jump from the results screen straight into a fresh run.
    /// Mastery levels earned so far carry over; everything else resets.
    pub fn restart(&mut self) -> Result<()> {
        if self.phase != SessionPhase::Results {
            return Err(anyhow!("Restart is only available from the results screen"));
        }
        self.begin_run();
        Ok(())
    }

    fn begin_run(&mut self) {
        self.question_index = 0;
        self.score = 0;
        self.streak = 0;
        self.max_streak = 0;
        self.lives = self.rules.starting_lives;
        self.power_ups = PowerUpInventory::new(self.rules.power_up_charges);
        self.ledger = PerformanceLedger::default();
        self.phase = SessionPhase::Playing;

        self.event_bus.publish(QuizEvent::SessionStarted {
            questions_total: self.questions.len(),
        });
        self.begin_question();
    }

    /// Reset the per-question view for the question at `question_index`
    fn begin_question(&mut self) {
        self.time_left = self.rules.question_time_limit;
        self.selected_answer = None;
        self.result_revealed = false;
        self.last_answer_correct = None;

        let mut options = self.questions[self.question_index].options.clone();
        options.shuffle(&mut self.rng);
        self.display_options = options;

        let text = self.questions[self.question_index].question.clone();
        self.event_bus.publish(QuizEvent::SpeakRequested {
            text,
            rate: DEFAULT_SPEECH_RATE,
        });
    }

    pub fn return_to_menu(&mut self) {
        self.phase = SessionPhase::Menu;
        self.selected_answer = None;
        self.result_revealed = false;
        self.last_answer_correct = None;
    }

    pub fn current_question(&self) -> Option<&QuestionRecord> {
        if self.phase != SessionPhase::Playing {
            return None;
        }
        self.questions.get(self.question_index)
    }

    /// Count down one second. Resolves the question as a miss when the
    /// timer reaches zero; idles while no question window is open.
    pub fn tick(&mut self) -> TickOutcome {
        if self.phase != SessionPhase::Playing || self.result_revealed {
            return TickOutcome::Idle;
        }

        if self.time_left == 0 {
            // A zero-second budget times out on the first tick
            return TickOutcome::TimedOut(self.resolve_answer(None));
        }

        self.time_left -= 1;
        if self.time_left == 0 {
            TickOutcome::TimedOut(self.resolve_answer(None))
        } else {
            TickOutcome::Counting {
                time_left: self.time_left,
            }
        }
    }

    /// Resolve the open question against a chosen option.
    /// Returns None without side effects when no question is open for input.
    pub fn submit_answer(&mut self, option: &str) -> Option<AnswerResolution> {
        if self.phase != SessionPhase::Playing || self.result_revealed {
            debug!("Ignoring answer outside an open question window");
            return None;
        }
        if self.question_index >= self.questions.len() {
            return None;
        }

        self.event_bus.publish(QuizEvent::SoundRequested {
            kind: SoundKind::Click,
        });
        Some(self.resolve_answer(Some(option)))
    }

    /// The single resolution path shared by answers and timeouts
    fn resolve_answer(&mut self, answer: Option<&str>) -> AnswerResolution {
        let index = self.question_index;
        let is_correct = answer
            .map(|a| a == self.questions[index].correct)
            .unwrap_or(false);

        self.result_revealed = true;
        self.last_answer_correct = Some(is_correct);
        self.selected_answer = answer.map(|a| a.to_string());

        let streak_before = self.streak;
        let points_earned = if is_correct {
            Some(ScoringEngine::points_for_answer(
                self.time_left,
                streak_before,
            ))
        } else {
            None
        };

        if is_correct {
            self.score += points_earned.unwrap_or(0);
            self.streak += 1;
            self.max_streak = self.max_streak.max(self.streak);
            self.event_bus.publish(QuizEvent::SoundRequested {
                kind: SoundKind::Correct,
            });
        } else {
            self.streak = 0;
            self.lives -= 1;
            self.event_bus.publish(QuizEvent::SoundRequested {
                kind: SoundKind::Wrong,
            });
        }

        let mastery_level_after = {
            let question = &mut self.questions[index];
            question.mastery_level = if is_correct {
                question.mastery_level.saturating_add(1)
            } else {
                question.mastery_level.saturating_sub(1)
            }
            .min(MASTERY_LEVEL_MAX);
            question.mastery_level
        };

        let question = &self.questions[index];
        let event = AnswerEvent {
            question: question.question.clone(),
            user_answer: answer.map(|a| a.to_string()),
            correct_answer: question.correct.clone(),
            is_correct,
            difficulty: question.difficulty,
            mastery_level_after,
            timestamp: chrono::Utc::now().to_rfc3339(),
            time_left_at_answer: self.time_left,
            streak_after: self.streak,
            points_earned,
        };

        AnalyticsEngine::record_outcome(&mut self.ledger, event.clone());

        let record_broken = self.records.report_candidate(self.score, self.streak);
        if record_broken {
            self.event_bus.publish(QuizEvent::RecordBroken {
                records: self.records,
            });
        }

        self.event_bus
            .publish(QuizEvent::AnswerResolved { event: event.clone() });

        AnswerResolution {
            event,
            record_broken,
        }
    }

    /// Move past the current question once its outcome has been shown,
    /// or immediately for a skip. Routes to the results screen when the
    /// sequence is exhausted or no lives remain.
    pub fn advance(&mut self) -> AdvanceOutcome {
        if self.phase != SessionPhase::Playing {
            return AdvanceOutcome::Ignored;
        }

        if self.question_index + 1 < self.questions.len() && self.lives >= 1 {
            self.question_index += 1;
            self.event_bus.publish(QuizEvent::QuestionAdvanced {
                index: self.question_index,
            });
            self.begin_question();
            AdvanceOutcome::Next {
                index: self.question_index,
            }
        } else {
            self.finish()
        }
    }

    fn finish(&mut self) -> AdvanceOutcome {
        self.phase = SessionPhase::Results;

        let questions_answered =
            ((self.question_index + 1).min(self.questions.len())) as u32;
        let summary = SessionSummary {
            final_score: self.score,
            max_streak: self.max_streak,
            questions_answered,
            questions_total: self.questions.len() as u32,
            rating: ScoringEngine::rating(self.score, self.questions.len()).to_string(),
        };
        let report = AnalyticsEngine::generate_report(&self.ledger, &self.questions);

        self.event_bus.publish(QuizEvent::SessionCompleted {
            summary: summary.clone(),
        });

        AdvanceOutcome::Finished { summary, report }
    }

    /// Replay the current question aloud at the requested speech rate.
    /// Returns false when no question is on screen.
    pub fn speak_current_question(&mut self, rate: f32) -> bool {
        let Some(question) = self.current_question() else {
            return false;
        };
        let text = question.question.clone();
        self.event_bus
            .publish(QuizEvent::SpeakRequested { text, rate });
        true
    }

    /// Mastery levels for every question in this session's draw
    pub fn mastery_levels(&self) -> HashMap<Uuid, u8> {
        self.questions
            .iter()
            .map(|q| (q.id, q.mastery_level))
            .collect()
    }

    /// Client-safe view of the session
    pub fn snapshot(&self) -> SessionSnapshot {
        let question = self.current_question().map(|q| QuestionView {
            id: q.id,
            question: q.question.clone(),
            options: self.display_options.clone(),
            difficulty: q.difficulty,
            mastery_level: q.mastery_level,
        });

        SessionSnapshot {
            phase: self.phase,
            question_index: self.question_index as u32,
            questions_total: self.questions.len() as u32,
            question,
            score: self.score,
            streak: self.streak,
            max_streak: self.max_streak,
            lives: self.lives,
            time_left: self.time_left,
            power_ups: self.power_ups,
            selected_answer: self.selected_answer.clone(),
            result_revealed: self.result_revealed,
            last_answer_correct: self.last_answer_correct,
            records: self.records,
        }
    }
}
