use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{
    AnalyticsReport, PersonalRecords, PowerUpKind, SessionSnapshot, SessionSummary, SoundKind,
};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ClientMessage {
    StartSession,
    SubmitAnswer { option: String },
    UsePowerUp { kind: PowerUpKind },
    Restart,
    ReturnToMenu,
    SpeakQuestion { rate: f32 },
    Heartbeat,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum ServerMessage {
    SessionState { snapshot: SessionSnapshot },
    AnswerResolved {
        correct: bool,
        correct_answer: String,
        points_earned: Option<u32>,
        snapshot: SessionSnapshot,
    },
    PowerUpApplied { kind: PowerUpKind, remaining: u32, snapshot: SessionSnapshot },
    SessionComplete {
        summary: SessionSummary,
        report: AnalyticsReport,
        records: PersonalRecords,
    },
    PlaySound { kind: SoundKind },
    Speak { text: String, rate: f32 },
    Error { message: String },
}
