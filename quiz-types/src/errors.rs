use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Session-level errors that are reported to the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum SessionError {
    EmptyQuestionSet,
    SessionAlreadyActive,
    NoActiveSession,
    NotInResults,
}

impl SessionError {
    pub fn message(&self) -> &'static str {
        match self {
            SessionError::EmptyQuestionSet => "no questions are loaded",
            SessionError::SessionAlreadyActive => "a session is already in progress",
            SessionError::NoActiveSession => "no session is in progress",
            SessionError::NotInResults => "restart is only available from the results screen",
        }
    }
}
