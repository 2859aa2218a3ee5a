use std::sync::Arc;
use std::time::{Duration, Instant};
use std::collections::HashMap;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::Config;
use crate::websocket::connection::{ConnectionId, ConnectionManager};
use quiz_core::{
    AdvanceOutcome, AnalyticsEngine, AnswerResolution, PowerUpEffect, QuestionBank, QuizEvent,
    QuizEventHandler, QuizSession, TickOutcome, overlay_mastery,
};
use quiz_persistence::StoreRepository;
use quiz_types::{
    AnalyticsReport, PersonalRecords, PowerUpKind, ServerMessage, SessionError, SessionSnapshot,
    SessionSummary, StoredPerformance,
};

/// Forwards audio and speech events straight into the connection's
/// outgoing channel. Nothing in the session ever waits on playback.
struct AudioRelay {
    sender: tokio::sync::mpsc::UnboundedSender<ServerMessage>,
}

impl QuizEventHandler for AudioRelay {
    fn handle_event(&mut self, event: QuizEvent) {
        let message = match event {
            QuizEvent::SoundRequested { kind } => ServerMessage::PlaySound { kind },
            QuizEvent::SpeakRequested { text, rate } => ServerMessage::Speak { text, rate },
            _ => return,
        };
        let _ = self.sender.send(message);
    }
}

struct ActiveSession {
    session: QuizSession,
    ticker: Option<JoinHandle<()>>,
    reveal_task: Option<JoinHandle<()>>,
    last_activity: Instant,
}

impl ActiveSession {
    fn cancel_reveal(&mut self) {
        if let Some(task) = self.reveal_task.take() {
            task.abort();
        }
    }

    fn cancel_tasks(&mut self) {
        self.cancel_reveal();
        if let Some(task) = self.ticker.take() {
            task.abort();
        }
    }

    fn update_activity(&mut self) {
        self.last_activity = Instant::now();
    }

    fn is_expired(&self, timeout: Duration) -> bool {
        self.last_activity.elapsed() > timeout
    }
}

/// One quiz session per WebSocket connection.
///
/// All three trigger classes (timer ticks, answers, power-ups) are
/// serialized through the sessions lock, so at most one resolution can
/// happen per question. The ticker and the reveal delay are held as task
/// handles and aborted whenever a transition supersedes them.
pub struct SessionManager {
    sessions: RwLock<HashMap<ConnectionId, ActiveSession>>,
    bank: QuestionBank,
    store: Arc<StoreRepository>,
    connection_manager: Arc<ConnectionManager>,
    config: Config,
}

impl SessionManager {
    pub fn new(
        bank: QuestionBank,
        store: Arc<StoreRepository>,
        connection_manager: Arc<ConnectionManager>,
        config: Config,
    ) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            bank,
            store,
            connection_manager,
            config,
        }
    }

    /// Draws a fresh question sequence and opens the first question.
    pub async fn start_session(
        self: &Arc<Self>,
        connection_id: ConnectionId,
    ) -> Result<(), SessionError> {
        if self.bank.is_empty() {
            return Err(SessionError::EmptyQuestionSet);
        }
        {
            let sessions = self.sessions.read().await;
            if sessions.contains_key(&connection_id) {
                return Err(SessionError::SessionAlreadyActive);
            }
        }

        // Stored state is best effort; a broken store never blocks a session
        let records = match self.store.load_records().await {
            Ok(records) => records,
            Err(e) => {
                warn!("Failed to load personal records, starting from zero: {}", e);
                PersonalRecords::default()
            }
        };
        let mastery = match self.store.load_mastery().await {
            Ok(levels) => levels,
            Err(e) => {
                warn!("Failed to load mastery levels, starting fresh: {}", e);
                HashMap::new()
            }
        };

        let mut questions = self
            .bank
            .draw_session(self.config.session_length, &mut rand::thread_rng());
        overlay_mastery(&mut questions, &mastery);

        let mut session = QuizSession::new(questions, records, self.config.session_rules())
            .map_err(|_| SessionError::EmptyQuestionSet)?;

        if let Some(sender) = self.connection_manager.sender(connection_id).await {
            session.event_bus.add_handler(Box::new(AudioRelay { sender }));
        }

        session
            .start()
            .map_err(|_| SessionError::SessionAlreadyActive)?;

        let ticker = self.spawn_ticker(connection_id);
        let snapshot = session.snapshot();

        {
            let mut sessions = self.sessions.write().await;
            sessions.insert(
                connection_id,
                ActiveSession {
                    session,
                    ticker: Some(ticker),
                    reveal_task: None,
                    last_activity: Instant::now(),
                },
            );
        }

        info!("Started session for connection {}", connection_id);
        self.send(connection_id, ServerMessage::SessionState { snapshot })
            .await;
        Ok(())
    }

    fn spawn_ticker(self: &Arc<Self>, connection_id: ConnectionId) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first interval tick completes immediately; skip it so the
            // countdown starts a full second after the question opens
            interval.tick().await;
            loop {
                interval.tick().await;
                manager.tick(connection_id).await;
            }
        })
    }

    /// One countdown step for a connection's session. Public so tests can
    /// drive the clock by hand.
    pub async fn tick(self: &Arc<Self>, connection_id: ConnectionId) {
        let mut sessions = self.sessions.write().await;
        let Some(active) = sessions.get_mut(&connection_id) else {
            return;
        };

        match active.session.tick() {
            TickOutcome::Idle => {}
            TickOutcome::Counting { .. } => {
                let snapshot = active.session.snapshot();
                self.send(connection_id, ServerMessage::SessionState { snapshot })
                    .await;
            }
            TickOutcome::TimedOut(resolution) => {
                self.after_resolution(connection_id, active, resolution)
                    .await;
            }
        }
    }

    /// Resolves the open question against the player's chosen option.
    /// Answers that arrive during the reveal window are dropped silently.
    pub async fn submit_answer(
        self: &Arc<Self>,
        connection_id: ConnectionId,
        option: String,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let Some(active) = sessions.get_mut(&connection_id) else {
            return Ok(());
        };
        active.update_activity();

        let Some(resolution) = active.session.submit_answer(&option) else {
            return Ok(());
        };
        self.after_resolution(connection_id, active, resolution)
            .await;
        Ok(())
    }

    async fn after_resolution(
        self: &Arc<Self>,
        connection_id: ConnectionId,
        active: &mut ActiveSession,
        resolution: AnswerResolution,
    ) {
        // Records are written the moment they are beaten, not at game end
        if resolution.record_broken {
            let records = active.session.records;
            let store = Arc::clone(&self.store);
            tokio::spawn(async move {
                if let Err(e) = store.save_records(&records).await {
                    warn!("Failed to persist personal records: {}", e);
                }
            });
        }

        let message = ServerMessage::AnswerResolved {
            correct: resolution.event.is_correct,
            correct_answer: resolution.event.correct_answer.clone(),
            points_earned: resolution.event.points_earned,
            snapshot: active.session.snapshot(),
        };
        self.send(connection_id, message).await;
        self.schedule_reveal(connection_id, active);
    }

    /// Schedules the advance that follows the reveal window, replacing any
    /// pending one.
    fn schedule_reveal(self: &Arc<Self>, connection_id: ConnectionId, active: &mut ActiveSession) {
        active.cancel_reveal();

        let manager = Arc::clone(self);
        let delay = Duration::from_secs(self.config.reveal_delay_seconds);
        active.reveal_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.finish_reveal(connection_id).await;
        }));
    }

    /// Moves past the revealed question: next question or the results
    /// screen. Public so tests can skip the reveal delay.
    pub async fn finish_reveal(self: &Arc<Self>, connection_id: ConnectionId) {
        let mut sessions = self.sessions.write().await;
        let Some(active) = sessions.get_mut(&connection_id) else {
            return;
        };
        active.reveal_task = None;

        match active.session.advance() {
            AdvanceOutcome::Next { .. } => {
                let snapshot = active.session.snapshot();
                self.send(connection_id, ServerMessage::SessionState { snapshot })
                    .await;
            }
            AdvanceOutcome::Finished { summary, report } => {
                self.complete_session(connection_id, active, summary, report)
                    .await;
            }
            AdvanceOutcome::Ignored => {}
        }
    }

    async fn complete_session(
        &self,
        connection_id: ConnectionId,
        active: &mut ActiveSession,
        summary: SessionSummary,
        report: AnalyticsReport,
    ) {
        let records = active.session.records;
        // finalStreak is the streak standing when the run ended; the max
        // lives in the summary and the records
        let stored = StoredPerformance {
            ledger: active.session.ledger.clone(),
            session_end_time: chrono::Utc::now().to_rfc3339(),
            final_score: summary.final_score,
            final_streak: active.session.streak,
        };
        let mastery = active.session.mastery_levels();

        // Best effort; a storage failure never reaches the player
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            if !stored.ledger.is_empty() {
                if let Err(e) = store.save_performance(&stored).await {
                    warn!("Failed to persist session performance: {}", e);
                }
            }
            if let Err(e) = store.save_mastery(&mastery).await {
                warn!("Failed to persist mastery levels: {}", e);
            }
            if let Err(e) = store.save_records(&records).await {
                warn!("Failed to persist personal records: {}", e);
            }
        });

        info!(
            "Session complete for connection {}: score {} over {} questions",
            connection_id, summary.final_score, summary.questions_total
        );
        self.send(
            connection_id,
            ServerMessage::SessionComplete {
                summary,
                report,
                records,
            },
        )
        .await;
    }

    /// Spends a power-up charge. Exhausted charges and closed question
    /// windows are silent no-ops.
    pub async fn use_power_up(
        self: &Arc<Self>,
        connection_id: ConnectionId,
        kind: PowerUpKind,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let Some(active) = sessions.get_mut(&connection_id) else {
            return Ok(());
        };
        active.update_activity();

        let Some(effect) = active.session.use_power_up(kind) else {
            return Ok(());
        };
        let remaining = active.session.power_ups.charges(kind);
        let snapshot = active.session.snapshot();
        self.send(
            connection_id,
            ServerMessage::PowerUpApplied {
                kind,
                remaining,
                snapshot,
            },
        )
        .await;

        // A skip on the last question ends the run like a normal advance
        if let PowerUpEffect::Skipped(AdvanceOutcome::Finished { summary, report }) = effect {
            self.complete_session(connection_id, active, summary, report)
                .await;
        }
        Ok(())
    }

    /// Results screen straight back into a fresh run.
    pub async fn restart(
        self: &Arc<Self>,
        connection_id: ConnectionId,
    ) -> Result<(), SessionError> {
        let mut sessions = self.sessions.write().await;
        let Some(active) = sessions.get_mut(&connection_id) else {
            return Err(SessionError::NoActiveSession);
        };
        active.update_activity();
        active.cancel_reveal();

        active
            .session
            .restart()
            .map_err(|_| SessionError::NotInResults)?;

        let snapshot = active.session.snapshot();
        self.send(connection_id, ServerMessage::SessionState { snapshot })
            .await;
        Ok(())
    }

    /// Tears the session down and shows the menu again.
    pub async fn return_to_menu(self: &Arc<Self>, connection_id: ConnectionId) {
        let removed = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(&connection_id)
        };
        let Some(mut active) = removed else {
            return;
        };
        active.cancel_tasks();

        let snapshot = SessionSnapshot::menu(
            active.session.records,
            active.session.questions.len() as u32,
        );
        self.send(connection_id, ServerMessage::SessionState { snapshot })
            .await;
    }

    /// Replays the current question over text-to-speech.
    pub async fn speak_question(self: &Arc<Self>, connection_id: ConnectionId, rate: f32) {
        let mut sessions = self.sessions.write().await;
        if let Some(active) = sessions.get_mut(&connection_id) {
            active.session.speak_current_question(rate);
        }
    }

    pub async fn handle_disconnect(&self, connection_id: ConnectionId) {
        let mut sessions = self.sessions.write().await;
        if let Some(mut active) = sessions.remove(&connection_id) {
            active.cancel_tasks();
            info!("Dropped session for disconnected connection {}", connection_id);
        }
    }

    /// Removes sessions nothing has touched for longer than the timeout.
    /// Expiry is checked under the write lock so an answer or power-up
    /// landing in parallel keeps its session alive.
    pub async fn cleanup_abandoned_sessions(&self, timeout: Duration) {
        let mut sessions = self.sessions.write().await;
        let expired: Vec<ConnectionId> = sessions
            .iter()
            .filter(|(_, active)| active.is_expired(timeout))
            .map(|(id, _)| *id)
            .collect();

        for connection_id in expired {
            if let Some(mut active) = sessions.remove(&connection_id) {
                active.cancel_tasks();
                info!("Removed abandoned session for connection {}", connection_id);
            }
        }
    }

    /// Report over the last persisted session, with mastery taken from the
    /// stored map. None until a session has been completed.
    pub async fn stored_report(&self) -> Option<AnalyticsReport> {
        let stored = self.store.load_performance().await.ok()??;
        let mastery = self.store.load_mastery().await.unwrap_or_default();

        let mut questions = self.bank.questions().to_vec();
        overlay_mastery(&mut questions, &mastery);
        Some(AnalyticsEngine::generate_report(&stored.ledger, &questions))
    }

    // Test helper
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.read().await;
        sessions.len()
    }

    async fn send(&self, connection_id: ConnectionId, message: ServerMessage) {
        if let Err(e) = self
            .connection_manager
            .send_to_connection(connection_id, message)
            .await
        {
            warn!("Failed to send message to {}: {}", connection_id, e);
        }
    }
}
