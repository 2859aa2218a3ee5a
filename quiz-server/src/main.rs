use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use quiz_core::QuestionBank;
use quiz_persistence::{StoreRepository, connection::connect_and_migrate};
use quiz_server::{
    config::Config, create_routes, loader::load_question_bank, session_manager::SessionManager,
    websocket::ConnectionManager,
};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    info!("Starting Quiz Arena server...");

    let config = Config::new();
    let connection_manager = Arc::new(ConnectionManager::new());

    let db = match connect_and_migrate().await {
        Ok(db) => db,
        Err(e) => {
            error!("Failed to connect to database and run migrations: {}", e);
            std::process::exit(1);
        }
    };
    let store = Arc::new(StoreRepository::new(db));

    // Question loading is allowed to fail; sessions just can't start until
    // a question source is fixed, and clients are told so
    let bank = match load_question_bank(&config).await {
        Ok(bank) => {
            info!("Question bank ready with {} questions", bank.len());
            bank
        }
        Err(e) => {
            error!("Failed to load questions: {}", e);
            error!("Set QUESTIONS_DIR (or QUESTIONS_URL) to a source containing questions.json.");
            QuestionBank::new(Vec::new())
        }
    };

    let session_manager = Arc::new(SessionManager::new(
        bank,
        store,
        connection_manager.clone(),
        config.clone(),
    ));

    let routes = create_routes(connection_manager.clone(), session_manager.clone());

    tokio::spawn(reap_idle(
        connection_manager,
        session_manager,
        config.clone(),
    ));

    let addr = (
        config
            .host
            .parse::<std::net::IpAddr>()
            .expect("Invalid HOST"),
        config.port,
    );
    let (addr, server) =
        warp::serve(routes).bind_with_graceful_shutdown(addr, shutdown_signal());

    info!("Listening on {}", addr);
    server.await;
    info!("Server shutdown complete.");
}

/// Periodic sweep over idle sockets and abandoned sessions
async fn reap_idle(
    connection_manager: Arc<ConnectionManager>,
    session_manager: Arc<SessionManager>,
    config: Config,
) {
    let connection_timeout = Duration::from_secs(config.connection_timeout_seconds);
    let session_timeout = Duration::from_secs(config.session_timeout_minutes * 60);

    let mut interval = tokio::time::interval(Duration::from_secs(30));
    loop {
        interval.tick().await;

        let removed = connection_manager
            .cleanup_inactive_connections(connection_timeout)
            .await;
        for connection_id in removed {
            session_manager.handle_disconnect(connection_id).await;
        }
        session_manager
            .cleanup_abandoned_sessions(session_timeout)
            .await;
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        let mut sigint = signal(SignalKind::interrupt()).expect("Failed to install SIGINT handler");
        let mut sigterm =
            signal(SignalKind::terminate()).expect("Failed to install SIGTERM handler");

        tokio::select! {
            _ = sigint.recv() => info!("Received SIGINT, shutting down gracefully..."),
            _ = sigterm.recv() => info!("Received SIGTERM, shutting down gracefully..."),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to listen for ctrl+c");
        info!("Received Ctrl+C, shutting down gracefully...");
    }
}
