use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

use crate::session_manager::SessionManager;
use crate::websocket::ConnectionManager;

pub mod config;
pub mod loader;
pub mod session_manager;
pub mod websocket;

fn with<T: Clone + Send>(value: T) -> impl Filter<Extract = (T,), Error = Infallible> + Clone {
    warp::any().map(move || value.clone())
}

pub fn create_routes(
    connection_manager: Arc<ConnectionManager>,
    session_manager: Arc<SessionManager>,
) -> impl Filter<Extract = impl warp::Reply, Error = warp::Rejection> + Clone {
    let websocket = warp::path("ws")
        .and(warp::ws())
        .and(with(connection_manager))
        .and(with(session_manager.clone()))
        .map(|ws: warp::ws::Ws, conn_mgr, session_mgr| {
            ws.on_upgrade(move |socket| websocket::handle_connection(socket, conn_mgr, session_mgr))
        });

    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    // Report over the last completed session
    let analytics = warp::path("analytics")
        .and(warp::get())
        .and(with(session_manager))
        .and_then(handle_analytics_request);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_headers(vec!["content-type"])
        .allow_methods(vec!["GET"]);

    websocket
        .or(health)
        .or(analytics)
        .with(cors)
        .with(warp::log("quiz_arena"))
}

async fn handle_analytics_request(
    session_manager: Arc<SessionManager>,
) -> Result<impl warp::Reply, warp::Rejection> {
    match session_manager.stored_report().await {
        Some(report) => Ok(warp::reply::with_status(
            warp::reply::json(&report),
            warp::http::StatusCode::OK,
        )),
        None => Ok(warp::reply::with_status(
            warp::reply::json(&serde_json::json!({
                "error": "No completed session recorded yet"
            })),
            warp::http::StatusCode::NOT_FOUND,
        )),
    }
}
