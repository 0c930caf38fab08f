//! HTTP control surface.
//!
//! - `POST {route_opened}` / `POST {route_closed}`: record a transition, then check
//! - `POST {route_check}`: check and notify
//! - `GET /status`: open-time against the threshold, no notifications
//!
//! The mutating routes accept `?timestamp=<unix seconds>` and answer
//! `202 Accepted` with the check report.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tokio::net::TcpListener;
use tracing::info;

use crate::error::{CoreError, Result};
use crate::minder::SharedMinder;
use crate::receivers::Notification;
use crate::storage::{ServerConfig, STATUS_ROUTE};
use crate::timeline::WindowStatus;

#[derive(Debug, Deserialize)]
struct TimestampQuery {
    timestamp: Option<i64>,
}

/// Body of `GET /status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    #[serde(flatten)]
    pub notification: Notification,
    /// Transitions still held in the timeline.
    pub transitions: usize,
    pub last_status: Option<WindowStatus>,
    pub last_transition_at: Option<i64>,
}

/// Build the control router for `minder`.
pub fn router(minder: SharedMinder, server: &ServerConfig) -> Router {
    Router::new()
        .route(&server.route_opened, post(opened))
        .route(&server.route_closed, post(closed))
        .route(&server.route_check, post(check))
        .route(STATUS_ROUTE, get(status))
        .with_state(minder)
}

/// Serve `app` on `listener` until `shutdown` resolves.
pub async fn serve<F>(listener: TcpListener, app: Router, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let addr = listener.local_addr()?;
    info!(%addr, "control server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| CoreError::Server(e.to_string()))
}

async fn opened(
    State(minder): State<SharedMinder>,
    Query(query): Query<TimestampQuery>,
) -> impl IntoResponse {
    let mut minder = minder.lock().await;
    minder.register_open(query.timestamp);
    let report = minder.check_and_notify().await;
    (StatusCode::ACCEPTED, Json(report))
}

async fn closed(
    State(minder): State<SharedMinder>,
    Query(query): Query<TimestampQuery>,
) -> impl IntoResponse {
    let mut minder = minder.lock().await;
    minder.register_close(query.timestamp);
    let report = minder.check_and_notify().await;
    (StatusCode::ACCEPTED, Json(report))
}

async fn check(State(minder): State<SharedMinder>) -> impl IntoResponse {
    let report = minder.lock().await.check_and_notify().await;
    (StatusCode::ACCEPTED, Json(report))
}

async fn status(State(minder): State<SharedMinder>) -> Json<StatusReport> {
    let mut minder = minder.lock().await;
    let notification = minder.status();
    let latest = minder.timeline().latest();
    Json(StatusReport {
        notification,
        transitions: minder.timeline().len(),
        last_status: latest.map(|(_, status)| status),
        last_transition_at: latest.map(|(ts, _)| ts),
    })
}
