//! Medtimer server - hosts one tracker session behind an HTTP API.
//!
//! Architecture:
//! - One server per user, tracked by PID/port files in ~/.medtimer
//! - The session lives in server memory; every mutation is serialised
//!   through a single async mutex
//! - CLI is a thin client that talks to the server via HTTP
//! - The dashboard page listens on /ws and refetches state on each change
//!
//! Endpoints:
//! - GET / - Dashboard UI
//! - GET /api/state - Derived dashboard view
//! - GET /api/snapshot - Raw session state
//! - POST /api/medications - Add a medication
//! - POST /api/medications/{id}/taken - Mark a dose taken
//! - DELETE /api/medications/{id} - Delete a medication
//! - POST /api/day - Start a new day
//! - DELETE /api/data - Clear everything
//! - POST /api/motivation - Toggle the motivation panel
//! - WS /ws - State-changed notifications

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State, WebSocketUpgrade},
    http::StatusCode,
    response::{Html, IntoResponse},
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, Mutex};
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::config::{self, DEFAULT_HISTORY_LIMIT, DEFAULT_PORT, PID_FILE, PORT_FILE};
use crate::models::time_format::parse_hhmm;
use crate::models::{MedicationForm, NewMedication};
use crate::snapshot;
use crate::tracker::{
    Clock, DashboardView, Notice, SessionState, SystemClock, Tracker, TrackerError, Transition,
};

/// Shared server state.
pub struct ServerState {
    /// The one session this server hosts.
    tracker: Mutex<Tracker>,
    /// Broadcast channel for state-changed notifications.
    tx: broadcast::Sender<StateChanged>,
}

impl ServerState {
    pub fn new(tracker: Tracker) -> Self {
        let (tx, _rx) = broadcast::channel(64);
        Self {
            tracker: Mutex::new(tracker),
            tx,
        }
    }
}

/// Pushed to WebSocket clients after every accepted mutation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StateChanged {
    pub notice: Notice,
}

// === Request/Response Types ===

/// Request to add a medication. Form and time arrive as text and are
/// validated here so bad input gets a readable warning.
#[derive(Debug, Serialize, Deserialize)]
pub struct AddMedicationRequest {
    pub name: String,
    pub form: String,
    pub time: String,
    #[serde(default)]
    pub dosage: Option<String>,
}

/// Response to an accepted mutation.
#[derive(Debug, Serialize)]
pub struct MutationResponse {
    pub changed: bool,
    pub notice: Notice,
    pub view: DashboardView,
}

/// Body of a rejected request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub notice: Notice,
}

/// Query parameters for the dashboard view.
#[derive(Debug, Deserialize)]
pub struct ViewParams {
    pub history_limit: Option<usize>,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn reject(status: StatusCode, notice: Notice) -> ApiError {
    (status, Json(ErrorResponse { notice }))
}

fn tracker_rejection(err: &TrackerError) -> ApiError {
    let status = match err {
        TrackerError::EmptyName | TrackerError::NoMedications => StatusCode::UNPROCESSABLE_ENTITY,
        TrackerError::NotFound(_) => StatusCode::NOT_FOUND,
    };
    reject(status, err.notice())
}

// === Server Lifecycle ===

/// Build the router around an existing server state.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/state", get(get_state))
        .route("/api/snapshot", get(get_snapshot))
        .route("/api/medications", post(add_medication))
        .route("/api/medications/{id}", delete(delete_medication))
        .route("/api/medications/{id}/taken", post(mark_taken))
        .route("/api/day", post(start_new_day))
        .route("/api/data", delete(clear_all))
        .route("/api/motivation", post(toggle_motivation))
        .route("/ws", get(websocket_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the server.
pub async fn start_server(port: u16, open_browser: bool, restore: Option<PathBuf>) -> Result<()> {
    let server_dir = config::server_dir()?;
    std::fs::create_dir_all(&server_dir)
        .with_context(|| format!("Failed to create {}", server_dir.display()))?;

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tracker = match restore {
        Some(path) => {
            let state = snapshot::load(&path)?;
            info!(
                path = %path.display(),
                medications = state.medications.len(),
                history = state.history.len(),
                "Restored session from snapshot"
            );
            Tracker::with_state(state, clock)
        }
        None => Tracker::new(clock),
    };

    let app = router(Arc::new(ServerState::new(tracker)));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    std::fs::write(server_dir.join(PID_FILE), std::process::id().to_string())?;
    std::fs::write(server_dir.join(PORT_FILE), port.to_string())?;

    println!("Medtimer running on http://{addr}");
    info!(%addr, "Server listening");

    if open_browser {
        if let Err(e) = open::that(format!("http://{addr}")) {
            warn!("Failed to open browser: {e}");
        }
    }

    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error");

    let _ = std::fs::remove_file(server_dir.join(PID_FILE));
    let _ = std::fs::remove_file(server_dir.join(PORT_FILE));
    info!("Server stopped");

    served
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}

/// Port of the running server, if its PID is still alive.
pub fn get_server_port() -> Option<u16> {
    let server_dir = config::server_dir().ok()?;
    let pid_file = server_dir.join(PID_FILE);
    let port_file = server_dir.join(PORT_FILE);

    let pid: u32 = std::fs::read_to_string(pid_file).ok()?.trim().parse().ok()?;

    #[cfg(unix)]
    {
        use std::process::Command;
        let alive = Command::new("kill")
            .args(["-0", &pid.to_string()])
            .output()
            .is_ok_and(|o| o.status.success());
        if !alive {
            return None;
        }
    }
    #[cfg(not(unix))]
    let _ = pid;

    std::fs::read_to_string(port_file).ok()?.trim().parse().ok()
}

pub fn spawn_server_daemon(port: u16) -> Result<()> {
    use std::process::{Command, Stdio};

    let exe = std::env::current_exe()?;

    Command::new(&exe)
        .args(["serve", "--port", &port.to_string()])
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("Failed to spawn server daemon")?;

    Ok(())
}

/// Reuse a live server or start one in the background.
pub fn ensure_server_running() -> Result<u16> {
    if let Some(port) = get_server_port() {
        return Ok(port);
    }

    debug!(port = DEFAULT_PORT, "No server running, spawning daemon");
    spawn_server_daemon(DEFAULT_PORT)?;

    for _ in 0..30 {
        std::thread::sleep(std::time::Duration::from_millis(100));
        if let Some(p) = get_server_port() {
            return Ok(p);
        }
    }

    anyhow::bail!("Server failed to start")
}

// === Handlers ===

async fn index_handler() -> Html<&'static str> {
    Html(include_str!("ui.html"))
}

async fn get_state(
    State(state): State<Arc<ServerState>>,
    Query(params): Query<ViewParams>,
) -> Json<DashboardView> {
    let tracker = state.tracker.lock().await;
    Json(tracker.view(params.history_limit.unwrap_or(DEFAULT_HISTORY_LIMIT)))
}

async fn get_snapshot(State(state): State<Arc<ServerState>>) -> Json<SessionState> {
    let tracker = state.tracker.lock().await;
    Json(tracker.state().clone())
}

/// Run one operation under the lock and notify listeners if it changed anything.
async fn apply<F>(state: &ServerState, op: F) -> Result<Json<MutationResponse>, ApiError>
where
    F: FnOnce(&mut Tracker) -> Result<Transition, TrackerError>,
{
    let mut tracker = state.tracker.lock().await;
    let transition = op(&mut *tracker).map_err(|e| {
        debug!("Rejected: {e}");
        tracker_rejection(&e)
    })?;
    let view = tracker.view(DEFAULT_HISTORY_LIMIT);
    drop(tracker);

    if transition.changed {
        // No receivers is fine: nobody has the page open.
        let _ = state.tx.send(StateChanged {
            notice: transition.notice.clone(),
        });
    }

    Ok(Json(MutationResponse {
        changed: transition.changed,
        notice: transition.notice,
        view,
    }))
}

async fn add_medication(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<AddMedicationRequest>, JsonRejection>,
) -> Result<Json<MutationResponse>, ApiError> {
    let Json(req) = payload.map_err(|rejection| {
        reject(
            StatusCode::BAD_REQUEST,
            Notice::warning(format!("Invalid medication request: {}", rejection.body_text())),
        )
    })?;
    let form = MedicationForm::from_str(&req.form).ok_or_else(|| {
        reject(
            StatusCode::BAD_REQUEST,
            Notice::warning(format!("Unknown medication type '{}'", req.form)),
        )
    })?;
    let time = parse_hhmm(&req.time).ok_or_else(|| {
        reject(
            StatusCode::BAD_REQUEST,
            Notice::warning(format!("Invalid time '{}', expected HH:MM", req.time)),
        )
    })?;

    let mut new = NewMedication::new(req.name, form, time);
    if let Some(dosage) = req.dosage {
        new = new.with_dosage(dosage);
    }
    apply(&state, |t| t.add(new)).await
}

async fn mark_taken(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<MutationResponse>, ApiError> {
    apply(&state, |t| t.mark_taken(&id)).await
}

async fn delete_medication(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Result<Json<MutationResponse>, ApiError> {
    apply(&state, |t| t.delete(&id)).await
}

async fn start_new_day(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<MutationResponse>, ApiError> {
    apply(&state, Tracker::start_new_day).await
}

async fn clear_all(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<MutationResponse>, ApiError> {
    apply(&state, |t| Ok(t.clear_all())).await
}

async fn toggle_motivation(
    State(state): State<Arc<ServerState>>,
) -> Result<Json<MutationResponse>, ApiError> {
    apply(&state, |t| Ok(t.toggle_motivation())).await
}

async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<ServerState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_websocket(socket, state))
}

async fn handle_websocket(mut socket: axum::extract::ws::WebSocket, state: Arc<ServerState>) {
    use axum::extract::ws::Message;
    use tokio::sync::broadcast::error::RecvError;

    let mut rx = state.tx.subscribe();

    loop {
        let changed = match rx.recv().await {
            Ok(changed) => changed,
            // The page refetches the whole view anyway, so skipped messages are harmless.
            Err(RecvError::Lagged(skipped)) => {
                debug!(skipped, "WebSocket client lagged");
                continue;
            }
            Err(RecvError::Closed) => break,
        };
        if let Ok(json) = serde_json::to_string(&changed) {
            if socket.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Method, Request};
    use chrono::NaiveDate;
    use tower::ServiceExt;

    use super::*;
    use crate::tracker::FixedClock;

    fn test_app() -> (Router, Arc<ServerState>) {
        let clock = Arc::new(FixedClock::new(
            NaiveDate::from_ymd_opt(2024, 5, 17)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        ));
        let state = Arc::new(ServerState::new(Tracker::new(clock)));
        (router(state.clone()), state)
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let resp = app.clone().oneshot(builder.body(body).unwrap()).await.unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_add_take_and_read_state() {
        let (app, _state) = test_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/medications",
            Some(serde_json::json!({
                "name": "Aspirin", "form": "pill", "time": "08:00", "dosage": "100mg"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["changed"], true);
        assert_eq!(body["notice"]["level"], "success");
        let id = body["view"]["schedule"][0]["id"].as_str().unwrap().to_string();
        assert_eq!(body["view"]["schedule"][0]["status"], "missed");

        let (status, body) = send(&app, Method::POST, &format!("/api/medications/{id}/taken"), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["view"]["schedule"][0]["status"], "taken");

        let (status, body) = send(&app, Method::GET, "/api/state", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["adherence"]["taken_count"], 1);
        assert_eq!(body["adherence"]["total"], 1);
        assert_eq!(body["history"]["records"][0]["medicine_name"], "Aspirin");
        assert_eq!(body["history"]["records"][0]["scheduled"], "08:00");
    }

    #[tokio::test]
    async fn test_rejections_map_to_status_codes() {
        let (app, state) = test_app();

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/medications",
            Some(serde_json::json!({"name": "  ", "form": "pill", "time": "08:00"})),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["notice"]["level"], "warning");

        let (status, _) = send(
            &app,
            Method::POST,
            "/api/medications",
            Some(serde_json::json!({"name": "X", "form": "potion", "time": "08:00"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::POST,
            "/api/medications",
            Some(serde_json::json!({"name": "Aspirin", "form": "pill"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["notice"]["level"], "warning");

        let (status, _) = send(&app, Method::POST, "/api/day", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (status, _) = send(&app, Method::DELETE, "/api/medications/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        assert!(state.tracker.lock().await.state().medications.is_empty());
    }

    #[tokio::test]
    async fn test_mutations_broadcast_state_changes() {
        let (app, state) = test_app();
        let mut rx = state.tx.subscribe();

        send(&app, Method::POST, "/api/motivation", None).await;
        let changed = rx.recv().await.unwrap();
        assert_eq!(changed.notice, Notice::info("Motivation shown"));

        send(&app, Method::DELETE, "/api/data", None).await;
        let changed = rx.recv().await.unwrap();
        assert_eq!(changed.notice.message, "All data cleared!");
    }
}
