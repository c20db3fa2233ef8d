/**
 * API HTTP HOSTPULSE - Ingestion des reports et flux temps réel
 *
 * ROLE:
 * Entry point for agents (POST /report) and viewers (GET /ws), plus read-only host views.
 *
 * ROUTES:
 * - POST /report        one HostSnapshot, 200 {"message":"received"} or 400 {"error":...}
 * - GET  /ws            WebSocket, JSON array of every snapshot once per broadcast interval
 * - GET  /hosts         every snapshot, ordered by host_id
 * - GET  /hosts/{id}    one snapshot, 404 when unknown
 * - GET  /health        liveness
 * - GET  /system/health kernel counters (hosts, viewers, accepted/rejected reports)
 *
 * A malformed body never reaches the store: rejection happens before accept().
 */

use axum::extract::rejection::JsonRejection;
use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Response;
use axum::routing::{get, post};
use axum::{Json, Router};
use hostpulse_model::HostSnapshot;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use crate::broadcast::{snapshot_batch, Broadcaster, WsSink};
use crate::clock::Clock;
use crate::config::KernelConfig;
use crate::health::{HealthTracker, KernelHealth};
use crate::store::AggregatorStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<AggregatorStore>,
    pub health: HealthTracker,
    pub broadcaster: Broadcaster,
    pub clock: Clock,
    pub push_timeout: Duration,
}

impl AppState {
    pub fn new(store: Arc<AggregatorStore>, cfg: &KernelConfig, clock: Clock) -> Self {
        let health = HealthTracker::new();
        let broadcaster = Broadcaster::new(store.clone(), cfg.broadcast_interval(), health.clone());
        Self {
            store,
            health,
            broadcaster,
            clock,
            push_timeout: cfg.push_timeout(),
        }
    }
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/system/health", get(get_system_health))
        .route("/report", post(report))
        .route("/ws", get(live_feed))
        .route("/hosts", get(get_hosts))
        .route("/hosts/{id}", get(get_host))
        .with_state(app_state)
}

fn reject(app: &AppState, reason: String) -> (StatusCode, Json<Value>) {
    app.health.mark_report_rejected();
    warn!("report rejected: {reason}");
    (StatusCode::BAD_REQUEST, Json(json!({ "error": reason })))
}

// POST /report
async fn report(
    State(app): State<AppState>,
    payload: Result<Json<HostSnapshot>, JsonRejection>,
) -> (StatusCode, Json<Value>) {
    let snapshot = match payload {
        Ok(Json(snapshot)) => snapshot,
        Err(rejection) => return reject(&app, rejection.body_text()),
    };
    if snapshot.host_id.is_empty() {
        return reject(&app, "host_id must not be empty".into());
    }

    let stored = app.store.accept(snapshot, (app.clock)());
    app.health.mark_report_accepted();
    debug!(
        "report from {}: cpu={:.1}% in={}B/s out={}B/s",
        stored.host_id, stored.cpu, stored.net_in_speed, stored.net_out_speed
    );
    (StatusCode::OK, Json(json!({ "message": "received" })))
}

// GET /ws
async fn live_feed(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| async move {
        debug!("viewer connected");
        let reason = app.broadcaster.serve(WsSink::new(socket, app.push_timeout)).await;
        debug!("viewer disconnected: {reason}");
    })
}

// GET /hosts
async fn get_hosts(State(app): State<AppState>) -> Json<Vec<HostSnapshot>> {
    Json(snapshot_batch(&app.store))
}

// GET /hosts/{id}
async fn get_host(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<HostSnapshot>, StatusCode> {
    app.store.get(&id).map(Json).ok_or(StatusCode::NOT_FOUND)
}

// GET /system/health
async fn get_system_health(State(app): State<AppState>) -> Json<KernelHealth> {
    Json(app.health.get_health(&app.store))
}
