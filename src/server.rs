//! HTTP server wiring.
//!
//! [`setup_engine`] builds the shared [`Engine`] from configuration,
//! [`router`] maps the REST surface onto it, and [`serve`] binds the
//! listener and runs until ctrl-c.

use anyhow::Result;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::completion;
use crate::config::RapportConfig;
use crate::emotion::classifier::EmotionClassifier;
use crate::engine::{ContextBundle, Engine, TurnOutcome};
use crate::history::{ChatTurn, Role};
use crate::kv;
use crate::memory::stats::StatsResponse;
use crate::memory::types::{Memory, MemoryType};
use crate::mood::{MoodTracking, MoodTrends};
use crate::reminders::{GiftReminder, GiftSuggestion};

/// Horizon for `GET .../reminders/upcoming` when `days` is not given.
const DEFAULT_UPCOMING_DAYS: u32 = 30;

type ApiError = (StatusCode, String);

fn bad_request(msg: impl Into<String>) -> ApiError {
    (StatusCode::BAD_REQUEST, msg.into())
}

fn not_found(msg: impl Into<String>) -> ApiError {
    (StatusCode::NOT_FOUND, msg.into())
}

fn internal(err: anyhow::Error) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn validate_user(user: &str) -> Result<(), ApiError> {
    if user.trim().is_empty() {
        return Err(bad_request("user id must not be empty"));
    }
    Ok(())
}

/// Shared setup: connect the store, create the completion provider, and
/// wrap both in an [`Engine`].
pub fn setup_engine(config: RapportConfig) -> Result<Arc<Engine>> {
    let store = kv::create_store(&config.store)?;
    tracing::info!(backend = %config.store.backend, "store ready");

    let provider = completion::create_provider(&config.classifier)?;
    let classifier = EmotionClassifier::new(provider, &config.classifier);
    tracing::info!(provider = %config.classifier.provider, "classifier ready");

    let config = Arc::new(config);
    Ok(Arc::new(Engine::new(store, classifier, config)))
}

pub fn router(engine: Arc<Engine>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/users/{user}/turns", post(post_turn))
        .route("/users/{user}/context", get(get_context))
        .route("/users/{user}/memories", get(search_memories))
        .route("/users/{user}/memories/{id}", get(get_memory))
        .route("/users/{user}/memories/{id}/touch", post(touch_memory))
        .route("/users/{user}/trends", get(get_trends))
        .route("/users/{user}/mood/history", get(mood_history))
        .route("/users/{user}/mood/note", post(post_mood_note))
        .route("/users/{user}/history", get(get_history).post(post_history))
        .route("/users/{user}/reminders", post(post_reminder))
        .route("/users/{user}/reminders/upcoming", get(upcoming_reminders))
        .route("/users/{user}/reminders/{id}/complete", post(complete_reminder))
        .route("/users/{user}/stats", get(get_stats))
        .with_state(engine)
}

/// Start the HTTP server and run until ctrl-c.
pub async fn serve(config: RapportConfig) -> Result<()> {
    let host = config.server.host.clone();
    let port = config.server.port;
    let bind_addr = format!("{host}:{port}");

    let engine = setup_engine(config)?;
    let app = router(engine);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "rapport listening at http://{bind_addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c()
                .await
                .expect("failed to listen for ctrl-c");
            tracing::info!("shutting down");
        })
        .await?;

    Ok(())
}

// ── Request/response payloads ─────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct TurnRequest {
    text: String,
    #[serde(default)]
    trigger: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NoteRequest {
    note: String,
}

#[derive(Debug, Deserialize)]
struct HistoryRequest {
    role: Role,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ReminderRequest {
    occasion: String,
    date: DateTime<Utc>,
    #[serde(default)]
    suggested_gifts: Vec<GiftSuggestion>,
    #[serde(default)]
    notes: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ContextParams {
    #[serde(default)]
    query: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    limit: Option<usize>,
    /// Comma-separated memory type names.
    #[serde(default)]
    types: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DaysParams {
    #[serde(default)]
    days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct LimitParams {
    #[serde(default)]
    limit: Option<usize>,
}

#[derive(Debug, Serialize)]
struct AckResponse {
    ok: bool,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn parse_type_filter(raw: &str) -> Result<Vec<MemoryType>, ApiError> {
    let mut types = Vec::new();
    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let parsed = part
            .parse::<MemoryType>()
            .map_err(|_| bad_request(format!("unknown memory type: {part}")))?;
        types.push(parsed);
    }
    Ok(types)
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn post_turn(
    State(engine): State<Arc<Engine>>,
    Path(user): Path<String>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<TurnOutcome>, ApiError> {
    validate_user(&user)?;
    if req.text.trim().is_empty() {
        return Err(bad_request("text must not be empty"));
    }
    let outcome = engine
        .record_turn(&user, &req.text, req.trigger.as_deref())
        .await;
    Ok(Json(outcome))
}

async fn get_context(
    State(engine): State<Arc<Engine>>,
    Path(user): Path<String>,
    Query(params): Query<ContextParams>,
) -> Result<Json<ContextBundle>, ApiError> {
    validate_user(&user)?;
    let query = params.query.unwrap_or_default();
    Ok(Json(engine.get_context(&user, &query).await))
}

async fn search_memories(
    State(engine): State<Arc<Engine>>,
    Path(user): Path<String>,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<Memory>>, ApiError> {
    validate_user(&user)?;
    let type_filter = match params.types.as_deref() {
        Some(raw) => Some(parse_type_filter(raw)?),
        None => None,
    };
    let query = params.query.unwrap_or_default();
    let results = engine
        .search_memories(&user, &query, params.limit, type_filter.as_deref())
        .await;
    Ok(Json(results))
}

async fn get_memory(
    State(engine): State<Arc<Engine>>,
    Path((user, id)): Path<(String, Uuid)>,
) -> Result<Json<Memory>, ApiError> {
    validate_user(&user)?;
    match engine.get_memory(&user, id).await {
        Some(memory) => Ok(Json(memory)),
        None => Err(not_found(format!("no memory with id {id}"))),
    }
}

async fn touch_memory(
    State(engine): State<Arc<Engine>>,
    Path((user, id)): Path<(String, Uuid)>,
) -> Result<Json<AckResponse>, ApiError> {
    validate_user(&user)?;
    let touched = engine.touch_memory(&user, id).await.map_err(internal)?;
    if !touched {
        return Err(not_found(format!("no memory with id {id}")));
    }
    Ok(Json(AckResponse { ok: true }))
}

async fn get_trends(
    State(engine): State<Arc<Engine>>,
    Path(user): Path<String>,
    Query(params): Query<DaysParams>,
) -> Result<Json<MoodTrends>, ApiError> {
    validate_user(&user)?;
    Ok(Json(engine.get_trends(&user, params.days).await))
}

async fn mood_history(
    State(engine): State<Arc<Engine>>,
    Path(user): Path<String>,
    Query(params): Query<DaysParams>,
) -> Result<Json<Vec<MoodTracking>>, ApiError> {
    validate_user(&user)?;
    Ok(Json(engine.mood_history(&user, params.days).await))
}

async fn post_mood_note(
    State(engine): State<Arc<Engine>>,
    Path(user): Path<String>,
    Json(req): Json<NoteRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    validate_user(&user)?;
    if req.note.trim().is_empty() {
        return Err(bad_request("note must not be empty"));
    }
    engine
        .annotate_mood(&user, &req.note)
        .await
        .map_err(internal)?;
    Ok(Json(AckResponse { ok: true }))
}

async fn get_history(
    State(engine): State<Arc<Engine>>,
    Path(user): Path<String>,
    Query(params): Query<LimitParams>,
) -> Result<Json<Vec<ChatTurn>>, ApiError> {
    validate_user(&user)?;
    Ok(Json(engine.recent_history(&user, params.limit).await))
}

async fn post_history(
    State(engine): State<Arc<Engine>>,
    Path(user): Path<String>,
    Json(req): Json<HistoryRequest>,
) -> Result<Json<AckResponse>, ApiError> {
    validate_user(&user)?;
    if req.content.trim().is_empty() {
        return Err(bad_request("content must not be empty"));
    }
    engine
        .append_history(&user, req.role, &req.content)
        .await
        .map_err(internal)?;
    Ok(Json(AckResponse { ok: true }))
}

async fn post_reminder(
    State(engine): State<Arc<Engine>>,
    Path(user): Path<String>,
    Json(req): Json<ReminderRequest>,
) -> Result<Json<GiftReminder>, ApiError> {
    validate_user(&user)?;
    if req.occasion.trim().is_empty() {
        return Err(bad_request("occasion must not be empty"));
    }
    let reminder = engine
        .create_reminder(&user, &req.occasion, req.date, req.suggested_gifts, req.notes)
        .await
        .map_err(internal)?;
    Ok(Json(reminder))
}

async fn upcoming_reminders(
    State(engine): State<Arc<Engine>>,
    Path(user): Path<String>,
    Query(params): Query<DaysParams>,
) -> Result<Json<Vec<GiftReminder>>, ApiError> {
    validate_user(&user)?;
    let days = params.days.unwrap_or(DEFAULT_UPCOMING_DAYS);
    Ok(Json(engine.upcoming_reminders(&user, days).await))
}

async fn complete_reminder(
    State(engine): State<Arc<Engine>>,
    Path((user, id)): Path<(String, Uuid)>,
) -> Result<Json<AckResponse>, ApiError> {
    validate_user(&user)?;
    let completed = engine.complete_reminder(&user, id).await.map_err(internal)?;
    if !completed {
        return Err(not_found(format!("no reminder with id {id}")));
    }
    Ok(Json(AckResponse { ok: true }))
}

async fn get_stats(
    State(engine): State<Arc<Engine>>,
    Path(user): Path<String>,
) -> Result<Json<StatsResponse>, ApiError> {
    validate_user(&user)?;
    let stats = engine.stats(&user).await.map_err(internal)?;
    Ok(Json(stats))
}

async fn health(State(engine): State<Arc<Engine>>) -> Result<Json<HealthResponse>, ApiError> {
    engine
        .health()
        .await
        .map_err(|err| (StatusCode::SERVICE_UNAVAILABLE, err.to_string()))?;
    Ok(Json(HealthResponse { status: "ok" }))
}
