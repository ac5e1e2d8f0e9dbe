use std::sync::Arc;
use axum::extract::{Path, State};
use axum::Json;
use hd_core::config::validate_setting;
use hd_core::{Error, TagWeight};
use hd_digest::{CycleReport, ReactionOutcome};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::info;
use crate::error::ApiResult;
use crate::telegram::Update;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ReactionRequest {
    pub message_id: i64,
    pub reaction: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SettingValue {
    pub value: String,
}

#[derive(Debug, Serialize)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "cycle_running": state.pipeline.is_running(),
    }))
}

pub async fn run_digest(State(state): State<Arc<AppState>>) -> ApiResult<Json<CycleReport>> {
    info!("Manual digest requested");
    let report = state.pipeline.run(&state.shutdown).await?;
    Ok(Json(report))
}

pub async fn post_reaction(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReactionRequest>,
) -> ApiResult<Json<ReactionOutcome>> {
    let outcome = state.reactions.handle(request.message_id, &request.reaction).await?;
    Ok(Json(outcome))
}

/// Telegram retries non-2xx answers, so only store failures surface as errors.
pub async fn telegram_webhook(
    State(state): State<Arc<AppState>>,
    Json(update): Json<Update>,
) -> ApiResult<Json<ReactionOutcome>> {
    let Some((message_id, emoji)) = update.reaction(|emoji| state.reactions.is_positive(emoji)) else {
        return Ok(Json(ReactionOutcome::Ignored));
    };
    let outcome = state.reactions.handle(message_id, emoji).await?;
    Ok(Json(outcome))
}

pub async fn list_preferences(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<TagWeight>>> {
    Ok(Json(state.pipeline.preferences().ranked().await?))
}

pub async fn get_setting(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> ApiResult<Json<Setting>> {
    let value = state
        .store()
        .get_setting(&key)
        .await?
        .ok_or_else(|| Error::NotFound(format!("setting {}", key)))?;
    Ok(Json(Setting { key, value }))
}

pub async fn put_setting(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(body): Json<SettingValue>,
) -> ApiResult<Json<Setting>> {
    validate_setting(&key, &body.value)?;
    state.store().set_setting(&key, &body.value).await?;
    info!("Setting {} updated", key);
    Ok(Json(Setting { key, value: body.value }))
}
