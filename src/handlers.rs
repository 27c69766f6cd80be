use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::ApiError;
use crate::state::AppState;

/// Body of the generate and query endpoints. A missing `text` is treated
/// as empty and yields the fallback record.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub text: String,
    pub temperature: Option<f32>,
}

impl GenerateRequest {
    fn temperature_or(&self, default: f32) -> f32 {
        self.temperature.unwrap_or(default)
    }
}

pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "sessions": state.sessions.len(),
        "model": state.config.llm_config.model,
    }))
}

/// One-shot generation without history.
pub async fn generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Json<Value> {
    let temperature = request.temperature_or(state.config.llm_config.temperature);
    let cancel = state.shutdown.child_token();
    let agent = state.factory.create_agent();

    let outcome = agent.generate(&request.text, temperature, &cancel).await;
    info!(
        "Generated record: object={}, provenance={}",
        outcome.record.object,
        outcome.provenance.label()
    );
    Json(outcome.to_dict())
}

pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let session_id = state.create_session()?;
    Ok((StatusCode::CREATED, Json(json!({ "session_id": session_id }))))
}

pub async fn query_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<Value>, ApiError> {
    let agent = state.touch_session(&session_id)?;
    let temperature = request.temperature_or(state.config.llm_config.temperature);
    let cancel = state.shutdown.child_token();

    let outcome = agent
        .process_user_query(&request.text, temperature, &cancel)
        .await;
    Ok(Json(outcome.to_dict()))
}

pub async fn session_history(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let session = state.get_session(&session_id)?;
    let entries = session.agent.history().await;
    Ok(Json(json!({
        "session_id": session_id,
        "created_at": session.created_at,
        "last_active": session.last_active,
        "entries": entries,
    })))
}

pub async fn delete_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.remove_session(&session_id)?;
    Ok(StatusCode::NO_CONTENT)
}
