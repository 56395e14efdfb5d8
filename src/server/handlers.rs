//! HTTP request handlers

use std::sync::Arc;
use axum::extract::rejection::JsonRejection;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::inference::payload_to_frame;

use super::error::{Result, ServerError};
use super::state::AppState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResponse {
    pub predictions: Vec<f64>,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": (chrono::Utc::now() - state.started_at).num_seconds(),
    }))
}

/// Metadata and input schema of the served model
pub async fn model_info(State(state): State<Arc<AppState>>) -> Json<Value> {
    let schema: Vec<Value> = state
        .model
        .input_schema()
        .into_iter()
        .map(|(column, kind)| json!({ "column": column, "kind": kind.to_string() }))
        .collect();

    let references: serde_json::Map<String, Value> = state
        .model
        .reference_categories()
        .into_iter()
        .map(|(column, category)| (column.to_string(), json!(category)))
        .collect();

    Json(json!({
        "metadata": state.model.metadata(),
        "input_schema": schema,
        "reference_categories": references,
    }))
}

/// Predict for a split-orientation payload
pub async fn invocations(
    State(state): State<Arc<AppState>>,
    body: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<PredictionResponse>> {
    let Json(payload) = body.map_err(|rejection| ServerError::BadRequest(rejection.body_text()))?;
    if !payload.is_object() {
        return Err(ServerError::BadRequest("payload must be a JSON object".to_string()));
    }

    let frame = payload_to_frame(&payload, &state.model)?;
    debug!(rows = frame.height(), columns = frame.width(), "Decoded payload");

    let predictions = state.model.predict(&frame)?.to_vec();
    info!(
        model_id = %state.model.metadata().model_id,
        rows = predictions.len(),
        "Served predictions"
    );
    Ok(Json(PredictionResponse { predictions }))
}
