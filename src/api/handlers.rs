//! Request handlers for the generation API

use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::JobDefinition;
use crate::error::{AppError, Result};
use crate::generation;
use crate::image::codec;
use crate::run::RunState;
use crate::AppState;

/// Single-job request: one prompt against any number of embedded images
#[derive(Debug, Deserialize)]
pub struct GenerateBody {
    pub prompt: String,
    #[serde(default)]
    pub images: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReply {
    pub generated_image: String,
}

/// Full-run request
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRunBody {
    #[serde(default)]
    pub reference_images: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunStarted {
    pub session_id: Uuid,
    pub jobs: Vec<JobDefinition>,
    pub dropped_images: usize,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "model": state.settings.generation.model,
        "run_active": state.sequencer.is_active(),
    }))
}

pub async fn list_jobs(State(state): State<Arc<AppState>>) -> Json<Vec<JobDefinition>> {
    Json(state.sequencer.jobs().to_vec())
}

pub async fn generate(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateBody>,
) -> Result<Json<GenerateReply>> {
    let (payload, dropped) = generation::build_from_embedded(&body.prompt, &body.images);
    debug!(
        images = payload.image_count(),
        dropped = dropped,
        "Single generation request"
    );

    let image = state.backend.generate(&payload).await?;

    Ok(Json(GenerateReply {
        generated_image: codec::encode(&image),
    }))
}

pub async fn start_run(
    State(state): State<Arc<AppState>>,
    Json(body): Json<StartRunBody>,
) -> Result<(StatusCode, Json<RunStarted>)> {
    let prepared = state.sequencer.prepare(&body.reference_images)?;

    let started = RunStarted {
        session_id: prepared.session_id(),
        jobs: state.sequencer.jobs().to_vec(),
        dropped_images: prepared.state().dropped_images,
    };

    let sequencer = state.sequencer.clone();
    tokio::spawn(async move {
        sequencer.drive(prepared).await;
    });

    info!(session_id = %started.session_id, "Generation run started");
    Ok((StatusCode::ACCEPTED, Json(started)))
}

pub async fn current_run(State(state): State<Arc<AppState>>) -> Result<Json<RunState>> {
    state
        .sequencer
        .store()
        .snapshot()
        .map(Json)
        .ok_or(AppError::NoRun)
}

pub async fn cancel_run(State(state): State<Arc<AppState>>) -> Result<(StatusCode, Json<Value>)> {
    if state.sequencer.cancel() {
        Ok((StatusCode::ACCEPTED, Json(json!({ "cancelled": true }))))
    } else {
        Err(AppError::NoActiveRun)
    }
}
