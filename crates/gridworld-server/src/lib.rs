//! HTTP surface for the grid-world simulation.
//!
//! Every handler takes the one simulation lock for its whole body, so
//! steps, resets, activations and reads never interleave.

pub mod config;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use gridworld_core::{ActivationResult, GridSnapshot, Simulation, StateSnapshot};
use parking_lot::Mutex;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

pub use config::ServerConfig;

pub type SharedSimulation = Arc<Mutex<Simulation>>;

pub fn build_router(sim: SharedSimulation) -> Router {
    Router::new()
        .route("/grid", get(grid))
        .route("/state", get(state))
        .route("/step", post(step))
        .route("/reset", post(reset))
        .route("/models", get(models))
        .route("/set_active_models", post(set_active_models))
        .layer(CorsLayer::very_permissive())
        .with_state(sim)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ActivateRequest {
    pub model_names: Vec<String>,
}

pub async fn grid(State(sim): State<SharedSimulation>) -> Json<GridSnapshot> {
    Json(sim.lock().grid_snapshot())
}

pub async fn state(State(sim): State<SharedSimulation>) -> Json<StateSnapshot> {
    Json(sim.lock().snapshot())
}

pub async fn step(State(sim): State<SharedSimulation>) -> Json<StateSnapshot> {
    Json(sim.lock().step())
}

pub async fn reset(State(sim): State<SharedSimulation>) -> Json<StateSnapshot> {
    Json(sim.lock().reset())
}

pub async fn models(State(sim): State<SharedSimulation>) -> Json<Vec<String>> {
    Json(sim.lock().list_models())
}

/// Accepts a JSON body regardless of content type; an empty body activates nothing.
pub async fn set_active_models(
    State(sim): State<SharedSimulation>,
    body: Bytes,
) -> Result<Json<ActivationResult>, BadRequest> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ActivateRequest::default()
    } else {
        serde_json::from_slice::<ActivateRequest>(&body).map_err(BadRequest)?
    };
    let result = sim.lock().activate(&request.model_names);
    tracing::info!(active = ?result.state.active_models, "active models replaced");
    Ok(Json(result))
}

#[derive(Debug)]
pub struct BadRequest(serde_json::Error);

impl IntoResponse for BadRequest {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "detail": self.0.to_string() });
        (StatusCode::BAD_REQUEST, Json(body)).into_response()
    }
}
