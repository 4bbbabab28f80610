use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::core::errors::ApiError;
use crate::graph::{build_graph, GraphRuntime, GraphSpec};
use crate::state::AppState;
use crate::store::{RunRecord, RunStore};

#[derive(Debug, Deserialize)]
pub struct GraphRunRequest {
    pub graph_id: String,
    #[serde(default)]
    pub initial_state: Map<String, Value>,
}

// POST /graph/create
pub async fn create_graph(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GraphSpec>,
) -> Result<impl IntoResponse, ApiError> {
    let graph = build_graph(&state.registry, &payload)?;
    let graph_id = Uuid::new_v4().to_string();

    state
        .graphs
        .insert(graph_id.clone(), state.freeze(graph))
        .await;
    tracing::info!(
        "Created graph {} ({} nodes, entry '{}')",
        graph_id,
        payload.nodes.len(),
        payload.start_node
    );

    Ok(Json(json!({"graph_id": graph_id, "message": "Graph created"})))
}

// GET /graph/list
pub async fn list_graphs(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({"graphs": state.graphs.list().await}))
}

// POST /graph/run — returns immediately, the run continues in the background
pub async fn run_graph(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<GraphRunRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let graph = state
        .graphs
        .get(&payload.graph_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Graph ID not found".to_string()))?;

    let run_id = Uuid::new_v4().to_string();
    state
        .runs
        .insert(RunRecord::running(&run_id, &payload.graph_id))
        .await;

    tokio::spawn(execute_run(
        state.runs.clone(),
        graph,
        run_id.clone(),
        payload.initial_state,
    ));

    Ok(Json(json!({"run_id": run_id, "status": "queued"})))
}

// GET /graph/state/:run_id
pub async fn get_run_state(
    State(state): State<Arc<AppState>>,
    Path(run_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let record = state
        .runs
        .get(&run_id)
        .await
        .ok_or_else(|| ApiError::NotFound("Run ID not found".to_string()))?;
    Ok(Json(record))
}

async fn execute_run(
    runs: Arc<dyn RunStore>,
    graph: Arc<GraphRuntime>,
    run_id: String,
    initial_state: Map<String, Value>,
) {
    let result = match graph.run(initial_state).await {
        Ok((final_state, logs)) => {
            tracing::info!("Run {} completed after {} steps", run_id, final_state.history.len());
            runs.complete(&run_id, final_state, logs).await
        }
        Err(err) => {
            tracing::warn!("Run {} failed ({}): {}", run_id, err.kind.as_str(), err);
            runs.fail(&run_id, err.message).await
        }
    };

    if let Err(err) = result {
        tracing::error!("Failed to record outcome of run {}: {}", run_id, err);
    }
}
