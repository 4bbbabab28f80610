use serde::Deserialize;
use serde_json::{Map, Value};

pub const MSG_GRAPH_NOT_FOUND: &str = "Error: Graph ID not found";
pub const MSG_RUN_COMPLETE: &str = "--- Run Complete ---";

/// First (and only) message a client sends on `/ws/run`.
#[derive(Debug, Deserialize, Default)]
pub struct WsRunRequest {
    pub graph_id: Option<String>,
    #[serde(default)]
    pub initial_state: Option<Map<String, Value>>,
}

pub fn connected_message(graph_id: &str) -> String {
    format!("--- Connected to Graph {} ---", graph_id)
}

pub fn error_message(err: impl std::fmt::Display) -> String {
    format!("Error: {}", err)
}
