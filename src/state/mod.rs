use std::sync::Arc;

use crate::core::config::AppConfig;
use crate::graph::nodes::register_builtin_tools;
use crate::graph::{build_demo_graph, GraphRuntime, NodeRegistry, DEMO_GRAPH_ID};
use crate::store::{GraphStore, InMemoryGraphStore, InMemoryRunStore, RunStore};

pub mod error;

use error::InitializationError;

/// Application state shared across all routes and background runs.
///
/// Holds the loaded configuration, the node registry that graph definitions
/// are resolved against, and the graph and run stores.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub registry: Arc<NodeRegistry>,
    pub graphs: Arc<dyn GraphStore>,
    pub runs: Arc<dyn RunStore>,
}

impl AppState {
    /// Registers the builtin tools, creates empty stores and publishes the
    /// demo graph.
    pub async fn from_config(config: AppConfig) -> Result<Arc<Self>, InitializationError> {
        let mut registry = NodeRegistry::new();
        register_builtin_tools(&mut registry);

        let state = AppState {
            config,
            registry: Arc::new(registry),
            graphs: Arc::new(InMemoryGraphStore::new()),
            runs: Arc::new(InMemoryRunStore::new()),
        };

        let demo = build_demo_graph(&state.registry).map_err(InitializationError::Graph)?;
        state
            .graphs
            .insert(DEMO_GRAPH_ID.to_string(), state.freeze(demo))
            .await;
        tracing::info!("Graph ID '{}' is ready", DEMO_GRAPH_ID);

        Ok(Arc::new(state))
    }

    /// Applies host settings to a freshly built graph and makes it shareable.
    pub fn freeze(&self, graph: GraphRuntime) -> Arc<GraphRuntime> {
        Arc::new(graph.with_step_delay(self.config.engine.stream_step_delay()))
    }
}
