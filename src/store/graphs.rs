use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::graph::GraphRuntime;

/// Abstract trait for graph storage.
///
/// Stored graphs are frozen: callers only ever get shared, read-only access.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Store a graph under `graph_id`, replacing any previous entry.
    async fn insert(&self, graph_id: String, graph: Arc<GraphRuntime>);

    async fn get(&self, graph_id: &str) -> Option<Arc<GraphRuntime>>;

    /// All stored graph ids, sorted.
    async fn list(&self) -> Vec<String>;
}

#[derive(Default)]
pub struct InMemoryGraphStore {
    graphs: RwLock<HashMap<String, Arc<GraphRuntime>>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn insert(&self, graph_id: String, graph: Arc<GraphRuntime>) {
        self.graphs.write().await.insert(graph_id, graph);
    }

    async fn get(&self, graph_id: &str) -> Option<Arc<GraphRuntime>> {
        self.graphs.read().await.get(graph_id).cloned()
    }

    async fn list(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.graphs.read().await.keys().cloned().collect();
        ids.sort_unstable();
        ids
    }
}
