// Node Registry
// Name -> node lookup used to bind graph definitions to behavior

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::node::{GraphError, Node};
use super::runtime::GraphRuntime;

/// Owned table of nodes the host makes available to graph definitions.
#[derive(Default, Clone)]
pub struct NodeRegistry {
    nodes: HashMap<String, Arc<dyn Node>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the node registered under `name`.
    pub fn register(&mut self, name: impl Into<String>, node: Arc<dyn Node>) -> &mut Self {
        self.nodes.insert(name.into(), node);
        self
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Node>> {
        self.nodes.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.nodes.keys().cloned().collect();
        names.sort_unstable();
        names
    }
}

/// One edge of a graph definition.
///
/// A non-empty `condition` together with a non-empty `mapping` makes a
/// conditional edge; otherwise a non-empty `target` makes a direct edge.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EdgeSpec {
    pub source: String,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default, alias = "condition_key")]
    pub condition: Option<String>,
    #[serde(default)]
    pub mapping: Option<HashMap<String, Option<String>>>,
}

/// Declarative graph definition, as received from a client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSpec {
    pub nodes: Vec<String>,
    #[serde(default)]
    pub edges: Vec<EdgeSpec>,
    #[serde(alias = "entry")]
    pub start_node: String,
}

/// Builds a runtime from `spec`, resolving every listed node in `registry`.
///
/// Only the `nodes` list is checked against the registry; edge targets and
/// the entry point are resolved lazily when a run reaches them.
pub fn build_graph(registry: &NodeRegistry, spec: &GraphSpec) -> Result<GraphRuntime, GraphError> {
    let mut runtime = GraphRuntime::new();

    for name in &spec.nodes {
        let node = registry
            .get(name)
            .ok_or_else(|| GraphError::unknown_node(name))?;
        runtime.add_node(name, node);
    }

    for edge in &spec.edges {
        match (&edge.condition, &edge.mapping, &edge.target) {
            (Some(key), Some(mapping), _) if !key.is_empty() && !mapping.is_empty() => {
                runtime.add_conditional_edge(&edge.source, key, mapping.clone());
            }
            (_, _, Some(target)) if !target.is_empty() => runtime.add_edge(&edge.source, target),
            _ => {
                tracing::warn!(
                    "Ignoring edge from '{}': neither a target nor a condition mapping",
                    edge.source
                );
            }
        }
    }

    runtime.set_entry(&spec.start_node);
    Ok(runtime)
}
