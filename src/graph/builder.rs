// Graph Builder
// Wires the demo summarization graph from registered tools

use std::collections::HashMap;

use super::node::GraphError;
use super::nodes::{merge, refine, split, summarize};
use super::registry::{build_graph, EdgeSpec, GraphSpec, NodeRegistry};
use super::runtime::GraphRuntime;

/// Identifier the demo graph is published under at startup.
pub const DEMO_GRAPH_ID: &str = "demo-summary";

/// Definition of the demo graph: split -> summarize -> merge -> refine,
/// with refine looping on itself while `status` is "continue".
pub fn demo_graph_spec() -> GraphSpec {
    let refine_mapping = HashMap::from([
        ("continue".to_string(), Some(refine::NAME.to_string())),
        ("stop".to_string(), None),
    ]);

    GraphSpec {
        nodes: vec![
            split::NAME.to_string(),
            summarize::NAME.to_string(),
            merge::NAME.to_string(),
            refine::NAME.to_string(),
        ],
        edges: vec![
            direct(split::NAME, summarize::NAME),
            direct(summarize::NAME, merge::NAME),
            direct(merge::NAME, refine::NAME),
            EdgeSpec {
                source: refine::NAME.to_string(),
                condition: Some("status".to_string()),
                mapping: Some(refine_mapping),
                ..Default::default()
            },
        ],
        start_node: split::NAME.to_string(),
    }
}

/// Build the demo summarization graph
pub fn build_demo_graph(registry: &NodeRegistry) -> Result<GraphRuntime, GraphError> {
    build_graph(registry, &demo_graph_spec())
}

fn direct(source: &str, target: &str) -> EdgeSpec {
    EdgeSpec {
        source: source.to_string(),
        target: Some(target.to_string()),
        ..Default::default()
    }
}
