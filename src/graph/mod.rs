// Graph Module
// Named-step workflow graphs and their runtime

pub mod builder;
pub mod node;
pub mod nodes;
pub mod registry;
pub mod runtime;
pub mod sink;
pub mod state;

pub use builder::{build_demo_graph, DEMO_GRAPH_ID};
pub use node::{async_node_fn, node_fn, GraphError, GraphErrorKind, Node};
pub use registry::{build_graph, EdgeSpec, GraphSpec, NodeRegistry};
pub use runtime::{Edge, GraphRuntime};
pub use sink::ProgressSink;
pub use state::WorkflowState;
