use thiserror::Error;

use crate::graph::GraphError;

#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("Failed to build demo graph: {0}")]
    Graph(#[source] GraphError),
}
