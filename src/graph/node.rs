// Node trait and types
// Base abstraction for graph nodes

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

use crate::core::errors::ApiError;

use super::state::WorkflowState;

/// Failure category of a [`GraphError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GraphErrorKind {
    /// Graph construction referenced a name absent from the node registry
    UnknownNode,
    /// Entry point or edge target is not a node of the graph at run time
    NodeNotFound,
    /// The node transformer itself returned an error
    NodeFailed,
    /// The progress sink could not deliver a message
    DeliveryFailed,
}

impl GraphErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            GraphErrorKind::UnknownNode => "unknown_node",
            GraphErrorKind::NodeNotFound => "node_not_found",
            GraphErrorKind::NodeFailed => "node_failed",
            GraphErrorKind::DeliveryFailed => "delivery_failed",
        }
    }
}

/// Graph execution error
///
/// Includes an `execution_trace` recording the node IDs that completed before
/// the error occurred, so a host can report how far a failed run got.
#[derive(Debug, Clone)]
pub struct GraphError {
    pub kind: GraphErrorKind,
    pub node_id: String,
    pub message: String,
    /// Ordered list of node IDs executed before this error, most-recent last.
    pub execution_trace: Vec<String>,
}

impl GraphError {
    pub fn new(kind: GraphErrorKind, node_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            node_id: node_id.into(),
            message: message.into(),
            execution_trace: Vec::new(),
        }
    }

    pub fn unknown_node(node_id: impl Into<String>) -> Self {
        let node_id = node_id.into();
        let message = format!("Tool {} not found", node_id);
        Self::new(GraphErrorKind::UnknownNode, node_id, message)
    }

    pub fn node_not_found(node_id: impl Into<String>) -> Self {
        let node_id = node_id.into();
        let message = format!("Node '{}' not found", node_id);
        Self::new(GraphErrorKind::NodeNotFound, node_id, message)
    }

    pub fn with_trace(mut self, trace: &[String]) -> Self {
        self.execution_trace = trace.to_vec();
        self
    }
}

impl From<GraphError> for ApiError {
    fn from(err: GraphError) -> Self {
        match err.kind {
            GraphErrorKind::UnknownNode => ApiError::BadRequest(err.message),
            _ => ApiError::internal(err),
        }
    }
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.execution_trace.is_empty() {
            write!(f, "GraphError in {}: {}", self.node_id, self.message)
        } else {
            write!(
                f,
                "GraphError in {} (trace: {}): {}",
                self.node_id,
                self.execution_trace.join(" -> "),
                self.message
            )
        }
    }
}

impl std::error::Error for GraphError {}

/// Node trait - all graph nodes implement this
///
/// A node takes the run state and hands back the state the run continues
/// with. The runtime always awaits it, so plain and suspending steps look
/// the same to the caller.
#[async_trait]
pub trait Node: Send + Sync {
    async fn execute(&self, state: WorkflowState) -> anyhow::Result<WorkflowState>;
}

/// Adapter for a synchronous closure `State -> Result<State>`.
pub struct FnNode<F> {
    func: F,
}

#[async_trait]
impl<F> Node for FnNode<F>
where
    F: Fn(WorkflowState) -> anyhow::Result<WorkflowState> + Send + Sync,
{
    async fn execute(&self, state: WorkflowState) -> anyhow::Result<WorkflowState> {
        (self.func)(state)
    }
}

/// Adapter for a closure returning a future.
pub struct AsyncFnNode<F, Fut> {
    func: F,
    _marker: PhantomData<fn() -> Fut>,
}

#[async_trait]
impl<F, Fut> Node for AsyncFnNode<F, Fut>
where
    F: Fn(WorkflowState) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<WorkflowState>> + Send + 'static,
{
    async fn execute(&self, state: WorkflowState) -> anyhow::Result<WorkflowState> {
        (self.func)(state).await
    }
}

pub fn node_fn<F>(func: F) -> Arc<dyn Node>
where
    F: Fn(WorkflowState) -> anyhow::Result<WorkflowState> + Send + Sync + 'static,
{
    Arc::new(FnNode { func })
}

pub fn async_node_fn<F, Fut>(func: F) -> Arc<dyn Node>
where
    F: Fn(WorkflowState) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<WorkflowState>> + Send + 'static,
{
    Arc::new(AsyncFnNode {
        func,
        _marker: PhantomData,
    })
}
