// Graph Runtime
// Named nodes, per-source edge rules and the step loop

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use super::node::{GraphError, GraphErrorKind, Node};
use super::sink::ProgressSink;
use super::state::WorkflowState;

/// Maximum node invocations per run before the loop stops.
pub const DEFAULT_MAX_STEPS: usize = 50;

/// Pause after each streamed step message. Only paces output for a human
/// watching a stream; batch runs never sleep. Zero disables it.
pub const STREAM_STEP_DELAY: Duration = Duration::from_millis(500);

pub const FINISH_MESSAGE: &str = "Execution Finished";

/// Successor rule for a source node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edge {
    /// Always continue to this node
    Direct(String),
    /// Look up `state.data[key]` in `mapping`; a `None` target or an
    /// unmapped value ends the run
    Conditional {
        key: String,
        mapping: HashMap<String, Option<String>>,
    },
}

impl Edge {
    pub fn direct(target: impl Into<String>) -> Self {
        Self::Direct(target.into())
    }

    pub fn conditional(key: impl Into<String>, mapping: HashMap<String, Option<String>>) -> Self {
        Self::Conditional {
            key: key.into(),
            mapping,
        }
    }

    /// Next node for `state`, or `None` to terminate.
    ///
    /// Only string values select a branch; any other value, like a missing
    /// key, finds no mapping.
    pub fn next_node(&self, state: &WorkflowState) -> Option<String> {
        match self {
            Edge::Direct(target) => Some(target.clone()),
            Edge::Conditional { key, mapping } => state
                .get(key)
                .and_then(Value::as_str)
                .and_then(|value| mapping.get(value))
                .cloned()
                .flatten(),
        }
    }
}

/// Graph definition plus the traversal engine.
///
/// Mutation takes `&mut self`; once a runtime is wrapped in an `Arc` it is
/// frozen and any number of runs may share it.
pub struct GraphRuntime {
    nodes: HashMap<String, Arc<dyn Node>>,
    edges: HashMap<String, Edge>,
    entry_node_id: Option<String>,
    max_steps: usize,
    step_delay: Duration,
}

impl GraphRuntime {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            entry_node_id: None,
            max_steps: DEFAULT_MAX_STEPS,
            step_delay: STREAM_STEP_DELAY,
        }
    }

    /// Set maximum execution steps
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    /// Set the pause applied after each streamed step message
    pub fn with_step_delay(mut self, delay: Duration) -> Self {
        self.step_delay = delay;
        self
    }

    /// Set entry point node
    pub fn with_entry(mut self, node_id: impl Into<String>) -> Self {
        self.set_entry(node_id);
        self
    }

    /// Inserts or replaces the node registered under `node_id`.
    pub fn add_node(&mut self, node_id: impl Into<String>, node: Arc<dyn Node>) {
        self.nodes.insert(node_id.into(), node);
    }

    /// Replaces any edge rule of `from` with a direct edge to `to`.
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) {
        self.edges.insert(from.into(), Edge::direct(to));
    }

    /// Replaces any edge rule of `from` with a conditional edge.
    pub fn add_conditional_edge(
        &mut self,
        from: impl Into<String>,
        key: impl Into<String>,
        mapping: HashMap<String, Option<String>>,
    ) {
        self.edges.insert(from.into(), Edge::conditional(key, mapping));
    }

    /// Not validated here; a missing entry node fails the run that reaches it.
    pub fn set_entry(&mut self, node_id: impl Into<String>) {
        self.entry_node_id = Some(node_id.into());
    }

    pub fn entry(&self) -> Option<&str> {
        self.entry_node_id.as_deref()
    }

    pub fn edge(&self, from: &str) -> Option<&Edge> {
        self.edges.get(from)
    }

    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// Get all node IDs, sorted
    pub fn node_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.nodes.keys().map(|s| s.as_str()).collect();
        ids.sort_unstable();
        ids
    }

    /// Batch run: no sink, no pacing.
    pub async fn run(
        &self,
        initial_data: Map<String, Value>,
    ) -> Result<(WorkflowState, Vec<String>), GraphError> {
        self.execute(initial_data, None).await
    }

    /// Streaming run: every log line goes to `sink` before the run advances.
    pub async fn run_streaming(
        &self,
        initial_data: Map<String, Value>,
        sink: &mut dyn ProgressSink,
    ) -> Result<(WorkflowState, Vec<String>), GraphError> {
        self.execute(initial_data, Some(sink)).await
    }

    async fn execute(
        &self,
        initial_data: Map<String, Value>,
        mut sink: Option<&mut dyn ProgressSink>,
    ) -> Result<(WorkflowState, Vec<String>), GraphError> {
        let mut state = WorkflowState::new(initial_data);
        let mut current = self.entry_node_id.clone();
        let mut logs = Vec::new();
        let mut step = 0;

        while let Some(node_id) = current.take() {
            if step >= self.max_steps {
                tracing::warn!(
                    "Step limit ({}) reached before '{}' could run; stopping",
                    self.max_steps,
                    node_id
                );
                break;
            }

            let message = format!("Step {}: Executing '{}'", step + 1, node_id);
            logs.push(message.clone());

            if let Some(sink) = sink.as_deref_mut() {
                deliver(sink, &message, &node_id, &state).await?;
                if !self.step_delay.is_zero() {
                    tokio::time::sleep(self.step_delay).await;
                }
            }

            let node = self.nodes.get(&node_id).ok_or_else(|| {
                tracing::warn!("Node '{}' not found at step {}", node_id, step + 1);
                GraphError::node_not_found(&node_id).with_trace(&state.history)
            })?;

            tracing::debug!("Executing node: {} (step {})", node_id, step + 1);
            state = node.execute(state).await.map_err(|err| {
                tracing::warn!("Node '{}' failed: {:#}", node_id, err);
                GraphError::new(GraphErrorKind::NodeFailed, &node_id, format!("{:#}", err))
                    .with_trace(&completed_steps(&logs))
            })?;
            state.record_visit(&node_id);

            current = self
                .edges
                .get(&node_id)
                .and_then(|edge| edge.next_node(&state));
            step += 1;
        }

        logs.push(FINISH_MESSAGE.to_string());
        if let Some(sink) = sink.as_deref_mut() {
            deliver(sink, FINISH_MESSAGE, "runtime", &state).await?;
        }

        tracing::debug!("Graph execution complete after {} steps", step);
        Ok((state, logs))
    }
}

/// Nodes of every step before the current one, read back from the run log.
fn completed_steps(logs: &[String]) -> Vec<String> {
    let done = logs.len().saturating_sub(1);
    logs[..done]
        .iter()
        .filter_map(|line| {
            let (_, quoted) = line.split_once(": Executing '")?;
            quoted.strip_suffix('\'').map(str::to_string)
        })
        .collect()
}

async fn deliver(
    sink: &mut dyn ProgressSink,
    message: &str,
    node_id: &str,
    state: &WorkflowState,
) -> Result<(), GraphError> {
    sink.deliver(message).await.map_err(|err| {
        tracing::warn!("Progress delivery failed: {:#}", err);
        GraphError::new(
            GraphErrorKind::DeliveryFailed,
            node_id,
            format!("delivery failed: {:#}", err),
        )
        .with_trace(&state.history)
    })
}

impl Default for GraphRuntime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::node::{async_node_fn, node_fn};
    use serde_json::json;

    fn data(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => panic!("expected object"),
        }
    }

    fn noop() -> Arc<dyn Node> {
        node_fn(|state| Ok(state))
    }

    fn mapping(pairs: &[(&str, Option<&str>)]) -> HashMap<String, Option<String>> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.map(str::to_string)))
            .collect()
    }

    fn chain() -> GraphRuntime {
        let mut graph = GraphRuntime::new().with_step_delay(Duration::ZERO);
        for name in ["a", "b", "c"] {
            graph.add_node(name, noop());
        }
        graph.add_edge("a", "b");
        graph.add_edge("b", "c");
        graph.set_entry("a");
        graph
    }

    #[test]
    fn test_edge_resolution() {
        let mut state = WorkflowState::default();
        assert_eq!(Edge::direct("x").next_node(&state), Some("x".to_string()));

        let edge = Edge::conditional(
            "status",
            mapping(&[("continue", Some("refine")), ("stop", None)]),
        );
        assert_eq!(edge.next_node(&state), None);

        state.set("status", "continue");
        assert_eq!(edge.next_node(&state), Some("refine".to_string()));
        state.set("status", "stop");
        assert_eq!(edge.next_node(&state), None);
        state.set("status", "other");
        assert_eq!(edge.next_node(&state), None);
        state.set("status", true);
        assert_eq!(edge.next_node(&state), None);
    }

    #[tokio::test]
    async fn test_single_node_without_edges() {
        let mut graph = GraphRuntime::new();
        graph.add_node("only", noop());
        graph.set_entry("only");

        let (state, logs) = graph.run(Map::new()).await.unwrap();
        assert_eq!(state.history, vec!["only"]);
        assert_eq!(logs, vec!["Step 1: Executing 'only'", "Execution Finished"]);
    }

    #[tokio::test]
    async fn test_no_entry_runs_zero_steps() {
        let mut graph = GraphRuntime::new();
        graph.add_node("a", noop());

        let (state, logs) = graph.run(data(json!({"k": 1}))).await.unwrap();
        assert!(state.history.is_empty());
        assert_eq!(state.data, data(json!({"k": 1})));
        assert_eq!(logs, vec![FINISH_MESSAGE]);
    }

    #[tokio::test]
    async fn test_direct_chain_visits_in_order() {
        let (state, logs) = chain().run(Map::new()).await.unwrap();
        assert_eq!(state.history, vec!["a", "b", "c"]);
        assert_eq!(
            logs,
            vec![
                "Step 1: Executing 'a'",
                "Step 2: Executing 'b'",
                "Step 3: Executing 'c'",
                "Execution Finished",
            ]
        );
    }

    #[tokio::test]
    async fn test_unmapped_condition_value_terminates() {
        let mut graph = GraphRuntime::new();
        graph.add_node(
            "check",
            node_fn(|mut state| {
                state.set("status", "unexpected");
                Ok(state)
            }),
        );
        graph.add_node("next", noop());
        graph.add_conditional_edge("check", "status", mapping(&[("go", Some("next"))]));
        graph.set_entry("check");

        let (state, logs) = graph.run(Map::new()).await.unwrap();
        assert_eq!(state.history, vec!["check"]);
        assert_eq!(logs.len(), 2);
    }

    #[tokio::test]
    async fn test_self_loop_stops_silently_at_step_limit() {
        let mut graph = GraphRuntime::new();
        graph.add_node(
            "spin",
            node_fn(|mut state| {
                state.set("status", "again");
                Ok(state)
            }),
        );
        graph.add_conditional_edge("spin", "status", mapping(&[("again", Some("spin"))]));
        graph.set_entry("spin");

        let (state, logs) = graph.run(Map::new()).await.unwrap();
        assert_eq!(state.history.len(), DEFAULT_MAX_STEPS);
        assert_eq!(logs.len(), DEFAULT_MAX_STEPS + 1);
        assert_eq!(logs[49], "Step 50: Executing 'spin'");
        assert_eq!(logs.last().map(String::as_str), Some(FINISH_MESSAGE));
    }

    #[tokio::test]
    async fn test_custom_step_limit() {
        let mut graph = GraphRuntime::new().with_max_steps(3);
        graph.add_node("spin", noop());
        graph.add_edge("spin", "spin");
        graph.set_entry("spin");

        let (state, _) = graph.run(Map::new()).await.unwrap();
        assert_eq!(state.history.len(), 3);
    }

    #[tokio::test]
    async fn test_missing_entry_node_fails_before_execution() {
        let graph = GraphRuntime::new().with_entry("ghost");

        let err = graph.run(Map::new()).await.unwrap_err();
        assert_eq!(err.kind, GraphErrorKind::NodeNotFound);
        assert_eq!(err.node_id, "ghost");
        assert_eq!(err.message, "Node 'ghost' not found");
        assert!(err.execution_trace.is_empty());
    }

    #[tokio::test]
    async fn test_missing_edge_target_fails_with_trace() {
        let mut graph = GraphRuntime::new();
        graph.add_node("a", noop());
        graph.add_edge("a", "missing");
        graph.set_entry("a");

        let err = graph.run(Map::new()).await.unwrap_err();
        assert_eq!(err.kind, GraphErrorKind::NodeNotFound);
        assert_eq!(err.execution_trace, vec!["a"]);
        assert!(err.to_string().contains("trace: a"));
    }

    #[tokio::test]
    async fn test_node_error_propagates() {
        let mut graph = GraphRuntime::new();
        graph.add_node("boom", node_fn(|_| anyhow::bail!("exploded")));
        graph.set_entry("boom");

        let err = graph.run(Map::new()).await.unwrap_err();
        assert_eq!(err.kind, GraphErrorKind::NodeFailed);
        assert_eq!(err.node_id, "boom");
        assert!(err.message.contains("exploded"));
        assert!(err.execution_trace.is_empty());
    }

    #[tokio::test]
    async fn test_node_error_trace_lists_completed_steps() {
        let calls = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = calls.clone();
        let mut graph = chain();
        graph.add_edge("c", "a");
        graph.add_node(
            "b",
            node_fn(move |state| {
                if counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst) == 1 {
                    anyhow::bail!("second pass");
                }
                Ok(state)
            }),
        );

        let err = graph.run(Map::new()).await.unwrap_err();
        assert_eq!(err.kind, GraphErrorKind::NodeFailed);
        assert_eq!(err.node_id, "b");
        assert_eq!(err.execution_trace, vec!["a", "b", "c", "a"]);
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_edge_reregistration_last_write_wins() {
        let mut graph = GraphRuntime::new();
        for name in ["a", "b", "c"] {
            graph.add_node(name, noop());
        }
        graph.add_edge("a", "b");
        graph.add_edge("a", "c");
        graph.set_entry("a");

        let (state, _) = graph.run(Map::new()).await.unwrap();
        assert_eq!(state.history, vec!["a", "c"]);

        graph.add_conditional_edge("a", "route", mapping(&[("x", Some("b"))]));
        assert!(matches!(graph.edge("a"), Some(Edge::Conditional { .. })));
    }

    #[tokio::test]
    async fn test_node_reregistration_overwrites() {
        let mut graph = GraphRuntime::new();
        graph.add_node("a", node_fn(|_| anyhow::bail!("old")));
        graph.add_node(
            "a",
            node_fn(|mut state| {
                state.set("version", "new");
                Ok(state)
            }),
        );
        graph.set_entry("a");

        let (state, _) = graph.run(Map::new()).await.unwrap();
        assert_eq!(state.get("version"), Some(&json!("new")));
    }

    #[tokio::test]
    async fn test_async_nodes_are_awaited() {
        let mut graph = GraphRuntime::new();
        graph.add_node(
            "slow",
            async_node_fn(|mut state: WorkflowState| async move {
                tokio::task::yield_now().await;
                state.set("done", true);
                Ok::<_, anyhow::Error>(state)
            }),
        );
        graph.add_node("after", noop());
        graph.add_edge("slow", "after");
        graph.set_entry("slow");

        let (state, _) = graph.run(Map::new()).await.unwrap();
        assert_eq!(state.get("done"), Some(&json!(true)));
        assert_eq!(state.history, vec!["slow", "after"]);
    }

    #[tokio::test]
    async fn test_streaming_matches_batch() {
        let graph = chain();
        let (batch_state, batch_logs) = graph.run(data(json!({"x": 1}))).await.unwrap();

        let mut sink: Vec<String> = Vec::new();
        let (stream_state, stream_logs) = graph
            .run_streaming(data(json!({"x": 1})), &mut sink)
            .await
            .unwrap();

        assert_eq!(batch_state, stream_state);
        assert_eq!(batch_logs, stream_logs);
        assert_eq!(sink, stream_logs);
    }

    #[tokio::test]
    async fn test_sink_delivery_precedes_node_execution() {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<String>(16);
        let rx = std::sync::Mutex::new(rx);
        let mut graph = GraphRuntime::new().with_step_delay(Duration::ZERO);
        graph.add_node(
            "probe",
            node_fn(move |mut state| {
                // Message for this step must already be queued.
                let seen = rx.lock().unwrap().try_recv().ok();
                state.set("seen", seen);
                Ok(state)
            }),
        );
        graph.set_entry("probe");

        let mut sink = tx;
        let (state, _) = graph.run_streaming(Map::new(), &mut sink).await.unwrap();
        assert_eq!(state.get("seen"), Some(&json!("Step 1: Executing 'probe'")));
    }

    #[tokio::test]
    async fn test_failed_delivery_aborts_run() {
        let (mut tx, rx) = tokio::sync::mpsc::channel::<String>(1);
        drop(rx);

        let err = chain().run_streaming(Map::new(), &mut tx).await.unwrap_err();
        assert_eq!(err.kind, GraphErrorKind::DeliveryFailed);
        assert_eq!(err.node_id, "a");
    }

    #[tokio::test]
    async fn test_concurrent_runs_share_graph() {
        let graph = Arc::new(chain());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let graph = graph.clone();
                tokio::spawn(async move { graph.run(data(json!({ "id": i }))).await })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let (state, _) = handle.await.unwrap().unwrap();
            assert_eq!(state.get("id"), Some(&json!(i)));
            assert_eq!(state.history, vec!["a", "b", "c"]);
        }
    }

    #[test]
    fn test_defaults() {
        let graph = GraphRuntime::default();
        assert_eq!(graph.max_steps(), 50);
        assert_eq!(graph.entry(), None);
        assert_eq!(STREAM_STEP_DELAY, Duration::from_millis(500));
    }
}
