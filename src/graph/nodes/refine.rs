// Refine Node
// Shortens the summary one word at a time until it fits

use async_trait::async_trait;

use crate::graph::node::Node;
use crate::graph::state::WorkflowState;

pub const NAME: &str = "refine_summary";

/// Summaries longer than this keep looping through the refine step.
pub const TARGET_LENGTH: usize = 50;

pub struct RefineSummaryNode;

impl RefineSummaryNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RefineSummaryNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for RefineSummaryNode {
    async fn execute(&self, mut state: WorkflowState) -> anyhow::Result<WorkflowState> {
        let current = state.str_field("current_summary", "")?;

        let mut words: Vec<&str> = current.split_whitespace().collect();
        words.pop();
        let refined = words.join(" ");
        let length = refined.chars().count();

        let status = if length > TARGET_LENGTH { "continue" } else { "stop" };
        tracing::info!("Refined (len: {}). Status: {}", length, status);

        state.set("current_summary", refined);
        state.set("summary_length", length);
        state.set("status", status);
        Ok(state)
    }
}
