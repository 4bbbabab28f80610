// Merge Node
// Joins chunk summaries into one draft summary

use async_trait::async_trait;

use crate::graph::node::Node;
use crate::graph::state::WorkflowState;

pub const NAME: &str = "merge_summaries";

pub struct MergeSummariesNode;

impl MergeSummariesNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MergeSummariesNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for MergeSummariesNode {
    async fn execute(&self, mut state: WorkflowState) -> anyhow::Result<WorkflowState> {
        let summary = state.str_list_field("chunk_summaries")?.join(" ");

        tracing::info!("Merged summaries ({} chars)", summary.chars().count());
        state.set("summary_length", summary.chars().count());
        state.set("current_summary", summary);
        Ok(state)
    }
}
