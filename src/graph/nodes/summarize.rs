// Summarize Node
// Mock per-chunk summaries: first three words of each chunk

use async_trait::async_trait;

use crate::graph::node::Node;
use crate::graph::state::WorkflowState;

pub const NAME: &str = "summarize_chunks";

const WORDS_PER_SUMMARY: usize = 3;

pub struct SummarizeChunksNode;

impl SummarizeChunksNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SummarizeChunksNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for SummarizeChunksNode {
    async fn execute(&self, mut state: WorkflowState) -> anyhow::Result<WorkflowState> {
        let summaries: Vec<String> = state
            .str_list_field("chunks")?
            .iter()
            .map(|chunk| summarize(chunk))
            .collect();

        tracing::info!("Generated {} chunk summaries", summaries.len());
        state.set("chunk_summaries", summaries);
        Ok(state)
    }
}

fn summarize(chunk: &str) -> String {
    let words: Vec<&str> = chunk.split_whitespace().take(WORDS_PER_SUMMARY).collect();
    format!("{}...", words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_summarize_keeps_three_words() {
        assert_eq!(summarize("the quick brown fox jumps"), "the quick brown...");
        assert_eq!(summarize("Short"), "Short...");
        assert_eq!(summarize("   "), "...");
    }

    #[tokio::test]
    async fn test_summarizes_every_chunk() {
        let mut state = WorkflowState::default();
        state.set("chunks", json!(["Hello world", "one two three four"]));

        let state = SummarizeChunksNode::new().execute(state).await.unwrap();
        assert_eq!(
            state.get("chunk_summaries"),
            Some(&json!(["Hello world...", "one two three..."]))
        );
    }
}
