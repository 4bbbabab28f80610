// Split Node
// Breaks raw input text into sentence chunks

use async_trait::async_trait;

use crate::graph::node::Node;
use crate::graph::state::WorkflowState;

pub const NAME: &str = "split_text";

pub struct SplitTextNode;

impl SplitTextNode {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SplitTextNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Node for SplitTextNode {
    async fn execute(&self, mut state: WorkflowState) -> anyhow::Result<WorkflowState> {
        let text = state.str_field("text", "")?;
        let chunks = split_sentences(&text);

        tracing::info!("Split input into {} chunks", chunks.len());
        state.set("chunks", chunks);
        Ok(state)
    }
}

/// Splits on '.', trimming pieces and dropping empty ones.
fn split_sentences(text: &str) -> Vec<String> {
    text.split('.')
        .map(str::trim)
        .filter(|chunk| !chunk.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_sentences() {
        assert_eq!(
            split_sentences("Hello world. Short."),
            vec!["Hello world", "Short"]
        );
        assert_eq!(split_sentences(" a .. b. "), vec!["a", "b"]);
        assert!(split_sentences("").is_empty());
    }

    #[tokio::test]
    async fn test_missing_text_yields_no_chunks() {
        let state = SplitTextNode::new()
            .execute(WorkflowState::default())
            .await
            .unwrap();
        assert_eq!(state.get("chunks"), Some(&json!([])));
    }

    #[tokio::test]
    async fn test_non_string_text_is_rejected() {
        let mut state = WorkflowState::default();
        state.set("text", 42);
        assert!(SplitTextNode::new().execute(state).await.is_err());
    }
}
