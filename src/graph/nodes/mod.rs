// Graph Nodes Module
// Builtin text-summarization tools

pub mod merge;
pub mod refine;
pub mod split;
pub mod summarize;

use std::sync::Arc;

pub use merge::MergeSummariesNode;
pub use refine::RefineSummaryNode;
pub use split::SplitTextNode;
pub use summarize::SummarizeChunksNode;

use super::registry::NodeRegistry;

/// Registers every builtin tool under its public name.
pub fn register_builtin_tools(registry: &mut NodeRegistry) {
    registry
        .register(split::NAME, Arc::new(SplitTextNode::new()))
        .register(summarize::NAME, Arc::new(SummarizeChunksNode::new()))
        .register(merge::NAME, Arc::new(MergeSummariesNode::new()))
        .register(refine::NAME, Arc::new(RefineSummaryNode::new()));
}
