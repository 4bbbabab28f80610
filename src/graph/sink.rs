// Progress Sink
// Optional per-step observer for streaming runs

use anyhow::Context;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Receives each run log message as the runtime produces it.
///
/// `deliver` is awaited before the runtime moves on, so every message is
/// delivered before the node it announces starts executing. A sink only
/// observes; it cannot alter the run state or the returned log.
#[async_trait]
pub trait ProgressSink: Send {
    async fn deliver(&mut self, message: &str) -> anyhow::Result<()>;
}

#[async_trait]
impl ProgressSink for Vec<String> {
    async fn deliver(&mut self, message: &str) -> anyhow::Result<()> {
        self.push(message.to_string());
        Ok(())
    }
}

#[async_trait]
impl ProgressSink for mpsc::Sender<String> {
    async fn deliver(&mut self, message: &str) -> anyhow::Result<()> {
        self.send(message.to_string())
            .await
            .context("progress receiver dropped")
    }
}
