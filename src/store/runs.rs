use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::core::errors::ApiError;
use crate::graph::WorkflowState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Running,
    Completed,
    Failed,
}

/// Status and outcome of one background run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunRecord {
    pub run_id: String,
    pub graph_id: String,
    pub status: RunStatus,
    pub state: Option<WorkflowState>,
    pub logs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunRecord {
    pub fn running(run_id: impl Into<String>, graph_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            graph_id: graph_id.into(),
            status: RunStatus::Running,
            state: None,
            logs: Vec::new(),
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }
}

/// Abstract trait for run bookkeeping.
#[async_trait]
pub trait RunStore: Send + Sync {
    async fn insert(&self, record: RunRecord);

    async fn get(&self, run_id: &str) -> Option<RunRecord>;

    /// Mark a run completed with its final state and log.
    async fn complete(
        &self,
        run_id: &str,
        state: WorkflowState,
        logs: Vec<String>,
    ) -> Result<(), ApiError>;

    /// Mark a run failed.
    async fn fail(&self, run_id: &str, error: String) -> Result<(), ApiError>;
}

#[derive(Default)]
pub struct InMemoryRunStore {
    runs: RwLock<HashMap<String, RunRecord>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    async fn finish(
        &self,
        run_id: &str,
        update: impl FnOnce(&mut RunRecord) + Send,
    ) -> Result<(), ApiError> {
        let mut runs = self.runs.write().await;
        let record = runs
            .get_mut(run_id)
            .ok_or_else(|| ApiError::NotFound(format!("Run ID {} not found", run_id)))?;
        update(record);
        record.finished_at = Some(Utc::now());
        Ok(())
    }
}

#[async_trait]
impl RunStore for InMemoryRunStore {
    async fn insert(&self, record: RunRecord) {
        self.runs
            .write()
            .await
            .insert(record.run_id.clone(), record);
    }

    async fn get(&self, run_id: &str) -> Option<RunRecord> {
        self.runs.read().await.get(run_id).cloned()
    }

    async fn complete(
        &self,
        run_id: &str,
        state: WorkflowState,
        logs: Vec<String>,
    ) -> Result<(), ApiError> {
        self.finish(run_id, |record| {
            record.status = RunStatus::Completed;
            record.state = Some(state);
            record.logs = logs;
        })
        .await
    }

    async fn fail(&self, run_id: &str, error: String) -> Result<(), ApiError> {
        self.finish(run_id, |record| {
            record.status = RunStatus::Failed;
            record.error = Some(error);
        })
        .await
    }
}
