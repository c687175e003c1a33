use crate::client::RequestError;
use crate::domain_model::*;

#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error(transparent)]
    Request(#[from] RequestError),
    #[error("malformed task payload: {0}")]
    Decode(#[from] serde_json::Error),
}

#[async_trait::async_trait]
pub trait TaskService: Send + Sync {
    async fn list(&self, query: &TaskQuery) -> Result<Page<Task>, TaskError>;
    async fn list_all(&self, query: &TaskQuery) -> Result<Vec<Task>, TaskError>;
    async fn get(&self, id: TaskId) -> Result<Task, TaskError>;
    async fn create(&self, draft: &TaskDraft) -> Result<Task, TaskError>;
    async fn update(&self, id: TaskId, draft: &TaskDraft) -> Result<Task, TaskError>;
    async fn patch(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, TaskError>;
    async fn delete(&self, id: TaskId) -> Result<(), TaskError>;
    async fn analytics(&self) -> Result<Analytics, TaskError>;
    async fn insights(&self) -> Result<Insights, TaskError>;
    async fn reminders(&self) -> Result<Reminders, TaskError>;
}
