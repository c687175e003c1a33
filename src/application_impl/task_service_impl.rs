use crate::api::v1::*;
use crate::application_port::*;
use crate::client::RequestPipeline;
use crate::domain_model::*;
use crate::domain_port::*;
use serde::de::DeserializeOwned;
use std::sync::Arc;

/// Task endpoints, all protected and all sent through the refresh pipeline.
pub struct RealTaskService {
    pipeline: Arc<RequestPipeline>,
}

impl RealTaskService {
    pub fn new(pipeline: Arc<RequestPipeline>) -> Self {
        Self { pipeline }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: HttpRequest) -> Result<T, TaskError> {
        let response = self.pipeline.send(request).await?;
        Ok(response.json()?)
    }
}

fn json_body<T: serde::Serialize>(value: &T) -> Result<serde_json::Value, TaskError> {
    Ok(serde_json::to_value(value)?)
}

#[async_trait::async_trait]
impl TaskService for RealTaskService {
    async fn list(&self, query: &TaskQuery) -> Result<Page<Task>, TaskError> {
        self.fetch(HttpRequest::get(TASKS).with_query(query.to_pairs()))
            .await
    }

    async fn list_all(&self, query: &TaskQuery) -> Result<Vec<Task>, TaskError> {
        let query = query.without_page();
        self.fetch(HttpRequest::get(TASKS_ALL).with_query(query.to_pairs()))
            .await
    }

    async fn get(&self, id: TaskId) -> Result<Task, TaskError> {
        self.fetch(HttpRequest::get(task(id))).await
    }

    async fn create(&self, draft: &TaskDraft) -> Result<Task, TaskError> {
        let task: Task = self
            .fetch(HttpRequest::post(TASKS).with_json(json_body(draft)?))
            .await?;
        tracing::info!(id = %task.id, "task created");
        Ok(task)
    }

    async fn update(&self, id: TaskId, draft: &TaskDraft) -> Result<Task, TaskError> {
        self.fetch(HttpRequest::put(task(id)).with_json(json_body(draft)?))
            .await
    }

    async fn patch(&self, id: TaskId, patch: &TaskPatch) -> Result<Task, TaskError> {
        self.fetch(HttpRequest::patch(task(id)).with_json(json_body(patch)?))
            .await
    }

    async fn delete(&self, id: TaskId) -> Result<(), TaskError> {
        self.pipeline.send(HttpRequest::delete(task(id))).await?;
        tracing::info!(%id, "task deleted");
        Ok(())
    }

    async fn analytics(&self) -> Result<Analytics, TaskError> {
        self.fetch(HttpRequest::get(TASKS_ANALYTICS)).await
    }

    async fn insights(&self) -> Result<Insights, TaskError> {
        self.fetch(HttpRequest::get(TASKS_INSIGHTS)).await
    }

    async fn reminders(&self) -> Result<Reminders, TaskError> {
        self.fetch(HttpRequest::get(TASKS_REMINDERS)).await
    }
}
