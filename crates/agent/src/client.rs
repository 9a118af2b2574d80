//! HTTP client for the orchestrator's internal task endpoints.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use calc_core::wire::{TaskReport, TaskResponse};
use calc_core::ReadyTask;

use crate::error::AgentError;
use crate::source::TaskSource;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Client for `GET /internal/task` and `POST /internal/task`.
pub struct OrchestratorClient {
    base_url: String,
    http: reqwest::Client,
}

impl OrchestratorClient {
    pub fn new(base_url: &str) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::new();
        Self { base_url, http }
    }

    fn task_url(&self) -> String {
        format!("{}/internal/task", self.base_url)
    }

    async fn unexpected(resp: reqwest::Response) -> AgentError {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        AgentError::UnexpectedStatus { status, body }
    }
}

#[async_trait]
impl TaskSource for OrchestratorClient {
    async fn fetch(&self) -> Result<Option<ReadyTask>, AgentError> {
        let resp = self
            .http
            .get(self.task_url())
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        match resp.status() {
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::OK => {
                let body: TaskResponse = resp
                    .json()
                    .await
                    .map_err(|e| AgentError::Decode(e.to_string()))?;
                Ok(Some(body.task))
            }
            _ => Err(Self::unexpected(resp).await),
        }
    }

    async fn report(&self, report: &TaskReport) -> Result<(), AgentError> {
        let resp = self
            .http
            .post(self.task_url())
            .timeout(REQUEST_TIMEOUT)
            .json(report)
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(Self::unexpected(resp).await);
        }
        Ok(())
    }
}
