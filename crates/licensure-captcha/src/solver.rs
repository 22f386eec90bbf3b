//! CAPTCHA solving against a create-task / poll-result service.

use crate::error::{CaptchaError, Result};
use crate::task::{
    CaptchaTask, CreateTaskRequest, CreateTaskResponse, TaskResultRequest, TaskResultResponse,
    TaskSpec, TaskStatus,
};
use async_trait::async_trait;
use licensure_core::CaptchaConfig;
use reqwest::Client;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// CAPTCHA solver trait for pluggable implementations.
#[async_trait]
pub trait CaptchaSolver: Send + Sync {
    /// Solve the challenge embedded at `website_url` and return the token.
    ///
    /// Cancelling `cancel` aborts the solve immediately with
    /// [`CaptchaError::Cancelled`].
    async fn solve(
        &self,
        cancel: &CancellationToken,
        website_url: &str,
        site_key: &str,
    ) -> Result<String>;
}

/// Client for a CapSolver-compatible solving service.
///
/// Each [`CaptchaSolver::solve`] call creates exactly one task, then polls
/// it at a fixed interval until it is ready, fails, or the deadline
/// (counted from task creation) passes.
pub struct CapSolverClient {
    api_key: String,
    endpoint: String,
    task_type: String,
    poll_interval: Duration,
    timeout: Duration,
    client: Client,
}

impl CapSolverClient {
    /// Create a client from configuration.
    ///
    /// Returns `Ok(None)` when no API key is configured.
    pub fn from_config(config: &CaptchaConfig) -> Result<Option<Self>> {
        let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) else {
            return Ok(None);
        };

        let solver = Self::new(api_key, &config.endpoint)?
            .with_task_type(&config.task_type)
            .with_poll_interval(config.poll_interval())
            .with_timeout(config.timeout());
        Ok(Some(solver))
    }

    /// Create a client with default protocol timings.
    pub fn new(api_key: impl Into<String>, endpoint: impl Into<String>) -> Result<Self> {
        let defaults = CaptchaConfig::default();
        let client = Client::builder()
            .timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| CaptchaError::Transport {
                step: "client",
                source: e,
            })?;

        Ok(Self {
            api_key: api_key.into(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            poll_interval: defaults.poll_interval(),
            timeout: defaults.timeout(),
            task_type: defaults.task_type,
            client,
        })
    }

    /// Set the task type requested from the service.
    #[must_use]
    pub fn with_task_type(mut self, task_type: impl Into<String>) -> Self {
        self.task_type = task_type.into();
        self
    }

    /// Set the delay between polls.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Set the solve deadline.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn create_task(&self, website_url: &str, site_key: &str) -> Result<CaptchaTask> {
        let request = CreateTaskRequest {
            client_key: &self.api_key,
            task: TaskSpec {
                task_type: &self.task_type,
                website_url,
                website_key: site_key,
            },
        };

        let body = self
            .client
            .post(format!("{}/createTask", self.endpoint))
            .json(&request)
            .send()
            .await
            .map_err(|e| CaptchaError::Transport {
                step: "create_task",
                source: e,
            })?
            .text()
            .await
            .map_err(|e| CaptchaError::Transport {
                step: "create_task",
                source: e,
            })?;

        let response: CreateTaskResponse =
            serde_json::from_str(&body).map_err(|e| CaptchaError::Parse {
                step: "create_task",
                message: format!("{e}: {body}"),
            })?;

        if response.error_id != 0 {
            return Err(CaptchaError::Vendor {
                code: response.error_code,
                description: response.error_description,
            });
        }
        if response.task_id.is_empty() {
            return Err(CaptchaError::Parse {
                step: "create_task",
                message: "response carried no taskId".to_string(),
            });
        }

        Ok(CaptchaTask::created(response.task_id))
    }

    async fn poll_once(&self, task_id: &str) -> Result<TaskResultResponse> {
        let request = TaskResultRequest {
            client_key: &self.api_key,
            task_id,
        };

        let body = self
            .client
            .post(format!("{}/getTaskResult", self.endpoint))
            .json(&request)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| CaptchaError::Transport {
                step: "get_task_result",
                source: e,
            })?
            .text()
            .await
            .map_err(|e| CaptchaError::Transport {
                step: "get_task_result",
                source: e,
            })?;

        serde_json::from_str(&body).map_err(|e| CaptchaError::Parse {
            step: "get_task_result",
            message: e.to_string(),
        })
    }

    /// Poll until the task leaves `Processing`. Has no deadline of its own;
    /// the caller bounds it.
    async fn wait_for_token(&self, mut task: CaptchaTask) -> Result<String> {
        let mut polls = 0u32;
        loop {
            tokio::time::sleep(self.poll_interval).await;
            polls += 1;

            let response = match self.poll_once(&task.id).await {
                Ok(response) => response,
                Err(e) => {
                    debug!(task_id = %task.id, polls, error = %e, "poll failed, retrying");
                    continue;
                }
            };

            task.apply(&response);
            match task.status {
                TaskStatus::Processing => {
                    debug!(task_id = %task.id, polls, "task still processing");
                }
                TaskStatus::Ready if task.token.is_empty() => {
                    warn!(task_id = %task.id, "task ready without a token");
                    return Err(CaptchaError::EmptyToken { task_id: task.id });
                }
                TaskStatus::Ready => {
                    info!(task_id = %task.id, polls, "CAPTCHA solved");
                    return Ok(task.token);
                }
                TaskStatus::Error => {
                    return Err(CaptchaError::Vendor {
                        code: response.error_code,
                        description: response.error_description,
                    });
                }
            }
        }
    }
}

#[async_trait]
impl CaptchaSolver for CapSolverClient {
    async fn solve(
        &self,
        cancel: &CancellationToken,
        website_url: &str,
        site_key: &str,
    ) -> Result<String> {
        let task = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(CaptchaError::Cancelled),
            task = self.create_task(website_url, site_key) => task?,
        };

        let created_at = Instant::now();
        let deadline = created_at + self.timeout;
        let task_id = task.id.clone();
        debug!(task_id = %task_id, website_url, "CAPTCHA task created");

        tokio::select! {
            biased;
            () = cancel.cancelled() => Err(CaptchaError::Cancelled),
            outcome = tokio::time::timeout_at(deadline, self.wait_for_token(task)) => {
                outcome.unwrap_or_else(|_| {
                    warn!(task_id = %task_id, "CAPTCHA solve timed out");
                    Err(CaptchaError::TimedOut {
                        task_id,
                        waited: created_at.elapsed(),
                    })
                })
            }
        }
    }
}
