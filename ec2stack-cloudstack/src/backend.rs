//! Backend invocation: sending commands and resolving asynchronous jobs.

use crate::command::BackendCommand;
use crate::error::{Ec2Error, Result};
use crate::result::BackendResult;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Executes one CloudStack command and returns the raw JSON answer,
/// still wrapped in its `<command>response` object.
#[async_trait::async_trait]
pub trait CloudStackTransport: Send + Sync {
    async fn execute(&self, command: &BackendCommand) -> Result<Value>;
}

/// Async job polling settings.
#[derive(Debug, Clone)]
pub struct RequesterConfig {
    pub poll_interval: Duration,
    pub max_polls: u32,
}

impl Default for RequesterConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            max_polls: 1800, // one hour at the default interval
        }
    }
}

const JOB_PENDING: i64 = 0;

#[derive(Clone)]
pub struct Requester {
    transport: Arc<dyn CloudStackTransport>,
    config: RequesterConfig,
}

impl Requester {
    pub fn new(transport: Arc<dyn CloudStackTransport>, config: RequesterConfig) -> Self {
        Self { transport, config }
    }

    pub fn config(&self) -> &RequesterConfig {
        &self.config
    }

    /// Send a command and return its unwrapped answer as-is.
    pub async fn make_request(&self, command: &BackendCommand) -> Result<BackendResult> {
        debug!(command = command.command(), params = ?command.params(), "Sending CloudStack command");
        let raw = self.transport.execute(command).await?;
        BackendResult::from_response(raw)
    }

    /// Send a command and, when CloudStack answers with a job id, poll
    /// `queryAsyncJobResult` until the job leaves the pending state.
    ///
    /// Returns the job's `jobresult`, which for a failed job is the payload
    /// carrying `errortext`.
    pub async fn make_request_async(&self, command: &BackendCommand) -> Result<BackendResult> {
        let result = self.make_request(command).await?;
        if result.is_error() {
            return Ok(result);
        }
        let Some(job_id) = result.job_id().map(str::to_string) else {
            return Ok(result);
        };

        let query = BackendCommand::new("queryAsyncJobResult").with_param("jobid", &job_id);
        for _ in 0..self.config.max_polls {
            tokio::time::sleep(self.config.poll_interval).await;

            let mut status = self.make_request(&query).await?;
            if status.is_error() {
                return Ok(status);
            }
            let job_status = status
                .get("jobstatus")
                .and_then(Value::as_i64)
                .ok_or_else(|| {
                    Ec2Error::Backend(format!("job {job_id} answered without jobstatus"))
                })?;
            if job_status == JOB_PENDING {
                continue;
            }

            info!(
                command = command.command(),
                job_id = %job_id,
                job_status,
                "CloudStack job finished"
            );
            return match status.take("jobresult") {
                Some(job_result) => BackendResult::from_value(job_result),
                None => Ok(BackendResult::default()),
            };
        }

        warn!(
            command = command.command(),
            job_id = %job_id,
            "CloudStack job still pending after {} polls",
            self.config.max_polls
        );
        Err(Ec2Error::Backend(format!(
            "job {job_id} did not complete after {} polls",
            self.config.max_polls
        )))
    }
}
