use std::time::Duration;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde_json::Value;
use tokio::time::sleep;
use tracing::{debug, info};

use crate::error::{ClientError, Result};
use crate::rest::resource::{ResourceClient, ResourceRequest};
use crate::rest::response::RestResponse;

/// Floor for the poll interval. Requests for anything shorter are clamped
/// up to this, bounding the request rate against the remote service.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_secs(10);

/// Execution state of a remote job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Queued,
    Running,
    Done,
    Error,
    Aborted,
    Other(String),
}

impl JobStatus {
    pub fn from_name(name: &str) -> Self {
        match name.to_ascii_uppercase().as_str() {
            "PENDING" => JobStatus::Pending,
            "QUEUED" => JobStatus::Queued,
            "RUNNING" => JobStatus::Running,
            "DONE" => JobStatus::Done,
            "ERROR" => JobStatus::Error,
            "ABORTED" => JobStatus::Aborted,
            other => JobStatus::Other(other.to_string()),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Done | JobStatus::Error | JobStatus::Aborted)
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, JobStatus::Error | JobStatus::Aborted)
    }
}

/// Status block attached to a job record: machine name plus the
/// human-readable context surfaced on failure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionStatus {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub message: String,
}

impl ExecutionStatus {
    pub fn status(&self) -> JobStatus {
        JobStatus::from_name(&self.name)
    }

    /// Status timestamps come as compact `yyyyMMddHHmmss` strings; render
    /// them readably when they parse, pass them through when they don't.
    fn display_date(&self) -> String {
        NaiveDateTime::parse_from_str(&self.date, "%Y%m%d%H%M%S")
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|_| self.date.clone())
    }
}

/// Fully-resolved pointer to one remote job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobHandle {
    pub study: String,
    pub job_id: String,
}

/// Which job to wait for: either a prior submission response or an explicit
/// (study, job id) pair, plus the requested poll interval. Supplying both
/// selectors, neither, or more than one job id is caller misuse.
#[derive(Debug, Clone, Default)]
pub struct JobTarget {
    response: Option<RestResponse>,
    study: Option<String>,
    job_id: Option<String>,
    poll_interval: Option<Duration>,
}

impl JobTarget {
    /// Track the job described by a submission response (first record's
    /// `uuid` and `studyUuid`).
    pub fn from_response(response: RestResponse) -> Self {
        Self {
            response: Some(response),
            ..Self::default()
        }
    }

    /// Track an explicitly identified job.
    pub fn job(study: impl Into<String>, job_id: impl Into<String>) -> Self {
        Self {
            study: Some(study.into()),
            job_id: Some(job_id.into()),
            ..Self::default()
        }
    }

    /// Requested time between two status polls. Values below
    /// [`MIN_POLL_INTERVAL`] are clamped up to it.
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub(crate) fn effective_interval(&self) -> Duration {
        self.poll_interval.unwrap_or(MIN_POLL_INTERVAL).max(MIN_POLL_INTERVAL)
    }

    pub(crate) fn resolve(&self) -> Result<JobHandle> {
        if self.response.is_some() && (self.study.is_some() || self.job_id.is_some()) {
            return Err(ClientError::Usage(
                "give either a submission response or an explicit study and job id, not both"
                    .to_string(),
            ));
        }

        let (study, job_id) = if let Some(response) = &self.response {
            let record = response.first_result().ok_or_else(|| {
                ClientError::Usage("submission response carries no result record".to_string())
            })?;
            let study = record
                .get("studyUuid")
                .and_then(Value::as_str)
                .ok_or_else(|| {
                    ClientError::Usage("submission response carries no studyUuid".to_string())
                })?;
            let job_id = record.get("uuid").and_then(Value::as_str).ok_or_else(|| {
                ClientError::Usage("submission response carries no job uuid".to_string())
            })?;
            (study.to_string(), job_id.to_string())
        } else {
            match (&self.study, &self.job_id) {
                (Some(study), Some(job_id)) => (study.clone(), job_id.clone()),
                _ => {
                    return Err(ClientError::Usage(
                        "either a submission response or both study and job id must be provided"
                            .to_string(),
                    ))
                }
            }
        };

        if job_id.contains(',') {
            return Err(ClientError::Usage(format!(
                "only one job id is allowed, got '{}'",
                job_id
            )));
        }

        Ok(JobHandle { study, job_id })
    }
}

/// Poll the job's status until it reaches a terminal state.
///
/// The loop is deliberately unbounded: termination depends on the remote
/// job reaching DONE, ERROR or ABORTED. Callers needing a deadline wrap
/// the future in `tokio::time::timeout`.
pub(crate) async fn wait_for_job(
    jobs: &ResourceClient,
    target: &JobTarget,
) -> Result<ExecutionStatus> {
    let handle = target.resolve()?;
    let interval = target.effective_interval();

    info!(
        study = %handle.study,
        job_id = %handle.job_id,
        interval_secs = interval.as_secs(),
        "waiting for job"
    );

    loop {
        let response = jobs
            .call(
                ResourceRequest::get("info")
                    .query_id(&handle.job_id)
                    .param("study", &handle.study)
                    .param("include", "internal.status"),
            )
            .await?;

        let status = extract_status(&response)?;
        match status.status() {
            JobStatus::Done => {
                info!(job_id = %handle.job_id, "job finished successfully");
                return Ok(status);
            }
            terminal if terminal.is_failure() => {
                return Err(ClientError::JobFailed {
                    name: status.name.clone(),
                    date: status.display_date(),
                    message: status.message.clone(),
                });
            }
            current => {
                debug!(job_id = %handle.job_id, status = ?current, "job still in progress");
                sleep(interval).await;
            }
        }
    }
}

/// Pull the status block out of a job info record, accepting both the
/// nested `internal.status` shape and the flat legacy `status` field.
fn extract_status(response: &RestResponse) -> Result<ExecutionStatus> {
    let record = response.first_result().ok_or_else(|| {
        ClientError::remote(None, "job info response carries no result record")
    })?;

    let status_value = record
        .pointer("/internal/status")
        .or_else(|| record.get("status"))
        .cloned()
        .ok_or_else(|| ClientError::remote(None, "job info response carries no status"))?;

    serde_json::from_value(status_value)
        .map_err(|e| ClientError::remote(None, format!("malformed job status: {}", e)))
}
