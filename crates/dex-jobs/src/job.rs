//! Extraction jobs and their lifecycle.
//!
//! A job is one submitted document. It is created `pending` the instant a
//! file is accepted, transitions once to `processing` when the extraction
//! call is dispatched, and terminates in exactly one of `completed` or
//! `error`. Terminal states are final: re-running extraction mints a brand
//! new job id rather than mutating history.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use dex_model::{FieldId, JobId};

use crate::error::{JobError, Result};
use crate::review::FieldReviewMeta;

/// Processing state of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Error => "error",
        }
    }

    /// True for `completed` and `error`; no transition leaves these.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Error)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One submitted document and everything recorded about it.
///
/// `results` is keyed by *flattened* field ids even though the raw payload
/// returned by extraction is nested; the flattening step performs that
/// translation before [`ExtractionJob::complete`] is called.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionJob {
    pub id: JobId,
    pub file_name: String,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub results: BTreeMap<FieldId, Value>,
    #[serde(default)]
    pub review: BTreeMap<FieldId, FieldReviewMeta>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ExtractionJob {
    /// Create a job in `pending` state with a fresh id.
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            id: JobId::new(),
            file_name: file_name.into(),
            status: JobStatus::Pending,
            created_at: Utc::now(),
            completed_at: None,
            results: BTreeMap::new(),
            review: BTreeMap::new(),
            error: None,
        }
    }

    /// Mark the job as dispatched to the extractor.
    pub fn begin_processing(&mut self) -> Result<()> {
        self.transition(JobStatus::Pending, JobStatus::Processing)
    }

    /// Record a successful extraction with its flattened results.
    pub fn complete(&mut self, results: BTreeMap<FieldId, Value>) -> Result<()> {
        self.transition(JobStatus::Processing, JobStatus::Completed)?;
        self.results = results;
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    /// Record an extraction failure. No results are retained.
    pub fn fail(&mut self, message: impl Into<String>) -> Result<()> {
        self.transition(JobStatus::Processing, JobStatus::Error)?;
        self.error = Some(message.into());
        self.results.clear();
        self.completed_at = Some(Utc::now());
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    fn transition(&mut self, expected: JobStatus, next: JobStatus) -> Result<()> {
        if self.status != expected {
            return Err(JobError::InvalidTransition {
                id: self.id.clone(),
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }
}
