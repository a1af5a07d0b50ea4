use thiserror::Error;

use dex_model::JobId;

use crate::job::JobStatus;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("job {id} cannot transition from {from} to {to}")]
    InvalidTransition {
        id: JobId,
        from: JobStatus,
        to: JobStatus,
    },
}

pub type Result<T> = std::result::Result<T, JobError>;
