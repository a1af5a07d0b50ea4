//! The persistent store collaborator seam.
//!
//! Row-oriented upsert/delete keyed by `(schemaId, jobId|fieldId)`. The
//! sync layer is the only component that calls it, always from a computed
//! diff, never a full-table rewrite — except `replace_jobs` for explicit
//! "replace all" operations.

use async_trait::async_trait;
use thiserror::Error;

use dex_jobs::ExtractionJob;
use dex_model::{FieldId, JobId, SchemaField, SchemaId};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("remote store rejected write: {0}")]
    Remote(String),
}

pub type Result<T> = std::result::Result<T, SyncError>;

/// Remote row store. Every upsert must be idempotent and keyed by stable
/// id: writes arriving out of order converge to the last write per row.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    async fn upsert_job(&self, schema_id: &SchemaId, job: &ExtractionJob) -> Result<()>;
    async fn delete_job(&self, schema_id: &SchemaId, job_id: &JobId) -> Result<()>;
    async fn upsert_field(&self, schema_id: &SchemaId, field: &SchemaField) -> Result<()>;
    async fn delete_field(&self, schema_id: &SchemaId, field_id: &FieldId) -> Result<()>;
    async fn replace_jobs(&self, schema_id: &SchemaId, jobs: &[ExtractionJob]) -> Result<()>;
}
