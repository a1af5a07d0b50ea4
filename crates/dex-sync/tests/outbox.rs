//! Outbox drain behavior against an in-memory remote.

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::json;

use dex_jobs::{ExtractionJob, diff_jobs};
use dex_model::{FieldId, JobId, SchemaField, SchemaId};
use dex_sync::{Outbox, RemoteStore, Result, SyncError, SyncOp, SyncStatus};

/// Remote store backed by plain maps, mirroring the row-per-id layout the
/// real backend uses.
#[derive(Default)]
struct MemoryRemote {
    jobs: Mutex<BTreeMap<(SchemaId, JobId), ExtractionJob>>,
    fields: Mutex<BTreeMap<(SchemaId, FieldId), SchemaField>>,
}

impl MemoryRemote {
    fn job(&self, schema_id: &SchemaId, job_id: &JobId) -> Option<ExtractionJob> {
        self.jobs
            .lock()
            .unwrap()
            .get(&(schema_id.clone(), job_id.clone()))
            .cloned()
    }

    fn job_count(&self, schema_id: &SchemaId) -> usize {
        self.jobs
            .lock()
            .unwrap()
            .keys()
            .filter(|(sid, _)| sid == schema_id)
            .count()
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn upsert_job(&self, schema_id: &SchemaId, job: &ExtractionJob) -> Result<()> {
        self.jobs
            .lock()
            .unwrap()
            .insert((schema_id.clone(), job.id.clone()), job.clone());
        Ok(())
    }

    async fn delete_job(&self, schema_id: &SchemaId, job_id: &JobId) -> Result<()> {
        self.jobs
            .lock()
            .unwrap()
            .remove(&(schema_id.clone(), job_id.clone()));
        Ok(())
    }

    async fn upsert_field(&self, schema_id: &SchemaId, field: &SchemaField) -> Result<()> {
        self.fields
            .lock()
            .unwrap()
            .insert((schema_id.clone(), field.id.clone()), field.clone());
        Ok(())
    }

    async fn delete_field(&self, schema_id: &SchemaId, field_id: &FieldId) -> Result<()> {
        self.fields
            .lock()
            .unwrap()
            .remove(&(schema_id.clone(), field_id.clone()));
        Ok(())
    }

    async fn replace_jobs(&self, schema_id: &SchemaId, jobs: &[ExtractionJob]) -> Result<()> {
        let mut table = self.jobs.lock().unwrap();
        table.retain(|(sid, _), _| sid != schema_id);
        for job in jobs {
            table.insert((schema_id.clone(), job.id.clone()), job.clone());
        }
        Ok(())
    }
}

/// Remote that rejects everything, for error-status coverage.
struct RejectingRemote;

#[async_trait]
impl RemoteStore for RejectingRemote {
    async fn upsert_job(&self, _: &SchemaId, _: &ExtractionJob) -> Result<()> {
        Err(SyncError::Remote("permission denied".to_string()))
    }

    async fn delete_job(&self, _: &SchemaId, _: &JobId) -> Result<()> {
        Err(SyncError::Remote("permission denied".to_string()))
    }

    async fn upsert_field(&self, _: &SchemaId, _: &SchemaField) -> Result<()> {
        Err(SyncError::Remote("permission denied".to_string()))
    }

    async fn delete_field(&self, _: &SchemaId, _: &FieldId) -> Result<()> {
        Err(SyncError::Remote("permission denied".to_string()))
    }

    async fn replace_jobs(&self, _: &SchemaId, _: &[ExtractionJob]) -> Result<()> {
        Err(SyncError::Remote("permission denied".to_string()))
    }
}

fn schema_id() -> SchemaId {
    SchemaId::from("schema-1")
}

#[tokio::test]
async fn drain_pushes_pending_writes_and_returns_to_idle() {
    let outbox = Outbox::new();
    let remote = MemoryRemote::default();
    let sid = schema_id();
    let job = ExtractionJob::new("invoice.pdf");
    let job_id = job.id.clone();

    outbox.enqueue(SyncOp::UpsertJob {
        schema_id: sid.clone(),
        job,
    });
    outbox.drain(&remote).await;

    assert!(outbox.is_empty());
    assert_eq!(outbox.status(&sid), SyncStatus::Idle);
    assert_eq!(
        remote.job(&sid, &job_id).map(|j| j.file_name),
        Some("invoice.pdf".to_string())
    );
}

#[tokio::test]
async fn coalesced_burst_lands_as_single_final_row() {
    let outbox = Outbox::new();
    let remote = MemoryRemote::default();
    let sid = schema_id();

    let mut job = ExtractionJob::new("report.pdf");
    let job_id = job.id.clone();
    let field_id = FieldId::from("f-total");
    for total in [1, 2, 3] {
        job.results.insert(field_id.clone(), json!(total));
        outbox.enqueue(SyncOp::UpsertJob {
            schema_id: sid.clone(),
            job: job.clone(),
        });
    }

    assert_eq!(outbox.len(), 1);
    outbox.drain(&remote).await;

    let stored = remote.job(&sid, &job_id).expect("row");
    assert_eq!(stored.results.get(&field_id), Some(&json!(3)));
}

#[tokio::test]
async fn job_diff_enqueues_and_converges_remote_to_local() {
    let outbox = Outbox::new();
    let remote = MemoryRemote::default();
    let sid = schema_id();

    let kept = ExtractionJob::new("kept.pdf");
    let dropped = ExtractionJob::new("dropped.pdf");
    let prev = vec![kept.clone(), dropped.clone()];

    // Seed the remote with the previous state.
    outbox.enqueue(SyncOp::ReplaceJobs {
        schema_id: sid.clone(),
        jobs: prev.clone(),
    });
    outbox.drain(&remote).await;
    assert_eq!(remote.job_count(&sid), 2);

    let mut edited = kept.clone();
    edited.file_name = "kept-renamed.pdf".to_string();
    let added = ExtractionJob::new("added.pdf");
    let next = vec![edited.clone(), added.clone()];

    let diff = diff_jobs(&prev, &next);
    outbox.enqueue_job_diff(&sid, &diff);
    outbox.drain(&remote).await;

    assert_eq!(remote.job_count(&sid), 2);
    assert!(remote.job(&sid, &dropped.id).is_none());
    assert_eq!(
        remote.job(&sid, &kept.id).map(|j| j.file_name),
        Some("kept-renamed.pdf".to_string())
    );
    assert!(remote.job(&sid, &added.id).is_some());
}

#[tokio::test]
async fn delete_after_upsert_never_resurrects_the_row() {
    let outbox = Outbox::new();
    let remote = MemoryRemote::default();
    let sid = schema_id();
    let job = ExtractionJob::new("ephemeral.pdf");
    let job_id = job.id.clone();

    outbox.enqueue(SyncOp::UpsertJob {
        schema_id: sid.clone(),
        job,
    });
    outbox.enqueue(SyncOp::DeleteJob {
        schema_id: sid.clone(),
        job_id: job_id.clone(),
    });
    outbox.drain(&remote).await;

    assert!(remote.job(&sid, &job_id).is_none());
}

#[tokio::test]
async fn failed_write_records_error_status_and_is_not_retried() {
    let outbox = Outbox::new();
    let sid = schema_id();

    outbox.enqueue(SyncOp::UpsertJob {
        schema_id: sid.clone(),
        job: ExtractionJob::new("doomed.pdf"),
    });
    outbox.drain(&RejectingRemote).await;

    assert!(outbox.is_empty());
    assert_eq!(
        outbox.status(&sid),
        SyncStatus::Error("remote store rejected write: permission denied".to_string())
    );

    // A later successful drain for the same schema clears the badge.
    outbox.enqueue(SyncOp::UpsertJob {
        schema_id: sid.clone(),
        job: ExtractionJob::new("retry.pdf"),
    });
    let healthy = MemoryRemote::default();
    outbox.drain(&healthy).await;
    assert_eq!(outbox.status(&sid), SyncStatus::Idle);
    assert_eq!(healthy.job_count(&sid), 1);
}

#[tokio::test]
async fn field_writes_sync_independently_of_jobs() {
    let outbox = Outbox::new();
    let remote = MemoryRemote::default();
    let sid = schema_id();
    let field = SchemaField::string("Vendor Name");
    let field_id = field.id.clone();

    outbox.enqueue(SyncOp::UpsertField {
        schema_id: sid.clone(),
        field,
    });
    outbox.drain(&remote).await;
    assert!(
        remote
            .fields
            .lock()
            .unwrap()
            .contains_key(&(sid.clone(), field_id.clone()))
    );

    outbox.enqueue(SyncOp::DeleteField {
        schema_id: sid.clone(),
        field_id: field_id.clone(),
    });
    outbox.drain(&remote).await;
    assert!(
        !remote
            .fields
            .lock()
            .unwrap()
            .contains_key(&(sid, field_id))
    );
}
