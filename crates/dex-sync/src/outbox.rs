//! The sync outbox.
//!
//! Local mutations are applied optimistically and enqueue idempotent
//! operations here; a drain pass issues them against the remote store. The
//! queue coalesces last-write-wins per stable id, so a rapid burst of edits
//! to one row collapses to a single write and out-of-order arrival at the
//! remote converges to the same final state.

use std::collections::BTreeMap;
use std::sync::Mutex;

use tracing::{debug, warn};

use dex_jobs::{ExtractionJob, JobDiff};
use dex_model::{FieldId, JobId, SchemaField, SchemaId};

use crate::remote::RemoteStore;
use crate::status::SyncStatus;

/// One pending idempotent write.
#[derive(Debug, Clone)]
pub enum SyncOp {
    UpsertJob {
        schema_id: SchemaId,
        job: ExtractionJob,
    },
    DeleteJob {
        schema_id: SchemaId,
        job_id: JobId,
    },
    UpsertField {
        schema_id: SchemaId,
        field: SchemaField,
    },
    DeleteField {
        schema_id: SchemaId,
        field_id: FieldId,
    },
    /// Explicit full replacement of a schema's job table.
    ReplaceJobs {
        schema_id: SchemaId,
        jobs: Vec<ExtractionJob>,
    },
}

/// Coalescing key: one slot per remote row (or per table for replace).
#[derive(Debug, Clone, PartialEq, Eq)]
enum OpKey {
    Job(SchemaId, JobId),
    Field(SchemaId, FieldId),
    JobTable(SchemaId),
}

impl SyncOp {
    fn key(&self) -> OpKey {
        match self {
            SyncOp::UpsertJob { schema_id, job } => {
                OpKey::Job(schema_id.clone(), job.id.clone())
            }
            SyncOp::DeleteJob { schema_id, job_id } => {
                OpKey::Job(schema_id.clone(), job_id.clone())
            }
            SyncOp::UpsertField { schema_id, field } => {
                OpKey::Field(schema_id.clone(), field.id.clone())
            }
            SyncOp::DeleteField {
                schema_id,
                field_id,
            } => OpKey::Field(schema_id.clone(), field_id.clone()),
            SyncOp::ReplaceJobs { schema_id, .. } => OpKey::JobTable(schema_id.clone()),
        }
    }

    fn schema_id(&self) -> &SchemaId {
        match self {
            SyncOp::UpsertJob { schema_id, .. }
            | SyncOp::DeleteJob { schema_id, .. }
            | SyncOp::UpsertField { schema_id, .. }
            | SyncOp::DeleteField { schema_id, .. }
            | SyncOp::ReplaceJobs { schema_id, .. } => schema_id,
        }
    }

    fn is_job_op(&self) -> bool {
        matches!(
            self,
            SyncOp::UpsertJob { .. } | SyncOp::DeleteJob { .. } | SyncOp::ReplaceJobs { .. }
        )
    }
}

/// Queue of pending writes plus per-schema sync status.
#[derive(Debug, Default)]
pub struct Outbox {
    queue: Mutex<Vec<SyncOp>>,
    statuses: Mutex<BTreeMap<SchemaId, SyncStatus>>,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue one operation, replacing any pending operation for the same
    /// row. A later delete supersedes a pending upsert and vice versa.
    pub fn enqueue(&self, op: SyncOp) {
        let mut queue = self.lock_queue();
        if let SyncOp::ReplaceJobs { schema_id, .. } = &op {
            // A full replacement supersedes every pending job write for the
            // schema.
            queue.retain(|pending| !(pending.is_job_op() && pending.schema_id() == schema_id));
        }
        let key = op.key();
        queue.retain(|pending| pending.key() != key);
        queue.push(op);
    }

    /// Enqueue the writes for a computed job-list diff.
    pub fn enqueue_job_diff(&self, schema_id: &SchemaId, diff: &JobDiff) {
        for job in &diff.upserts {
            self.enqueue(SyncOp::UpsertJob {
                schema_id: schema_id.clone(),
                job: job.clone(),
            });
        }
        for job_id in &diff.deleted {
            self.enqueue(SyncOp::DeleteJob {
                schema_id: schema_id.clone(),
                job_id: job_id.clone(),
            });
        }
    }

    pub fn len(&self) -> usize {
        self.lock_queue().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock_queue().is_empty()
    }

    /// Current status for a schema; schemas never synced report idle.
    pub fn status(&self, schema_id: &SchemaId) -> SyncStatus {
        self.lock_statuses()
            .get(schema_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Issue every pending operation against the remote store.
    ///
    /// A failed operation records an error status for its schema and is
    /// dropped, not retried: local state is the source of truth and the
    /// next local mutation will enqueue a fresh write anyway.
    pub async fn drain(&self, remote: &dyn RemoteStore) {
        let ops = std::mem::take(&mut *self.lock_queue());
        if ops.is_empty() {
            return;
        }
        debug!(pending = ops.len(), "draining sync outbox");

        {
            let mut statuses = self.lock_statuses();
            for op in &ops {
                statuses.insert(op.schema_id().clone(), SyncStatus::Saving);
            }
        }

        let mut failed: BTreeMap<SchemaId, String> = BTreeMap::new();
        for op in &ops {
            let result = match op {
                SyncOp::UpsertJob { schema_id, job } => remote.upsert_job(schema_id, job).await,
                SyncOp::DeleteJob { schema_id, job_id } => {
                    remote.delete_job(schema_id, job_id).await
                }
                SyncOp::UpsertField { schema_id, field } => {
                    remote.upsert_field(schema_id, field).await
                }
                SyncOp::DeleteField {
                    schema_id,
                    field_id,
                } => remote.delete_field(schema_id, field_id).await,
                SyncOp::ReplaceJobs { schema_id, jobs } => {
                    remote.replace_jobs(schema_id, jobs).await
                }
            };
            if let Err(error) = result {
                warn!(schema = %op.schema_id(), %error, "remote write failed");
                failed.insert(op.schema_id().clone(), error.to_string());
            }
        }

        let mut statuses = self.lock_statuses();
        for op in &ops {
            let schema_id = op.schema_id();
            let status = match failed.get(schema_id) {
                Some(message) => SyncStatus::Error(message.clone()),
                None => SyncStatus::Idle,
            };
            statuses.insert(schema_id.clone(), status);
        }
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, Vec<SyncOp>> {
        self.queue
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_statuses(&self) -> std::sync::MutexGuard<'_, BTreeMap<SchemaId, SyncStatus>> {
        self.statuses
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Periodic background drain, intended for `tokio::spawn`.
pub async fn run_drain_loop(
    outbox: std::sync::Arc<Outbox>,
    remote: std::sync::Arc<dyn RemoteStore>,
    interval: std::time::Duration,
) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        outbox.drain(remote.as_ref()).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema_id() -> SchemaId {
        SchemaId::from("schema-1")
    }

    #[test]
    fn rapid_edits_to_one_job_coalesce_to_latest() {
        let outbox = Outbox::new();
        let mut job = ExtractionJob::new("a.pdf");
        outbox.enqueue(SyncOp::UpsertJob {
            schema_id: schema_id(),
            job: job.clone(),
        });
        job.file_name = "a-renamed.pdf".to_string();
        outbox.enqueue(SyncOp::UpsertJob {
            schema_id: schema_id(),
            job: job.clone(),
        });

        assert_eq!(outbox.len(), 1);
        let queued = outbox.lock_queue().pop().expect("op");
        match queued {
            SyncOp::UpsertJob { job, .. } => assert_eq!(job.file_name, "a-renamed.pdf"),
            other => panic!("unexpected op {other:?}"),
        }
    }

    #[test]
    fn delete_supersedes_pending_upsert() {
        let outbox = Outbox::new();
        let job = ExtractionJob::new("a.pdf");
        let job_id = job.id.clone();
        outbox.enqueue(SyncOp::UpsertJob {
            schema_id: schema_id(),
            job,
        });
        outbox.enqueue(SyncOp::DeleteJob {
            schema_id: schema_id(),
            job_id,
        });

        assert_eq!(outbox.len(), 1);
        assert!(matches!(
            outbox.lock_queue().pop(),
            Some(SyncOp::DeleteJob { .. })
        ));
    }

    #[test]
    fn replace_jobs_supersedes_pending_job_writes_only() {
        let outbox = Outbox::new();
        let sid = schema_id();
        outbox.enqueue(SyncOp::UpsertJob {
            schema_id: sid.clone(),
            job: ExtractionJob::new("a.pdf"),
        });
        outbox.enqueue(SyncOp::UpsertField {
            schema_id: sid.clone(),
            field: dex_model::SchemaField::string("Total"),
        });
        outbox.enqueue(SyncOp::ReplaceJobs {
            schema_id: sid,
            jobs: vec![],
        });

        // The field write survives, the job upsert does not.
        assert_eq!(outbox.len(), 2);
    }

    #[test]
    fn unsynced_schema_reports_idle() {
        let outbox = Outbox::new();
        assert_eq!(outbox.status(&schema_id()), SyncStatus::Idle);
    }
}
