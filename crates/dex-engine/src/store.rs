//! In-memory workspace store.
//!
//! The workspace is an ordered set of schema definitions. Mutation is
//! single-writer replace-with-new-value behind a mutex; the lock is never
//! held across an await, so in-flight pipelines interleave freely with
//! local edits. A pipeline that finds its job gone simply no-ops.

use std::sync::Mutex;

use dex_jobs::{ExtractionJob, SchemaDefinition};
use dex_model::{JobId, SchemaField, SchemaId};

#[derive(Debug, Default)]
pub struct WorkspaceStore {
    schemas: Mutex<Vec<SchemaDefinition>>,
}

impl WorkspaceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_schema(&self, schema: SchemaDefinition) -> SchemaId {
        let id = schema.id.clone();
        self.lock().push(schema);
        id
    }

    pub fn remove_schema(&self, id: &SchemaId) -> bool {
        let mut schemas = self.lock();
        let before = schemas.len();
        schemas.retain(|schema| &schema.id != id);
        schemas.len() != before
    }

    /// Read access to one schema.
    pub fn with_schema<R>(
        &self,
        id: &SchemaId,
        read: impl FnOnce(&SchemaDefinition) -> R,
    ) -> Option<R> {
        let schemas = self.lock();
        schemas.iter().find(|schema| &schema.id == id).map(read)
    }

    /// Write access to one schema.
    pub fn with_schema_mut<R>(
        &self,
        id: &SchemaId,
        write: impl FnOnce(&mut SchemaDefinition) -> R,
    ) -> Option<R> {
        let mut schemas = self.lock();
        schemas
            .iter_mut()
            .find(|schema| &schema.id == id)
            .map(write)
    }

    /// Snapshot of a schema's field tree, taken before awaiting.
    pub fn snapshot_fields(&self, id: &SchemaId) -> Option<Vec<SchemaField>> {
        self.with_schema(id, |schema| schema.fields.clone())
    }

    /// Snapshot of a schema's job list.
    pub fn snapshot_jobs(&self, id: &SchemaId) -> Option<Vec<ExtractionJob>> {
        self.with_schema(id, |schema| schema.jobs.clone())
    }

    pub fn insert_job(&self, schema_id: &SchemaId, job: ExtractionJob) -> bool {
        self.with_schema_mut(schema_id, |schema| schema.add_job(job))
            .is_some()
    }

    /// Edit a job if it still exists. Returns false when the schema or job
    /// is gone, which in-flight pipelines treat as "deleted underneath us".
    pub fn update_job(
        &self,
        schema_id: &SchemaId,
        job_id: &JobId,
        edit: impl FnOnce(&mut ExtractionJob),
    ) -> bool {
        self.with_schema_mut(schema_id, |schema| match schema.job_mut(job_id) {
            Some(job) => {
                edit(job);
                true
            }
            None => false,
        })
        .unwrap_or(false)
    }

    /// Clone a job out for lock-free async work.
    pub fn snapshot_job(&self, schema_id: &SchemaId, job_id: &JobId) -> Option<ExtractionJob> {
        self.with_schema(schema_id, |schema| schema.job(job_id).cloned())
            .flatten()
    }

    pub fn delete_job(&self, schema_id: &SchemaId, job_id: &JobId) -> bool {
        self.with_schema_mut(schema_id, |schema| schema.delete_job(job_id))
            .unwrap_or(false)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SchemaDefinition>> {
        // A poisoned lock means a writer panicked; the data itself is a
        // plain Vec and remains structurally valid.
        self.schemas
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_job_on_deleted_job_is_noop() {
        let store = WorkspaceStore::new();
        let mut schema = SchemaDefinition::new("Invoices");
        let job = ExtractionJob::new("a.pdf");
        let job_id = job.id.clone();
        schema.add_job(job);
        let schema_id = store.add_schema(schema);

        assert!(store.delete_job(&schema_id, &job_id));
        let touched = store.update_job(&schema_id, &job_id, |job| {
            job.file_name = "never".to_string();
        });
        assert!(!touched);
    }

    #[test]
    fn snapshot_fields_is_a_deep_copy() {
        let store = WorkspaceStore::new();
        let mut schema = SchemaDefinition::new("Invoices");
        schema.add_field(dex_model::SchemaField::string("Total"));
        let schema_id = store.add_schema(schema);

        let snapshot = store.snapshot_fields(&schema_id).expect("fields");
        store.with_schema_mut(&schema_id, |schema| schema.fields.clear());
        assert_eq!(snapshot.len(), 1);
    }
}
