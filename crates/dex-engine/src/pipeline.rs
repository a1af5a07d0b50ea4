//! The per-document processing pipeline.
//!
//! Each submitted document runs `extract -> flatten -> transform` as one
//! independent async task; pipelines for different jobs interleave freely
//! and may settle out of order. Within one pipeline the stages are strictly
//! sequential. No stage ever propagates an error to the caller: extraction
//! and flatten failures become an `error` job, transformation failures are
//! stored in-band per field, and a job deleted mid-flight makes the
//! remaining stages no-ops.

use tracing::{debug, info, warn};

use dex_jobs::{ExtractionJob, JobStatus};
use dex_model::{JobId, SchemaId, flatten_results};
use dex_transform::{SourceDocument, TransformProvider, evaluate_transformations};

use crate::extractor::{Document, Extractor};
use crate::store::WorkspaceStore;

/// Process one document against a schema from submission to settlement.
///
/// Returns the id of the job created for this document, or `None` when the
/// schema does not exist. The returned job may be in any state, including
/// already deleted by the user.
pub async fn process_document(
    store: &WorkspaceStore,
    schema_id: &SchemaId,
    document: Document,
    extractor: &dyn Extractor,
    provider: &dyn TransformProvider,
) -> Option<JobId> {
    // The job exists in pending state the instant the file is accepted.
    let fields = store.snapshot_fields(schema_id)?;
    let job = ExtractionJob::new(document.file_name.clone());
    let job_id = job.id.clone();
    store.insert_job(schema_id, job);

    // pending -> processing when the extraction call is dispatched.
    let dispatched = store.update_job(schema_id, &job_id, |job| {
        if let Err(error) = job.begin_processing() {
            warn!(job = %job.id, %error, "job not in pending state at dispatch");
        }
    });
    if !dispatched {
        debug!(job = %job_id, "job deleted before dispatch");
        return Some(job_id);
    }

    info!(job = %job_id, file = %document.file_name, "extraction dispatched");
    let extracted = extractor.extract(&document, &fields).await;

    // The job may have been deleted while the extractor ran.
    let settled = match extracted {
        // A payload that is not an object cannot mirror the schema's
        // nesting; treat it as an extraction failure, not an empty result.
        Ok(nested) if nested.is_object() => {
            let results = flatten_results(&fields, &nested);
            store.update_job(schema_id, &job_id, |job| {
                if let Err(error) = job.complete(results) {
                    warn!(job = %job.id, %error, "completion rejected");
                }
            })
        }
        Ok(_) => {
            info!(job = %job_id, "extraction returned a non-object payload");
            store.update_job(schema_id, &job_id, |job| {
                if let Err(error) = job.fail("malformed extraction payload: expected an object") {
                    warn!(job = %job.id, %error, "failure rejected");
                }
            })
        }
        Err(error) => {
            info!(job = %job_id, %error, "extraction failed");
            store.update_job(schema_id, &job_id, |job| {
                if let Err(error) = job.fail(error.to_string()) {
                    warn!(job = %job.id, %error, "failure rejected");
                }
            })
        }
    };
    if !settled {
        debug!(job = %job_id, "job deleted while extraction was in flight");
        return Some(job_id);
    }

    evaluate_job_transformations(store, schema_id, &job_id, Some(&document), provider).await;
    Some(job_id)
}

/// Run the transformation stage for an already-settled job.
///
/// Works on a clone so no lock is held across the external-model awaits; the
/// computed results are written back only if the job still exists
/// (last-write-wins, consistent with optimistic local mutation).
pub async fn evaluate_job_transformations(
    store: &WorkspaceStore,
    schema_id: &SchemaId,
    job_id: &JobId,
    document: Option<&Document>,
    provider: &dyn TransformProvider,
) {
    let Some(fields) = store.snapshot_fields(schema_id) else {
        return;
    };
    let Some(mut job) = store.snapshot_job(schema_id, job_id) else {
        debug!(job = %job_id, "job deleted before transformation stage");
        return;
    };
    if job.status != JobStatus::Completed {
        return;
    }

    let source = document.map(|doc| SourceDocument {
        file_name: &doc.file_name,
        bytes: &doc.bytes,
    });
    evaluate_transformations(&fields, &mut job, source, provider).await;

    let written = store.update_job(schema_id, job_id, |stored| {
        stored.results = job.results;
    });
    if !written {
        debug!(job = %job_id, "job deleted while transformations ran");
    }
}
