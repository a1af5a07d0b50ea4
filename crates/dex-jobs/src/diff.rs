//! Incremental job-list diffing.
//!
//! Every job-list mutation is diffed against the previous list before any
//! remote write, so a single field edit on one job never re-writes the whole
//! job table. Deep change detection is structural equality.

use serde::{Deserialize, Serialize};

use dex_model::JobId;

use crate::job::ExtractionJob;

/// The incremental write set between two job lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobDiff {
    /// Jobs that are new or deep-changed, in `next` order.
    pub upserts: Vec<ExtractionJob>,
    /// Ids present before and gone now.
    pub deleted: Vec<JobId>,
}

impl JobDiff {
    pub fn is_empty(&self) -> bool {
        self.upserts.is_empty() && self.deleted.is_empty()
    }
}

/// Compute the upsert/delete set that turns `previous` into `next`.
pub fn diff_jobs(previous: &[ExtractionJob], next: &[ExtractionJob]) -> JobDiff {
    let upserts = next
        .iter()
        .filter(|job| {
            previous
                .iter()
                .find(|prev| prev.id == job.id)
                .is_none_or(|prev| prev != *job)
        })
        .cloned()
        .collect();
    let deleted = previous
        .iter()
        .filter(|prev| !next.iter().any(|job| job.id == prev.id))
        .map(|prev| prev.id.clone())
        .collect();
    JobDiff { upserts, deleted }
}

/// Replay a diff over `previous`. Used to check diff correctness; the sync
/// layer issues the same operations against the remote store.
pub fn apply_diff(previous: &[ExtractionJob], diff: &JobDiff) -> Vec<ExtractionJob> {
    let mut jobs: Vec<ExtractionJob> = previous
        .iter()
        .filter(|job| !diff.deleted.contains(&job.id))
        .cloned()
        .collect();
    for upsert in &diff.upserts {
        match jobs.iter_mut().find(|job| job.id == upsert.id) {
            Some(existing) => *existing = upsert.clone(),
            None => jobs.push(upsert.clone()),
        }
    }
    jobs
}
