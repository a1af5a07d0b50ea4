//! Row expansion state.
//!
//! Expanding a row adds a detail panel beneath it with one nested editor per
//! container field. Pure display state keyed by job id; it never touches job
//! status or results.

use std::collections::BTreeSet;

use dex_model::{FieldKind, JobId, SchemaField};

#[derive(Debug, Clone, Default)]
pub struct ExpansionState {
    expanded: BTreeSet<JobId>,
}

impl ExpansionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip one row; returns the new state (true = expanded).
    pub fn toggle(&mut self, job_id: &JobId) -> bool {
        if self.expanded.remove(job_id) {
            false
        } else {
            self.expanded.insert(job_id.clone());
            true
        }
    }

    pub fn is_expanded(&self, job_id: &JobId) -> bool {
        self.expanded.contains(job_id)
    }

    pub fn collapse_all(&mut self) {
        self.expanded.clear();
    }

    /// Drop state for jobs that no longer exist.
    pub fn retain_jobs(&mut self, live: &[JobId]) {
        self.expanded.retain(|id| live.contains(id));
    }
}

/// The fields a detail panel renders: top-level container fields, in
/// declaration order.
pub fn detail_fields(fields: &[SchemaField]) -> Vec<&SchemaField> {
    fields
        .iter()
        .filter(|field| {
            matches!(
                field.kind,
                FieldKind::Object { .. } | FieldKind::List { .. } | FieldKind::Table { .. }
            )
        })
        .collect()
}
