//! Per-field human review, independent of job status.
//!
//! A reviewer can flag any (job, field) pair as verified or suspect without
//! touching the job's own processing state. Verification forces confidence
//! to 1; flagging for review keeps the extractor-assigned confidence so the
//! original score is never lost.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use dex_model::FieldId;

use crate::job::ExtractionJob;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewStatus {
    Verified,
    NeedsReview,
}

/// Audit state for a single field of a single job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldReviewMeta {
    pub status: ReviewStatus,
    pub updated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Extractor-assigned confidence; forced to 1 by verification.
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,
    /// Snapshot of the field's value at the moment of verification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_value: Option<Value>,
}

impl ExtractionJob {
    /// Mark a field as verified by a human reviewer.
    ///
    /// Snapshots the current result as `original_value`, forces confidence
    /// to 1 and stamps the verifier identity.
    pub fn mark_verified(&mut self, field_id: &FieldId, verified_by: impl Into<String>) {
        let now = Utc::now();
        let original_value = self.results.get(field_id).cloned();
        self.review.insert(
            field_id.clone(),
            FieldReviewMeta {
                status: ReviewStatus::Verified,
                updated_at: now,
                reason: None,
                confidence: Some(1.0),
                verified_at: Some(now),
                verified_by: Some(verified_by.into()),
                original_value,
            },
        );
    }

    /// Flag a field as suspect.
    ///
    /// Keeps whatever confidence was previously recorded (defaulting to 0
    /// when none exists) and clears the verifier identity, so a reviewer can
    /// question a field without erasing the extractor's score.
    pub fn mark_needs_review(&mut self, field_id: &FieldId, reason: impl Into<String>) {
        let now = Utc::now();
        let previous = self.review.get(field_id);
        let confidence = previous.and_then(|meta| meta.confidence).or(Some(0.0));
        let original_value = previous
            .and_then(|meta| meta.original_value.clone())
            .or_else(|| self.results.get(field_id).cloned());
        self.review.insert(
            field_id.clone(),
            FieldReviewMeta {
                status: ReviewStatus::NeedsReview,
                updated_at: now,
                reason: Some(reason.into()),
                confidence,
                verified_at: None,
                verified_by: None,
                original_value,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    fn completed_job() -> ExtractionJob {
        let mut job = ExtractionJob::new("invoice.pdf");
        job.begin_processing().expect("processing");
        let mut results = BTreeMap::new();
        results.insert(FieldId::from("total"), json!(100));
        job.complete(results).expect("complete");
        job
    }

    #[test]
    fn verify_forces_confidence_and_stamps_identity() {
        let mut job = completed_job();
        let field = FieldId::from("total");
        job.mark_verified(&field, "reviewer@example.com");

        let meta = job.review.get(&field).expect("meta");
        assert_eq!(meta.status, ReviewStatus::Verified);
        assert_eq!(meta.confidence, Some(1.0));
        assert!(meta.verified_at.is_some());
        assert_eq!(meta.verified_by.as_deref(), Some("reviewer@example.com"));
        assert_eq!(meta.original_value, Some(json!(100)));
    }

    #[test]
    fn needs_review_preserves_recorded_confidence() {
        let mut job = completed_job();
        let field = FieldId::from("total");
        job.mark_verified(&field, "reviewer@example.com");
        job.mark_needs_review(&field, "amount looks off");

        let meta = job.review.get(&field).expect("meta");
        assert_eq!(meta.status, ReviewStatus::NeedsReview);
        // Confidence recorded by the earlier verification survives.
        assert_eq!(meta.confidence, Some(1.0));
        assert!(meta.verified_at.is_none());
        assert!(meta.verified_by.is_none());
        assert_eq!(meta.reason.as_deref(), Some("amount looks off"));
    }

    #[test]
    fn needs_review_defaults_confidence_to_zero() {
        let mut job = completed_job();
        let field = FieldId::from("total");
        job.mark_needs_review(&field, "unreadable scan");

        let meta = job.review.get(&field).expect("meta");
        assert_eq!(meta.confidence, Some(0.0));
    }

    #[test]
    fn review_works_regardless_of_job_status() {
        let mut job = ExtractionJob::new("invoice.pdf");
        let field = FieldId::from("total");
        job.mark_needs_review(&field, "early flag");
        assert!(job.review.contains_key(&field));
        assert_eq!(job.status, crate::job::JobStatus::Pending);
    }
}
