#![deny(unsafe_code)]

pub mod diff;
pub mod error;
pub mod job;
pub mod review;
pub mod schema;

pub use diff::{JobDiff, apply_diff, diff_jobs};
pub use error::{JobError, Result};
pub use job::{ExtractionJob, JobStatus};
pub use review::{FieldReviewMeta, ReviewStatus};
pub use schema::SchemaDefinition;
