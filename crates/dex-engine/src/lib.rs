#![deny(unsafe_code)]

pub mod extractor;
pub mod pipeline;
pub mod store;

pub use extractor::{Document, ExtractError, Extractor, FixtureExtractor};
pub use pipeline::{evaluate_job_transformations, process_document};
pub use store::WorkspaceStore;
