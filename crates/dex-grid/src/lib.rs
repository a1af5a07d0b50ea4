//! Tabular projection of a schema and its jobs.
//!
//! Read-only over the model: the grid turns the flattened leaf set into
//! sized columns with group headers, tracks which rows are expanded, and
//! exports the whole table as CSV. Nothing here mutates schema or job
//! state.

#![deny(unsafe_code)]

pub mod columns;
pub mod error;
pub mod expansion;
pub mod export;
pub mod width;

pub use columns::{GridColumn, GridProjection};
pub use error::{GridError, Result};
pub use expansion::{ExpansionState, detail_fields};
pub use export::{export_csv, export_csv_to_path};
pub use width::{CONTAINER_SUMMARY_WIDTH, MAX_WIDTH, MIN_WIDTH, SAMPLE_ROWS};
