//! CSV export of the grid.
//!
//! One row per job over `[File Name, Status, ...leaf columns]`. Scalar
//! values render as plain text; container values render as compact JSON so
//! nothing is lost on the way out. Quoting and escaping are the csv
//! writer's problem.

use std::io::Write;
use std::path::Path;

use serde_json::Value;

use dex_jobs::ExtractionJob;
use dex_model::{FlatLeaf, SchemaField, flatten};

use crate::error::Result;

pub fn export_csv<W: Write>(
    writer: W,
    fields: &[SchemaField],
    jobs: &[ExtractionJob],
) -> Result<()> {
    let leaves = flatten(fields);
    let mut csv = csv::Writer::from_writer(writer);

    let mut header = vec!["File Name".to_string(), "Status".to_string()];
    header.extend(leaves.iter().map(|leaf| leaf.name.clone()));
    csv.write_record(&header)?;

    for job in jobs {
        let mut row = vec![job.file_name.clone(), job.status.to_string()];
        for leaf in &leaves {
            row.push(cell_text(leaf, job.results.get(&leaf.id)));
        }
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

pub fn export_csv_to_path(
    path: &Path,
    fields: &[SchemaField],
    jobs: &[ExtractionJob],
) -> Result<()> {
    let file = std::fs::File::create(path)?;
    export_csv(file, fields, jobs)
}

fn cell_text(leaf: &FlatLeaf, value: Option<&Value>) -> String {
    let Some(value) = value else {
        return String::new();
    };
    if leaf.container || leaf.field_type.is_container() {
        return serde_json::to_string(value).unwrap_or_default();
    }
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        nested => serde_json::to_string(nested).unwrap_or_default(),
    }
}
