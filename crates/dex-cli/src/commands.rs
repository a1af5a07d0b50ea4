//! Command implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use tokio::task::JoinSet;
use tracing::info;

use dex_engine::{Document, FixtureExtractor, WorkspaceStore, process_document};
use dex_grid::{GridProjection, export_csv_to_path};
use dex_jobs::{ExtractionJob, JobStatus, SchemaDefinition};
use dex_model::find_field;
use dex_transform::UnconfiguredProvider;

use crate::cli::{ExportArgs, InspectArgs, RunArgs};

pub fn run_inspect(args: &InspectArgs) -> Result<()> {
    let schema = load_schema(&args.schema)?;
    let projection = GridProjection::project(&schema.fields, &schema.visual_groups, &schema.jobs);

    println!("Schema: {}", schema.name);
    println!("Jobs: {}", schema.jobs.len());

    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Column"),
        header_cell("Type"),
        header_cell("Group"),
        header_cell("Width"),
        header_cell("Transformation"),
    ]);
    apply_table_style(&mut table);
    for column in &projection.columns {
        let group = projection
            .group_of(&column.leaf.id)
            .map_or_else(|| "-".to_string(), |group| group.name.clone());
        let transformation = find_field(&schema.fields, &column.leaf.id)
            .and_then(|field| field.transformation.as_ref())
            .map_or_else(
                || "-".to_string(),
                |transformation| transformation.transformation_type.to_string(),
            );
        table.add_row(vec![
            Cell::new(&column.leaf.name),
            Cell::new(column.leaf.field_type),
            Cell::new(group),
            Cell::new(column.width),
            Cell::new(transformation),
        ]);
    }
    println!("{table}");
    Ok(())
}

/// Process every document against the schema; returns true when any job
/// ended in the error state.
pub async fn run_batch(args: &RunArgs) -> Result<bool> {
    let schema = load_schema(&args.schema)?;
    info!(schema = %schema.name, documents = args.documents.len(), "starting batch");

    let store = Arc::new(WorkspaceStore::new());
    let schema_id = store.add_schema(schema);
    let provider = Arc::new(UnconfiguredProvider);

    let mut pipelines = JoinSet::new();
    for path in &args.documents {
        let document = Document::from_path(path)
            .with_context(|| format!("read document {}", path.display()))?;
        // Fixture payloads live next to the document they describe.
        let fixture_dir = path.parent().unwrap_or_else(|| Path::new("."));
        let extractor = FixtureExtractor::new(fixture_dir);
        let store = Arc::clone(&store);
        let provider = Arc::clone(&provider);
        let schema_id = schema_id.clone();
        pipelines.spawn(async move {
            process_document(&store, &schema_id, document, &extractor, provider.as_ref()).await
        });
    }
    while let Some(joined) = pipelines.join_next().await {
        joined.context("pipeline task panicked")?;
    }

    let schema = store
        .with_schema(&schema_id, std::clone::Clone::clone)
        .context("schema vanished during processing")?;
    print_job_summary(&schema.jobs);

    if let Some(path) = &args.output_csv {
        export_csv_to_path(path, &schema.fields, &schema.jobs)
            .with_context(|| format!("write csv {}", path.display()))?;
        println!("CSV: {}", path.display());
    }
    if let Some(path) = &args.save {
        let json = serde_json::to_string_pretty(&schema).context("serialize schema")?;
        std::fs::write(path, json).with_context(|| format!("write schema {}", path.display()))?;
        println!("Saved: {}", path.display());
    }

    Ok(schema
        .jobs
        .iter()
        .any(|job| job.status == JobStatus::Error))
}

pub fn run_export(args: &ExportArgs) -> Result<()> {
    let schema = load_schema(&args.schema)?;
    export_csv_to_path(&args.out, &schema.fields, &schema.jobs)
        .with_context(|| format!("write csv {}", args.out.display()))?;
    println!(
        "Exported {} jobs to {}",
        schema.jobs.len(),
        args.out.display()
    );
    Ok(())
}

fn load_schema(path: &Path) -> Result<SchemaDefinition> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("read schema {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parse schema {}", path.display()))
}

fn print_job_summary(jobs: &[ExtractionJob]) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("File"),
        header_cell("Status"),
        header_cell("Fields"),
        header_cell("Error"),
    ]);
    apply_table_style(&mut table);
    for job in jobs {
        table.add_row(vec![
            Cell::new(&job.file_name),
            status_cell(job.status),
            Cell::new(job.results.len()),
            Cell::new(job.error.as_deref().unwrap_or("-")),
        ]);
    }
    println!("{table}");
}

fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn status_cell(status: JobStatus) -> Cell {
    match status {
        JobStatus::Completed => Cell::new("completed")
            .fg(Color::Green)
            .add_attribute(Attribute::Bold),
        JobStatus::Error => Cell::new("error")
            .fg(Color::Red)
            .add_attribute(Attribute::Bold),
        JobStatus::Pending => Cell::new("pending").fg(Color::DarkGrey),
        JobStatus::Processing => Cell::new("processing").fg(Color::Yellow),
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}
