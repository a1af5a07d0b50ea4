//! The extractor collaborator seam.
//!
//! The engine treats document understanding as an opaque async function
//! `extract(document, schemaTree) -> nestedResult`, where the nested result
//! mirrors the schema's nesting by field *name*. Any concrete AI/OCR
//! provider lives behind this trait.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use dex_model::SchemaField;

/// One submitted document.
#[derive(Debug, Clone)]
pub struct Document {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Document {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Load a document from disk, using the file name component as its name.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self {
            file_name,
            bytes: std::fs::read(path)?,
        })
    }
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed extraction payload: {0}")]
    Payload(#[from] serde_json::Error),
    #[error("{0}")]
    Provider(String),
}

/// Opaque extraction collaborator. Failure rejects; the pipeline converts
/// it into an `error` job, never a crash.
#[async_trait]
pub trait Extractor: Send + Sync {
    async fn extract(
        &self,
        document: &Document,
        fields: &[SchemaField],
    ) -> Result<Value, ExtractError>;
}

/// Extractor that reads a sibling JSON fixture instead of calling a model:
/// for `invoice.pdf` it loads `invoice.json` from the fixture directory.
///
/// Used by the CLI for offline runs and by tests.
#[derive(Debug, Clone)]
pub struct FixtureExtractor {
    fixture_dir: PathBuf,
}

impl FixtureExtractor {
    pub fn new(fixture_dir: impl Into<PathBuf>) -> Self {
        Self {
            fixture_dir: fixture_dir.into(),
        }
    }

    fn fixture_path(&self, document: &Document) -> PathBuf {
        let stem = Path::new(&document.file_name)
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| document.file_name.clone());
        self.fixture_dir.join(format!("{stem}.json"))
    }
}

#[async_trait]
impl Extractor for FixtureExtractor {
    async fn extract(
        &self,
        document: &Document,
        _fields: &[SchemaField],
    ) -> Result<Value, ExtractError> {
        let path = self.fixture_path(document);
        let text = std::fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
