//! The external transform collaborator seam.
//!
//! Delegated transformations (the `external_model` type) are dispatched
//! through this trait; the engine never knows which model or vendor sits
//! behind it.

use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no external transform provider configured")]
    Unconfigured,
    #[error("{0}")]
    Remote(String),
}

/// What the provider receives as input.
#[derive(Debug, Clone, PartialEq)]
pub enum TransformInput {
    /// The whole submitted document.
    Document { file_name: String, bytes: Vec<u8> },
    /// A resolved column or free-text value.
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransformRequest {
    pub prompt: String,
    pub input: TransformInput,
}

/// Opaque remote transform function: `transform(prompt, input) -> value`.
///
/// The returned text is JSON-parsed by the engine when possible, otherwise
/// stored as raw text.
#[async_trait]
pub trait TransformProvider: Send + Sync {
    async fn transform(&self, request: TransformRequest) -> Result<String, ProviderError>;
}

/// Provider used when no external model is wired up; every delegated field
/// stores the unconfigured error message.
#[derive(Debug, Default)]
pub struct UnconfiguredProvider;

#[async_trait]
impl TransformProvider for UnconfiguredProvider {
    async fn transform(&self, _request: TransformRequest) -> Result<String, ProviderError> {
        Err(ProviderError::Unconfigured)
    }
}
