#![deny(unsafe_code)]

pub mod evaluate;
pub mod expr;
pub mod provider;
pub mod tokens;

pub use evaluate::{CLASSIFICATION_PLACEHOLDER, SourceDocument, evaluate_transformations};
pub use expr::{ExprError, evaluate_arithmetic, sanitize};
pub use provider::{
    ProviderError, TransformInput, TransformProvider, TransformRequest, UnconfiguredProvider,
};
pub use tokens::{extract_tokens, substitute_tokens, value_to_number, value_to_text};
