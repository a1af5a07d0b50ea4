//! Transformation evaluation over a completed job.
//!
//! Fields are evaluated in flatten (schema declaration) order, one at a
//! time; this is deliberately not a dependency-resolved engine. A formula
//! referencing a transformation field that appears *later* in the schema
//! sees no value yet and defaults to 0, while a reference to an earlier one
//! sees the freshly computed value. External-model calls for one job run
//! sequentially to bound concurrent calls to the provider.
//!
//! Evaluation never fails the job: every per-field failure is stored
//! in-band as that field's value.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use dex_jobs::{ExtractionJob, JobStatus};
use dex_model::{
    FieldId, FlatLeaf, SchemaField, Transformation, TransformationSource, TransformationType,
    find_field, flatten,
};

use crate::expr::evaluate_arithmetic;
use crate::provider::{TransformInput, TransformProvider, TransformRequest};
use crate::tokens::{extract_tokens, substitute_tokens, value_to_number, value_to_text};

/// Value written by the placeholder classifier.
pub const CLASSIFICATION_PLACEHOLDER: &str = "Unclassified";

/// Borrowed view of the submitted document, for document-sourced transforms.
#[derive(Debug, Clone, Copy)]
pub struct SourceDocument<'a> {
    pub file_name: &'a str,
    pub bytes: &'a [u8],
}

/// Evaluate every transformation field of the schema against a completed
/// job, writing each outcome into the job's results map under the
/// transformation field's own id.
pub async fn evaluate_transformations(
    fields: &[SchemaField],
    job: &mut ExtractionJob,
    document: Option<SourceDocument<'_>>,
    provider: &dyn TransformProvider,
) {
    if job.status != JobStatus::Completed {
        debug!(job = %job.id, status = %job.status, "skipping transformations for unsettled job");
        return;
    }
    let leaves = flatten(fields);
    for leaf in &leaves {
        let Some(field) = find_field(fields, &leaf.id) else {
            continue;
        };
        let Some(transformation) = &field.transformation else {
            continue;
        };
        let value = match transformation.transformation_type {
            TransformationType::Calculation => {
                evaluate_calculation(&transformation.config, &leaves, &job.results)
            }
            TransformationType::CurrencyConversion => {
                evaluate_currency(&transformation.config, &leaves, &job.results)
            }
            TransformationType::Classification => {
                Value::String(CLASSIFICATION_PLACEHOLDER.to_string())
            }
            TransformationType::ExternalModel => {
                evaluate_external(transformation, &leaves, &job.results, document, provider).await
            }
        };
        job.results.insert(field.id.clone(), value);
    }
}

/// Resolve a `{Column Name}` token against the job's current results.
fn resolve_numeric(
    name: &str,
    leaves: &[FlatLeaf],
    results: &BTreeMap<FieldId, Value>,
) -> Option<f64> {
    let leaf = leaves
        .iter()
        .find(|leaf| leaf.name == name)
        .or_else(|| leaves.iter().find(|leaf| leaf.id.as_str() == name))?;
    results.get(&leaf.id).and_then(value_to_number)
}

fn evaluate_calculation(
    config: &Value,
    leaves: &[FlatLeaf],
    results: &BTreeMap<FieldId, Value>,
) -> Value {
    let template = config.as_str().unwrap_or_default();
    let substituted = substitute_tokens(template, |name| resolve_numeric(name, leaves, results));
    finish_numeric(evaluate_arithmetic(&substituted))
}

fn finish_numeric(outcome: Result<f64, crate::expr::ExprError>) -> Value {
    match outcome {
        Ok(value) if value.is_finite() => number_value(value),
        Ok(_) => number_value(0.0),
        Err(error) => Value::String(format!("Error: {error}")),
    }
}

fn number_value(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or_else(|| Value::from(0))
}

/// Structured currency config: `{amount: {...}, rate: {...}, decimals?}`.
#[derive(Debug, Deserialize)]
struct CurrencyConfig {
    amount: Operand,
    rate: Operand,
    #[serde(default)]
    decimals: Option<i32>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Operand {
    Column { value: Value },
    Number { value: Value },
}

impl Operand {
    /// Resolution failures default the operand to 0 rather than aborting
    /// the whole computation.
    fn resolve(&self, leaves: &[FlatLeaf], results: &BTreeMap<FieldId, Value>) -> f64 {
        match self {
            Operand::Column { value } => {
                let Some(name) = value.as_str() else {
                    warn!("currency column operand is not a string, defaulting to 0");
                    return 0.0;
                };
                resolve_numeric(name, leaves, results).unwrap_or_else(|| {
                    warn!(column = %name, "currency operand did not resolve, defaulting to 0");
                    0.0
                })
            }
            Operand::Number { value } => value_to_number(value).unwrap_or_else(|| {
                warn!("currency number operand is not numeric, defaulting to 0");
                0.0
            }),
        }
    }
}

fn evaluate_currency(
    config: &Value,
    leaves: &[FlatLeaf],
    results: &BTreeMap<FieldId, Value>,
) -> Value {
    // Structured object form.
    if config.is_object() {
        return match serde_json::from_value::<CurrencyConfig>(config.clone()) {
            Ok(parsed) => currency_result(&parsed, leaves, results),
            Err(error) => Value::String(format!("Error: {error}")),
        };
    }
    // Legacy string form: a JSON payload or a `{Column} * rate` formula.
    let Some(text) = config.as_str() else {
        return Value::String("Error: unsupported currency config".to_string());
    };
    if let Ok(parsed) = serde_json::from_str::<CurrencyConfig>(text) {
        return currency_result(&parsed, leaves, results);
    }
    let substituted = substitute_tokens(text, |name| resolve_numeric(name, leaves, results));
    finish_numeric(evaluate_arithmetic(&substituted))
}

fn currency_result(
    config: &CurrencyConfig,
    leaves: &[FlatLeaf],
    results: &BTreeMap<FieldId, Value>,
) -> Value {
    let amount = config.amount.resolve(leaves, results);
    let rate = config.rate.resolve(leaves, results);
    let mut converted = amount * rate;
    if let Some(decimals) = config.decimals {
        let factor = 10f64.powi(decimals);
        converted = (converted * factor).round() / factor;
    }
    if !converted.is_finite() {
        converted = 0.0;
    }
    number_value(converted)
}

async fn evaluate_external(
    transformation: &Transformation,
    leaves: &[FlatLeaf],
    results: &BTreeMap<FieldId, Value>,
    document: Option<SourceDocument<'_>>,
    provider: &dyn TransformProvider,
) -> Value {
    let prompt = transformation
        .config
        .as_str()
        .map(str::to_string)
        .or_else(|| {
            transformation
                .config
                .get("prompt")
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .unwrap_or_default();

    let input = match transformation.source {
        TransformationSource::Document => match document {
            Some(doc) => TransformInput::Document {
                file_name: doc.file_name.to_string(),
                bytes: doc.bytes.to_vec(),
            },
            None => return Value::String("Error".to_string()),
        },
        TransformationSource::Column => {
            let resolved = transformation
                .source_column_id
                .as_ref()
                .and_then(|id| results.get(id))
                .cloned()
                .or_else(|| single_token_fallback(&prompt, leaves, results));
            TransformInput::Text(resolved.as_ref().map(value_to_text).unwrap_or_default())
        }
    };

    match provider.transform(TransformRequest { prompt, input }).await {
        Ok(text) => serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text)),
        Err(error) => {
            let message = error.to_string();
            if message.is_empty() {
                Value::String("Error".to_string())
            } else {
                Value::String(message)
            }
        }
    }
}

/// Column-sourced transforms without an explicit source column fall back to
/// a single `{Column}` token in the config string.
fn single_token_fallback(
    prompt: &str,
    leaves: &[FlatLeaf],
    results: &BTreeMap<FieldId, Value>,
) -> Option<Value> {
    let tokens = extract_tokens(prompt);
    let [name] = tokens.as_slice() else {
        return None;
    };
    let leaf = leaves.iter().find(|leaf| &leaf.name == name)?;
    results.get(&leaf.id).cloned()
}
