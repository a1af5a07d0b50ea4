//! `{Column Name}` token resolution for formula configs.
//!
//! Tokens are replaced by literal string substitution, not regex capture,
//! so a column name containing regex metacharacters can never corrupt the
//! formula. A token that does not resolve to a number substitutes `0` with
//! a logged warning rather than failing the whole formula.

use serde_json::Value;
use tracing::warn;

/// Collect the distinct `{...}` token names in declaration order.
pub fn extract_tokens(template: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            break;
        };
        let token = &after[..end];
        if !token.is_empty() && !tokens.iter().any(|t| t == token) {
            tokens.push(token.to_string());
        }
        rest = &after[end + 1..];
    }
    tokens
}

/// Replace every `{token}` occurrence with the resolved numeric value.
pub fn substitute_tokens(template: &str, mut resolve: impl FnMut(&str) -> Option<f64>) -> String {
    let mut out = template.to_string();
    for token in extract_tokens(template) {
        let value = resolve(&token).unwrap_or_else(|| {
            warn!(column = %token, "formula token did not resolve to a number, substituting 0");
            0.0
        });
        out = out.replace(&format!("{{{token}}}"), &value.to_string());
    }
    out
}

/// Best-effort numeric reading of a result value.
///
/// Strings are parsed after stripping currency punctuation, matching how
/// extracted amounts commonly arrive ("$1,200.50").
pub fn value_to_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => {
            let cleaned: String = text
                .trim()
                .chars()
                .filter(|c| !matches!(c, '$' | ',' | '€' | '£'))
                .collect();
            cleaned.parse::<f64>().ok()
        }
        _ => None,
    }
}

/// Render a result value as plain text for column-sourced transforms.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
