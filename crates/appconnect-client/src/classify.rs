//! Response classification
//!
//! Maps an HTTP status plus a JSON:API body onto [`ApiError`]. Classification
//! is a pure function of its inputs.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::ApiError;

/// Longest slice of a non-JSON body carried into an error message
const MAX_RAW_DETAIL: usize = 200;

/// One entry of a JSON:API `errors` array
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorObject {
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_text", skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

/// Accept strings, numbers and booleans; anything else reads as absent
fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

impl ErrorObject {
    /// Best human-readable text: detail, then title, then code
    pub fn message(&self) -> Option<&str> {
        [&self.detail, &self.title, &self.code]
            .into_iter()
            .find_map(|field| field.as_deref().filter(|s| !s.trim().is_empty()))
    }
}

/// The raw `errors` array of a body; empty when absent
fn raw_errors(body: &Value) -> &[Value] {
    body.get("errors")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// Extract the `errors` array of a body.
///
/// A bare string entry becomes its `detail`; entries of any other shape
/// are kept as empty objects so they still count as errors.
pub fn error_objects(body: &Value) -> Vec<ErrorObject> {
    raw_errors(body)
        .iter()
        .map(|e| match e {
            Value::String(s) => ErrorObject {
                detail: Some(s.clone()),
                ..ErrorObject::default()
            },
            other => serde_json::from_value(other.clone()).unwrap_or_default(),
        })
        .collect()
}

/// Classify a response.
///
/// Returns `None` for a successful response. A status of 400 or above, or
/// a body with a non-empty `errors` array, yields an error.
pub fn classify(status: u16, path: &str, body: &Value, retry_after: Option<u64>) -> Option<ApiError> {
    if status < 400 && raw_errors(body).is_empty() {
        return None;
    }

    let detail = detail_text(status, body, &error_objects(body));

    Some(match status {
        401 => ApiError::Unauthorized { detail },
        403 => ApiError::Forbidden { detail },
        404 => ApiError::NotFound {
            path: path.to_string(),
            detail,
        },
        429 => ApiError::RateLimited { retry_after, detail },
        _ => ApiError::Generic { status, detail },
    })
}

fn detail_text(status: u16, body: &Value, errors: &[ErrorObject]) -> String {
    let messages: Vec<&str> = errors.iter().filter_map(ErrorObject::message).collect();
    if !messages.is_empty() {
        return messages.join("; ");
    }

    match body {
        Value::String(raw) if !raw.trim().is_empty() => {
            let raw = raw.trim();
            match raw.char_indices().nth(MAX_RAW_DETAIL) {
                Some((cut, _)) => format!("{}...", &raw[..cut]),
                None => raw.to_string(),
            }
        }
        _ => format!("HTTP {}", status),
    }
}
