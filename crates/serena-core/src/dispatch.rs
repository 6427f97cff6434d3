//! Tool Dispatch and Contract Layer (§4.7).
//!
//! Wraps a `Tool`'s raw `ToolResult` with the response envelope every
//! call carries: verbosity resolution, token-budget enforcement
//! (`error`/`summary`/`paginate`), and the leading-underscore metadata
//! keys. Tools stay unaware of any of this; it lives entirely at the
//! boundary between `ToolRegistry::get_tool` and the transport.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::SerenaError;
use crate::session::SessionState;
use crate::traits::tool::Tool;
use crate::types::ToolResult;

/// Default token budget when the caller doesn't set `max_tokens`.
const DEFAULT_MAX_TOKENS: usize = 25_000;

/// Legacy `max_answer_chars` is converted to tokens at this ratio,
/// matching `estimate_tokens`'s char-based approximation.
const CHARS_PER_TOKEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationMode {
    Error,
    Summary,
    Paginate,
}

impl Default for TruncationMode {
    fn default() -> Self {
        TruncationMode::Summary
    }
}

/// Parameters every tool call accepts in addition to its own schema,
/// extracted permissively from the raw params object (unknown/missing
/// fields are fine; tool param structs don't use `deny_unknown_fields`).
#[derive(Debug, Clone, Default, Deserialize)]
struct CommonParams {
    verbosity: Option<String>,
    max_tokens: Option<usize>,
    #[serde(default)]
    truncation: Option<TruncationMode>,
    /// Deprecated alias for `max_tokens` (chars, not tokens).
    max_answer_chars: Option<usize>,
    cursor: Option<String>,
}

impl CommonParams {
    fn from_value(params: &Value) -> Self {
        serde_json::from_value(params.clone()).unwrap_or_default()
    }
}

/// Char-based token estimate (§1 explicitly excludes a real tokenizer).
pub fn estimate_tokens(value: &Value) -> usize {
    let rendered = serde_json::to_string(value).unwrap_or_default();
    rendered.chars().count() / CHARS_PER_TOKEN.max(1)
}

#[derive(Debug, Clone, Serialize)]
struct VerbosityMeta {
    level: String,
    reason: String,
}

fn resolve_verbosity(requested: Option<&str>, session: &SessionState) -> VerbosityMeta {
    match requested {
        Some("minimal") | Some("normal") | Some("detailed") => VerbosityMeta {
            level: requested.unwrap().to_string(),
            reason: "explicit".to_string(),
        },
        _ => {
            let decision = session.phase();
            VerbosityMeta {
                level: decision.verbosity,
                reason: format!("auto: {}", decision.rule),
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct TruncationMeta {
    mode: TruncationMode,
    budget: usize,
    actual_tokens: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    narrowing_suggestions: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    expansion_hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    cursor: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct DeprecationMeta {
    parameter: &'static str,
    note: &'static str,
}

/// Wrap a tool's `ToolResult` in the response envelope, applying
/// verbosity resolution and token-budget truncation.
///
/// Returns `Err(SerenaError::Truncation { .. })` when
/// `truncation="error"` and the result exceeds `max_tokens`; the
/// transport surfaces that as a normal tool error response.
pub fn wrap_envelope(
    tool: &dyn Tool,
    params: &Value,
    result: ToolResult,
    session: &SessionState,
) -> Result<Value, SerenaError> {
    let common = CommonParams::from_value(params);

    let verbosity = resolve_verbosity(common.verbosity.as_deref(), session);

    let mut deprecated = None;
    let max_tokens = match (common.max_tokens, common.max_answer_chars) {
        (Some(tokens), _) => tokens,
        (None, Some(chars)) => {
            deprecated = Some(DeprecationMeta {
                parameter: "max_answer_chars",
                note: "use max_tokens instead; max_answer_chars is converted at ~4 chars/token",
            });
            chars / CHARS_PER_TOKEN.max(1)
        }
        (None, None) => DEFAULT_MAX_TOKENS,
    };

    let truncation_mode = common.truncation.unwrap_or_default();

    let data = result.data.clone().unwrap_or(Value::Null);
    let actual_tokens = estimate_tokens(&data);

    let mut truncation_meta = None;
    let mut final_data = data;

    if result.status == crate::types::ToolStatus::Success && actual_tokens > max_tokens {
        match truncation_mode {
            TruncationMode::Error => {
                return Err(SerenaError::truncation(
                    max_tokens,
                    actual_tokens,
                    tool.narrowing_suggestions(),
                ));
            }
            TruncationMode::Summary => {
                final_data = summarize_to_budget(final_data, max_tokens);
                truncation_meta = Some(TruncationMeta {
                    mode: truncation_mode,
                    budget: max_tokens,
                    actual_tokens,
                    narrowing_suggestions: tool.narrowing_suggestions(),
                    expansion_hint: Some(
                        "re-run with a larger max_tokens or truncation=\"paginate\" for the rest"
                            .to_string(),
                    ),
                    cursor: None,
                });
            }
            TruncationMode::Paginate => {
                let start: usize = common
                    .cursor
                    .as_deref()
                    .and_then(|c| c.parse().ok())
                    .unwrap_or(0);
                let (page, next_cursor) = paginate_to_budget(final_data, max_tokens, start);
                final_data = page;
                truncation_meta = Some(TruncationMeta {
                    mode: truncation_mode,
                    budget: max_tokens,
                    actual_tokens,
                    narrowing_suggestions: tool.narrowing_suggestions(),
                    expansion_hint: next_cursor
                        .is_some()
                        .then(|| "pass the returned cursor to fetch the next page".to_string()),
                    cursor: next_cursor,
                });
            }
        }
    }

    let mut envelope = match final_data {
        Value::Object(map) => map,
        Value::Null => serde_json::Map::new(),
        other => {
            let mut map = serde_json::Map::new();
            map.insert("result".to_string(), other);
            map
        }
    };

    let status_str = match result.status {
        crate::types::ToolStatus::Success => "success",
        crate::types::ToolStatus::Error => "error",
        crate::types::ToolStatus::Warning => "warning",
    };
    envelope.insert("status".to_string(), json!(status_str));
    if let Some(error) = result.error {
        envelope.insert("error".to_string(), json!(error));
    }
    if let Some(message) = result.message {
        envelope.insert("message".to_string(), json!(message));
    }

    envelope.insert("_schema".to_string(), tool.parameters_schema());
    envelope.insert(
        "_tokens".to_string(),
        json!({ "estimated": estimate_tokens(&Value::Object(envelope.clone())), "budget": max_tokens }),
    );
    envelope.insert(
        "_verbosity".to_string(),
        json!({ "level": verbosity.level, "reason": verbosity.reason }),
    );
    if let Some(meta) = truncation_meta {
        envelope.insert("_truncation".to_string(), json!(meta));
    }
    if let Some(meta) = deprecated {
        envelope.insert("_deprecated".to_string(), json!(meta));
    }

    Ok(Value::Object(envelope))
}

/// Truncate an array at an item boundary so the serialized result fits
/// `budget` tokens; non-array data falls back to character truncation.
fn summarize_to_budget(data: Value, budget: usize) -> Value {
    match data {
        Value::Array(items) => {
            let mut kept = Vec::new();
            for item in items {
                let candidate = Value::Array({
                    let mut v = kept.clone();
                    v.push(item.clone());
                    v
                });
                if estimate_tokens(&candidate) > budget && !kept.is_empty() {
                    break;
                }
                kept.push(item);
            }
            Value::Array(kept)
        }
        Value::Object(mut map) => {
            // Summarize the first array-valued field in place; leaves
            // scalar fields (names, counts) untouched.
            if let Some((_, value)) = map
                .iter_mut()
                .find(|(_, v)| matches!(v, Value::Array(_)))
            {
                let truncated = summarize_to_budget(value.clone(), budget);
                *value = truncated;
            }
            Value::Object(map)
        }
        Value::String(s) => {
            let char_budget = budget * CHARS_PER_TOKEN;
            Value::String(s.chars().take(char_budget).collect())
        }
        other => other,
    }
}

/// Page an array-shaped (or array-carrying object-shaped) result at
/// `start`, returning as many items as fit `budget` and the cursor for
/// the next page (`None` once exhausted). Concatenating every page
/// reproduces the untruncated content (§8 testable property 6).
fn paginate_to_budget(data: Value, budget: usize, start: usize) -> (Value, Option<String>) {
    match data {
        Value::Array(items) => {
            let mut end = start;
            let mut kept = Vec::new();
            while end < items.len() {
                let mut candidate = kept.clone();
                candidate.push(items[end].clone());
                if estimate_tokens(&Value::Array(candidate.clone())) > budget && !kept.is_empty() {
                    break;
                }
                kept.push(items[end].clone());
                end += 1;
            }
            let next = if end < items.len() {
                Some(end.to_string())
            } else {
                None
            };
            (Value::Array(kept), next)
        }
        Value::Object(mut map) => {
            let array_key = map
                .iter()
                .find(|(_, v)| matches!(v, Value::Array(_)))
                .map(|(k, _)| k.clone());
            if let Some(key) = array_key {
                let array = map.remove(&key).unwrap();
                let (page, next) = paginate_to_budget(array, budget, start);
                map.insert(key, page);
                (Value::Object(map), next)
            } else {
                (Value::Object(map), None)
            }
        }
        other => (other, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolResult;
    use async_trait::async_trait;

    struct StubTool;

    #[async_trait]
    impl Tool for StubTool {
        fn name(&self) -> &str {
            "stub"
        }
        fn description(&self) -> &str {
            "stub tool"
        }
        fn parameters_schema(&self) -> Value {
            json!({"type": "object"})
        }
        async fn execute(&self, _params: Value) -> Result<ToolResult, SerenaError> {
            Ok(ToolResult::success(json!({"items": []})))
        }
    }

    fn big_array(n: usize) -> Value {
        Value::Array(
            (0..n)
                .map(|i| json!({"index": i, "text": "x".repeat(50)}))
                .collect(),
        )
    }

    #[test]
    fn small_result_passes_through_unmodified() {
        let session = SessionState::new();
        let result = ToolResult::success(json!({"items": [1, 2, 3]}));
        let envelope = wrap_envelope(&StubTool, &json!({}), result, &session).unwrap();
        assert_eq!(envelope["items"], json!([1, 2, 3]));
        assert!(envelope.get("_truncation").is_none());
    }

    #[test]
    fn error_mode_raises_truncation_error_over_budget() {
        let session = SessionState::new();
        let result = ToolResult::success(json!({"items": big_array(500)}));
        let params = json!({"max_tokens": 100, "truncation": "error"});
        let err = wrap_envelope(&StubTool, &params, result, &session).unwrap_err();
        assert!(matches!(err, SerenaError::Truncation { .. }));
    }

    #[test]
    fn summary_mode_truncates_at_item_boundary() {
        let session = SessionState::new();
        let result = ToolResult::success(json!({"items": big_array(500)}));
        let params = json!({"max_tokens": 100, "truncation": "summary"});
        let envelope = wrap_envelope(&StubTool, &params, result, &session).unwrap();
        let items = envelope["items"].as_array().unwrap();
        assert!(items.len() < 500);
        assert!(envelope["_truncation"]["mode"] == "summary");
    }

    #[test]
    fn paginate_mode_round_trips_all_items() {
        let session = SessionState::new();
        let total = 200;
        let mut collected = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let result = ToolResult::success(json!({"items": big_array(total)}));
            let mut params = json!({"max_tokens": 100, "truncation": "paginate"});
            if let Some(c) = &cursor {
                params["cursor"] = json!(c);
            }
            let envelope = wrap_envelope(&StubTool, &params, result, &session).unwrap();
            let items = envelope["items"].as_array().unwrap().clone();
            collected.extend(items);
            cursor = envelope["_truncation"]["cursor"].as_str().map(|s| s.to_string());
            if cursor.is_none() {
                break;
            }
        }
        assert_eq!(collected.len(), total);
    }

    #[test]
    fn max_answer_chars_is_converted_with_deprecation_note() {
        let session = SessionState::new();
        let result = ToolResult::success(json!({"items": []}));
        let params = json!({"max_answer_chars": 400});
        let envelope = wrap_envelope(&StubTool, &params, result, &session).unwrap();
        assert_eq!(envelope["_deprecated"]["parameter"], "max_answer_chars");
    }

    #[test]
    fn explicit_verbosity_is_echoed_as_is() {
        let session = SessionState::new();
        let result = ToolResult::success(json!({}));
        let params = json!({"verbosity": "detailed"});
        let envelope = wrap_envelope(&StubTool, &params, result, &session).unwrap();
        assert_eq!(envelope["_verbosity"]["level"], "detailed");
        assert_eq!(envelope["_verbosity"]["reason"], "explicit");
    }
}
