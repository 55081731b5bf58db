use serde_json::Value;

use super::format::truncate_string;

const REDACTED: &str = "[REDACTED]";

/// Maximum length of a body rendered into a log line
const MAX_LOGGED_BODY_LENGTH: usize = 512;

/// Field-name fragments whose values never reach the logs.
const SENSITIVE_FRAGMENTS: &[&str] = &["token", "password", "authorization", "secret"];

fn is_sensitive(key: &str) -> bool {
    let lower = key.to_ascii_lowercase();
    SENSITIVE_FRAGMENTS.iter().any(|f| lower.contains(f))
}

/// Copy of `value` with every sensitive field replaced, at any depth.
pub fn redact_json(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| {
                    let v = if is_sensitive(k) {
                        Value::String(REDACTED.to_string())
                    } else {
                        redact_json(v)
                    };
                    (k.clone(), v)
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_json).collect()),
        other => other.clone(),
    }
}

/// Redacted, truncated rendering of an optional body for log fields.
pub fn redacted_body(body: Option<&Value>) -> String {
    match body {
        Some(value) => truncate_string(&redact_json(value).to_string(), MAX_LOGGED_BODY_LENGTH),
        None => "-".to_string(),
    }
}
