use chrono::{DateTime, Utc};
use serde_json::{json, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Write as _;
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// ToolValue
// ---------------------------------------------------------------------------

/// The closed set of shapes a tool may return. JSON-native shapes convert
/// losslessly; the remaining variants carry values with no canonical JSON
/// form and serialize through a fixed fallback representation instead of
/// ever failing.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolValue {
    Null,
    Bool(bool),
    Int(i64),
    /// Integers above `i64::MAX`, kept lossless rather than degraded to float.
    Uint(u64),
    Float(f64),
    Text(String),
    List(Vec<ToolValue>),
    Map(BTreeMap<String, ToolValue>),
    /// Opaque filesystem path; serialized as its lossy string form.
    Path(PathBuf),
    /// Serialized as an RFC 3339 string.
    Timestamp(DateTime<Utc>),
    /// Set-like collection; serialized as a sorted array.
    Set(BTreeSet<String>),
    /// Binary buffer; serialized as lowercase hex.
    Bytes(Vec<u8>),
}

impl ToolValue {
    /// Convert to JSON. One exhaustive match per variant; total, never errors.
    pub fn to_json(&self) -> Value {
        match self {
            ToolValue::Null => Value::Null,
            ToolValue::Bool(b) => json!(b),
            ToolValue::Int(n) => json!(n),
            ToolValue::Uint(n) => json!(n),
            ToolValue::Float(f) => {
                // Non-finite floats have no JSON form; degrade to null.
                serde_json::Number::from_f64(*f).map_or(Value::Null, Value::Number)
            }
            ToolValue::Text(s) => json!(s),
            ToolValue::List(items) => Value::Array(items.iter().map(|v| v.to_json()).collect()),
            ToolValue::Map(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            ToolValue::Path(p) => json!(p.to_string_lossy()),
            ToolValue::Timestamp(ts) => json!(ts.to_rfc3339()),
            ToolValue::Set(items) => Value::Array(items.iter().map(|s| json!(s)).collect()),
            ToolValue::Bytes(bytes) => {
                let mut hex = String::with_capacity(bytes.len() * 2);
                for b in bytes {
                    let _ = write!(hex, "{b:02x}");
                }
                json!(hex)
            }
        }
    }

    /// Lift a JSON value into the tagged union. Inverse of `to_json` for
    /// JSON-native shapes, which gives the round-trip law.
    pub fn from_json(value: Value) -> ToolValue {
        match value {
            Value::Null => ToolValue::Null,
            Value::Bool(b) => ToolValue::Bool(b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    ToolValue::Int(i)
                } else if let Some(u) = n.as_u64() {
                    ToolValue::Uint(u)
                } else {
                    ToolValue::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            Value::String(s) => ToolValue::Text(s),
            Value::Array(items) => {
                ToolValue::List(items.into_iter().map(ToolValue::from_json).collect())
            }
            Value::Object(fields) => ToolValue::Map(
                fields
                    .into_iter()
                    .map(|(k, v)| (k, ToolValue::from_json(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for ToolValue {
    fn from(value: Value) -> Self {
        ToolValue::from_json(value)
    }
}

// ---------------------------------------------------------------------------
// ToolOutcome
// ---------------------------------------------------------------------------

/// What a handler hands back: a value, or an expected domain-level failure.
///
/// Failures are results, not errors — they flow through serialization with a
/// `success: false` marker so callers can tell "the operation reports
/// failure" apart from "the protocol layer broke".
#[derive(Debug, Clone)]
pub enum ToolOutcome {
    Value(ToolValue),
    Failure {
        error: String,
        detail: Option<ToolValue>,
    },
}

impl ToolOutcome {
    pub fn failure(error: impl Into<String>) -> Self {
        ToolOutcome::Failure {
            error: error.into(),
            detail: None,
        }
    }

    /// Canonical JSON form of the outcome.
    pub fn to_json(&self) -> Value {
        match self {
            ToolOutcome::Value(v) => v.to_json(),
            ToolOutcome::Failure { error, detail } => {
                let mut obj = serde_json::Map::new();
                obj.insert("success".to_string(), json!(false));
                obj.insert("error".to_string(), json!(error));
                if let Some(detail) = detail {
                    obj.insert("detail".to_string(), detail.to_json());
                }
                Value::Object(obj)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// serialize / is_error_result
// ---------------------------------------------------------------------------

/// Canonical textual form of an outcome. Total: every outcome shape has a
/// representation.
pub fn serialize(outcome: &ToolOutcome) -> String {
    let json = outcome.to_json();
    serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
}

/// Structural predicate: does this serialized result report a domain-level
/// failure? Checks the conventional `success` flag first, then falls back to
/// the presence of an `error` field.
pub fn is_error_result(value: &Value) -> bool {
    let Some(obj) = value.as_object() else {
        return false;
    };
    match obj.get("success") {
        Some(Value::Bool(success)) => !success,
        _ => obj.contains_key("error"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn json_native_round_trip() {
        let original = json!({
            "name": "plan-tasks",
            "level": 2,
            "score": 0.85,
            "active": true,
            "tags": ["planning", "tasks"],
            "nested": { "parent": null },
        });
        let serialized = serialize(&ToolOutcome::Value(ToolValue::from_json(original.clone())));
        let parsed: Value = serde_json::from_str(&serialized).unwrap();
        assert_eq!(parsed, original);
    }

    #[test]
    fn large_unsigned_integers_round_trip() {
        let original = json!({ "big": u64::MAX, "edge": i64::MAX as u64 + 1 });
        let value = ToolValue::from_json(original.clone());
        assert_eq!(value.to_json(), original);

        let text = serialize(&ToolOutcome::Value(value));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["big"], json!(u64::MAX));
        assert_eq!(parsed["edge"], json!(9_223_372_036_854_775_808u64));
    }

    #[test]
    fn path_serializes_as_string() {
        let v = ToolValue::Path(PathBuf::from("/tmp/project/.compass/flow.db"));
        assert_eq!(v.to_json(), json!("/tmp/project/.compass/flow.db"));
    }

    #[test]
    fn timestamp_serializes_as_rfc3339() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
        let v = ToolValue::Timestamp(ts);
        assert_eq!(v.to_json(), json!("2025-03-14T09:26:53+00:00"));
    }

    #[test]
    fn set_serializes_sorted() {
        let v = ToolValue::Set(BTreeSet::from([
            "zeta".to_string(),
            "alpha".to_string(),
            "mid".to_string(),
        ]));
        assert_eq!(v.to_json(), json!(["alpha", "mid", "zeta"]));
    }

    #[test]
    fn bytes_serialize_as_hex() {
        let v = ToolValue::Bytes(vec![0xde, 0xad, 0x00, 0x0f]);
        assert_eq!(v.to_json(), json!("dead000f"));
    }

    #[test]
    fn non_finite_float_degrades_to_null() {
        assert_eq!(ToolValue::Float(f64::NAN).to_json(), Value::Null);
        assert_eq!(ToolValue::Float(f64::INFINITY).to_json(), Value::Null);
    }

    #[test]
    fn nested_record_with_fallback_shapes_never_fails() {
        let mut fields = BTreeMap::new();
        fields.insert("path".to_string(), ToolValue::Path(PathBuf::from("a/b")));
        fields.insert(
            "seen".to_string(),
            ToolValue::Set(BTreeSet::from(["x".to_string()])),
        );
        fields.insert("raw".to_string(), ToolValue::Bytes(vec![1, 2, 3]));
        let text = serialize(&ToolOutcome::Value(ToolValue::Map(fields)));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["path"], "a/b");
        assert_eq!(parsed["seen"], json!(["x"]));
        assert_eq!(parsed["raw"], "010203");
    }

    #[test]
    fn failure_outcome_carries_success_false() {
        let outcome = ToolOutcome::failure("directive not found: bogus");
        let parsed: Value = serde_json::from_str(&serialize(&outcome)).unwrap();
        assert_eq!(parsed["success"], false);
        assert_eq!(parsed["error"], "directive not found: bogus");
        assert!(is_error_result(&parsed));
    }

    #[test]
    fn is_error_result_respects_success_flag() {
        assert!(is_error_result(&json!({"success": false})));
        assert!(!is_error_result(&json!({"success": true, "error": "stale"})));
        assert!(is_error_result(&json!({"error": "boom"})));
        assert!(!is_error_result(&json!({"result": "ok"})));
        assert!(!is_error_result(&json!("plain text")));
        assert!(!is_error_result(&json!(null)));
    }
}
