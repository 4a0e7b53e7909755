//! Answer normalization.
//!
//! Whatever a strategy digs out of a page is coerced into one of a few
//! shapes that always serialize cleanly into the submission payload.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A submittable answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Object(Map<String, Value>),
}

impl Answer {
    /// The low-confidence placeholder used when every strategy misses.
    pub fn placeholder() -> Self {
        Answer::Int(0)
    }

    pub fn to_value(&self) -> Value {
        Value::from(self.clone())
    }
}

impl From<Answer> for Value {
    fn from(answer: Answer) -> Self {
        match answer {
            Answer::Bool(b) => Value::Bool(b),
            Answer::Int(i) => Value::from(i),
            Answer::Float(f) => serde_json::Number::from_f64(f)
                .map(Value::Number)
                .unwrap_or_else(|| Value::String(f.to_string())),
            Answer::Text(s) => Value::String(s),
            Answer::Object(map) => Value::Object(map),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::Bool(b) => write!(f, "{b}"),
            Answer::Int(i) => write!(f, "{i}"),
            Answer::Float(x) => write!(f, "{x:?}"),
            Answer::Text(s) => f.write_str(s),
            Answer::Object(map) => write!(f, "{}", Value::Object(map.clone())),
        }
    }
}

/// Coerce a raw extracted value into an [`Answer`].
///
/// Numbers, strings, booleans and objects pass through; integers stay
/// integers and floats stay floats. Arrays and `null` are rendered to
/// their canonical JSON text.
pub fn normalize(raw: Value) -> Answer {
    match raw {
        Value::Bool(b) => Answer::Bool(b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Answer::Int(i)
            } else if n.is_f64() {
                n.as_f64().map(Answer::Float).unwrap_or_else(|| Answer::Text(n.to_string()))
            } else {
                // u64 above i64::MAX
                Answer::Text(n.to_string())
            }
        }
        Value::String(s) => Answer::Text(s),
        Value::Object(map) => Answer::Object(map),
        other @ (Value::Array(_) | Value::Null) => Answer::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn twice(v: Value) -> (Answer, Answer) {
        let once = normalize(v);
        let again = normalize(once.to_value());
        (once, again)
    }

    #[test]
    fn test_scalars_pass_through() {
        assert_eq!(normalize(json!(42)), Answer::Int(42));
        assert_eq!(normalize(json!(30.0)), Answer::Float(30.0));
        assert_eq!(normalize(json!("abc")), Answer::Text("abc".into()));
        assert_eq!(normalize(json!(true)), Answer::Bool(true));
    }

    #[test]
    fn test_structured_values_become_text() {
        assert_eq!(normalize(json!([1, 2])), Answer::Text("[1,2]".into()));
        assert_eq!(normalize(Value::Null), Answer::Text("null".into()));
        let obj = normalize(json!({"a": 1}));
        assert!(matches!(obj, Answer::Object(_)));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        for v in [
            json!(0),
            json!(-17),
            json!(2.5),
            json!(30.0),
            json!("hello"),
            json!(""),
            json!(false),
            json!(u64::MAX),
            json!({"k": [1]}),
        ] {
            let (once, again) = twice(v.clone());
            assert_eq!(once, again, "not idempotent for {v}");
        }
    }

    #[test]
    fn test_serializes_as_bare_json() {
        let payload = serde_json::to_string(&Answer::Float(30.0)).unwrap();
        assert_eq!(payload, "30.0");
        let payload = serde_json::to_string(&Answer::Text("x".into())).unwrap();
        assert_eq!(payload, "\"x\"");
        assert_eq!(Answer::placeholder().to_value(), json!(0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Answer::Float(30.0).to_string(), "30.0");
        assert_eq!(Answer::Int(7).to_string(), "7");
        assert_eq!(Answer::Text("data:x".into()).to_string(), "data:x");
    }
}
