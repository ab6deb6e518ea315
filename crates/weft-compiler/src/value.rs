//! Runtime values flowing through compiled templates.

use std::collections::BTreeMap;
use std::fmt;

use weft_stream::Stream;
use weft_types::TemplateError;

use crate::function::Function;

/// The stream type every compiled node produces.
pub type ValueStream = Stream<Value, TemplateError>;

/// A template runtime value.
///
/// `Stream` is the live variant: a value that changes over time. Everything
/// else is a plain value. [`Value::lift`] turns either into a stream.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Object(BTreeMap<String, Value>),
    Function(Function),
    Stream(ValueStream),
}

impl Value {
    /// Normalize to a stream: a live value passes through unchanged, a plain
    /// value becomes a stream that emits it once and completes.
    pub fn lift(self) -> ValueStream {
        match self {
            Value::Stream(stream) => stream,
            plain => Stream::of(plain),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
            Value::Function(_) => "function",
            Value::Stream(_) => "stream",
        }
    }

    pub fn is_nullish(&self) -> bool {
        matches!(self, Value::Undefined | Value::Null)
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Function> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    /// Text form used when a value is spliced into surrounding text.
    pub fn to_text(&self) -> String {
        match self {
            Value::Undefined => "undefined".to_string(),
            Value::Null => "null".to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => format_number(*n),
            Value::String(s) => s.clone(),
            Value::Array(items) => items
                .iter()
                .map(|item| match item {
                    Value::Undefined | Value::Null => String::new(),
                    other => other.to_text(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Value::Object(_) => "[object Object]".to_string(),
            Value::Function(_) => "[function]".to_string(),
            Value::Stream(_) => "[stream]".to_string(),
        }
    }

    /// Read `self[key]`. Objects are keyed by the key's text; arrays and
    /// strings by non-negative integer index, plus `length`. `None` when the
    /// property does not exist.
    pub fn property(&self, key: &Value) -> Option<Value> {
        match self {
            Value::Object(map) => map.get(&key.to_text()).cloned(),
            Value::Array(items) => match key_index(key) {
                Some(i) => items.get(i).cloned(),
                None if is_length(key) => Some(Value::Number(items.len() as f64)),
                None => None,
            },
            Value::String(s) => match key_index(key) {
                Some(i) => s.chars().nth(i).map(|c| Value::String(c.to_string())),
                None if is_length(key) => Some(Value::Number(s.chars().count() as f64)),
                None => None,
            },
            _ => None,
        }
    }

    /// Convert to JSON. `undefined` becomes `null`; functions and streams
    /// have no JSON form.
    pub fn to_json(&self) -> Option<serde_json::Value> {
        Some(match self {
            Value::Undefined | Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Number(n) => serde_json::Number::from_f64(*n)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => serde_json::Value::Array(
                items.iter().map(Value::to_json).collect::<Option<Vec<_>>>()?,
            ),
            Value::Object(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| v.to_json().map(|v| (k.clone(), v)))
                    .collect::<Option<serde_json::Map<_, _>>>()?,
            ),
            Value::Function(_) | Value::Stream(_) => return None,
        })
    }
}

fn key_index(key: &Value) -> Option<usize> {
    match key {
        Value::Number(n) if *n >= 0.0 && n.fract() == 0.0 => Some(*n as usize),
        Value::String(s) => s.parse::<usize>().ok().filter(|i| i.to_string() == *s),
        _ => None,
    }
}

fn is_length(key: &Value) -> bool {
    key.as_str() == Some("length")
}

/// Shortest round-trip form. Magnitudes of `1e21` and above, or below
/// `1e-6`, use exponent notation with an explicit sign (`1e+21`, `1.5e-7`).
fn format_number(n: f64) -> String {
    if n.is_nan() {
        "NaN".to_string()
    } else if n.is_infinite() {
        let text = if n > 0.0 { "Infinity" } else { "-Infinity" };
        text.to_string()
    } else if n == 0.0 {
        "0".to_string()
    } else if (1e-6..1e21).contains(&n.abs()) {
        n.to_string()
    } else {
        let text = format!("{n:e}");
        match text.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => text,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => a.ptr_eq(b),
            (Value::Stream(a), Value::Stream(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_text())
    }
}

// ── Conversions ───────────────────────────────────────────────────────────────

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Number(f64::from(n))
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::Array(items)
    }
}

impl From<BTreeMap<String, Value>> for Value {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Value::Object(map)
    }
}

impl From<Function> for Value {
    fn from(f: Function) -> Self {
        Value::Function(f)
    }
}

impl From<ValueStream> for Value {
    fn from(stream: ValueStream) -> Self {
        Value::Stream(stream)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_text() {
        assert_eq!(Value::Number(1.0).to_text(), "1");
        assert_eq!(Value::Number(-1.0).to_text(), "-1");
        assert_eq!(Value::Number(3.25).to_text(), "3.25");
        assert_eq!(Value::Number(1e20).to_text(), "100000000000000000000");
        assert_eq!(Value::Number(1e21).to_text(), "1e+21");
        assert_eq!(Value::Number(-1.5e300).to_text(), "-1.5e+300");
        assert_eq!(Value::Number(0.000001).to_text(), "0.000001");
        assert_eq!(Value::Number(1e-7).to_text(), "1e-7");
        assert_eq!(Value::Number(1.5e-7).to_text(), "1.5e-7");
        assert_eq!(Value::Number(-0.0).to_text(), "0");
        assert_eq!(Value::Number(0.1 + 0.2).to_text(), "0.30000000000000004");
        assert_eq!(Value::Number(f64::INFINITY).to_text(), "Infinity");
        assert_eq!(Value::Number(f64::NEG_INFINITY).to_text(), "-Infinity");
        assert_eq!(Value::Number(f64::NAN).to_text(), "NaN");
    }

    #[test]
    fn test_compound_text() {
        let array = Value::Array(vec![1.into(), Value::Null, "a".into()]);
        assert_eq!(array.to_text(), "1,,a");
        assert_eq!(Value::Object(BTreeMap::new()).to_text(), "[object Object]");
        assert_eq!(Value::Undefined.to_text(), "undefined");
        assert_eq!(Value::Bool(true).to_text(), "true");
    }

    #[test]
    fn test_property_reads() {
        let obj = Value::from(json!({ "a": 1, "list": [10, 20] }));
        assert_eq!(obj.property(&"a".into()), Some(Value::Number(1.0)));
        assert_eq!(obj.property(&"zzz".into()), None);

        let list = obj.property(&"list".into()).unwrap();
        assert_eq!(list.property(&1.into()), Some(Value::Number(20.0)));
        assert_eq!(list.property(&"0".into()), Some(Value::Number(10.0)));
        assert_eq!(list.property(&"length".into()), Some(Value::Number(2.0)));
        assert_eq!(list.property(&5.into()), None);
        assert_eq!(list.property(&(-1).into()), None);
        assert_eq!(list.property(&"01".into()), None);
        assert_eq!(list.property(&"+1".into()), None);
        assert_eq!(list.property(&" 1".into()), None);
        assert_eq!(list.property(&(1.5).into()), None);

        let text = Value::from("héllo");
        assert_eq!(text.property(&1.into()), Some(Value::from("é")));
        assert_eq!(text.property(&"length".into()), Some(Value::Number(5.0)));

        assert_eq!(Value::Null.property(&"a".into()), None);
    }

    #[test]
    fn test_json_round_trip() {
        let json = json!({ "name": "Ada", "tags": ["x", null], "n": 2.5, "ok": true });
        assert_eq!(Value::from(json.clone()).to_json(), Some(json));
        assert_eq!(Value::Undefined.to_json(), Some(serde_json::Value::Null));
        assert_eq!(
            Value::Function(Function::new(|_| Ok(Value::Null))).to_json(),
            None
        );
    }

    #[test]
    fn test_lift_passes_streams_through() {
        let stream: ValueStream = Stream::of(Value::Number(1.0));
        let lifted = Value::Stream(stream.clone()).lift();
        assert!(lifted.ptr_eq(&stream));
        assert_eq!(Value::Number(2.0).lift().first_now(), Some(Ok(Value::Number(2.0))));
    }
}
