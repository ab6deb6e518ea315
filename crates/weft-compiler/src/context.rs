//! Evaluation contexts: the names a template can reference.

use std::collections::BTreeMap;

use crate::value::Value;

/// A mapping from names to plain values, functions or live streams.
///
/// A name bound to [`Value::Undefined`] is still bound. The compiler never
/// mutates a context.
#[derive(Debug, Clone, Default)]
pub struct Context {
    bindings: BTreeMap<String, Value>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.bindings.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.bindings.keys().map(String::as_str)
    }

    /// Bind every entry of a JSON object. Any other JSON value yields an
    /// empty context.
    pub fn from_json(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Object(map) => map
                .iter()
                .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                .collect(),
            _ => Self::default(),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut context = Self::default();
        for (name, value) in iter {
            context.insert(name, value);
        }
        context
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_and_lookup() {
        let ctx = Context::new().with("a", 1).with("b", "two");
        assert_eq!(ctx.get("a"), Some(&Value::Number(1.0)));
        assert_eq!(ctx.get("b"), Some(&Value::from("two")));
        assert!(ctx.get("c").is_none());
        assert_eq!(ctx.names().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn test_undefined_is_bound() {
        let ctx = Context::new().with("u", Value::Undefined);
        assert!(ctx.contains("u"));
    }

    #[test]
    fn test_from_json() {
        let ctx = Context::from_json(&json!({ "user": { "name": "Ada" }, "n": 3 }));
        assert_eq!(ctx.len(), 2);
        assert_eq!(ctx.get("n"), Some(&Value::Number(3.0)));
        assert!(Context::from_json(&json!([1, 2])).is_empty());
    }
}
