//! Compile-time policies.

use serde::{Deserialize, Serialize};

/// What a member or index read yields when the property does not exist.
///
/// Applies to every read, including reads on `null`, `undefined` and other
/// non-container values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingProperty {
    /// Yield `undefined`.
    #[default]
    Undefined,
    /// Fail the stream with `E310`.
    Error,
}

/// What happens to an error raised inside a pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipeErrorPolicy {
    /// The error terminates the pipe's stream.
    #[default]
    Propagate,
    /// The error is logged and the pipe emits `null` instead.
    DegradeToNull,
}

/// Options for [`Compiler`](crate::Compiler) and the `compile_*_with` entry
/// points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    pub missing_property: MissingProperty,
    pub pipe_errors: PipeErrorPolicy,
}

impl CompileOptions {
    /// Parse options from JSON; absent fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = CompileOptions::default();
        assert_eq!(options.missing_property, MissingProperty::Undefined);
        assert_eq!(options.pipe_errors, PipeErrorPolicy::Propagate);
    }

    #[test]
    fn test_from_json_partial() {
        let options = CompileOptions::from_json_str(r#"{ "pipe_errors": "degrade_to_null" }"#)
            .expect("valid options");
        assert_eq!(options.pipe_errors, PipeErrorPolicy::DegradeToNull);
        assert_eq!(options.missing_property, MissingProperty::Undefined);

        let options = CompileOptions::from_json_str("{}").expect("valid options");
        assert_eq!(options, CompileOptions::default());
    }

    #[test]
    fn test_unknown_variant_is_rejected() {
        assert!(CompileOptions::from_json_str(r#"{ "missing_property": "explode" }"#).is_err());
    }
}
