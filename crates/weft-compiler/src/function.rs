//! Host functions callable from templates.

use std::fmt;
use std::rc::Rc;

use thiserror::Error;

use crate::value::Value;

/// A failure raised by a host function. The compiler reports it as `E500`
/// at the call site.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HostError {
    #[error("{0}")]
    Failed(String),

    #[error("expected {expected} argument(s), got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("argument {index} must be {expected}, got {actual}")]
    ArgumentType {
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },
}

impl HostError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

type HostFn = dyn Fn(&[Value]) -> Result<Value, HostError>;

/// A callable value. Functions compare by identity.
#[derive(Clone)]
pub struct Function(Rc<HostFn>);

impl Function {
    pub fn new(f: impl Fn(&[Value]) -> Result<Value, HostError> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// A function of exactly one argument.
    pub fn unary(f: impl Fn(&Value) -> Result<Value, HostError> + 'static) -> Self {
        Self::new(move |args| match args {
            [arg] => f(arg),
            _ => Err(HostError::Arity {
                expected: 1,
                actual: args.len(),
            }),
        })
    }

    pub fn call(&self, args: &[Value]) -> Result<Value, HostError> {
        (self.0)(args)
    }

    /// `x => next(self(x))`
    pub fn then(&self, next: &Function) -> Function {
        let (first, second) = (self.clone(), next.clone());
        Function::new(move |args| {
            let intermediate = first.call(args)?;
            second.call(std::slice::from_ref(&intermediate))
        })
    }

    pub fn ptr_eq(&self, other: &Function) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for Function {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[function]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add(n: f64) -> Function {
        Function::unary(move |v| match v {
            Value::Number(x) => Ok(Value::Number(x + n)),
            other => Err(HostError::ArgumentType {
                index: 0,
                expected: "number",
                actual: other.type_name(),
            }),
        })
    }

    #[test]
    fn test_then_composes_left_to_right() {
        let double = Function::unary(|v| match v {
            Value::Number(x) => Ok(Value::Number(x * 2.0)),
            _ => Err(HostError::failed("not a number")),
        });
        let composed = add(1.0).then(&double);
        assert_eq!(composed.call(&[Value::Number(3.0)]), Ok(Value::Number(8.0)));
    }

    #[test]
    fn test_unary_checks_arity() {
        let err = add(1.0).call(&[]).unwrap_err();
        assert_eq!(err, HostError::Arity { expected: 1, actual: 0 });
        assert_eq!(err.to_string(), "expected 1 argument(s), got 0");
    }

    #[test]
    fn test_identity() {
        let f = add(1.0);
        assert!(f.ptr_eq(&f.clone()));
        assert!(!f.ptr_eq(&add(1.0)));
    }
}
