use std::fmt;
use std::sync::Arc;

use crate::error::DiffResult;
use crate::raw::Raw;
use crate::value::Value;

use super::{raw_args, BaseFn};

/// A piecewise-constant function.
///
/// Differentiable arguments are stripped to their raw values and the
/// raw result is returned untouched. Nothing is ever tracked, so no
/// registry is involved.
///
/// ```
/// use fwdiff::{number_arg, Constant, Raw, Value};
///
/// let is_positive = Constant::new("is_positive", |a| Ok(Raw::Bool(number_arg("is_positive", a, 0)? > 0.0)));
/// let x = Value::variable(2.0).unwrap();
/// assert_eq!(is_positive.call(&[x]).unwrap(), Raw::Bool(true));
/// ```
#[derive(Clone)]
pub struct Constant {
    name: String,
    func: Arc<BaseFn>,
}

impl Constant {
    /// Wrap `func`.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Raw]) -> DiffResult<Raw> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }

    /// The name used in errors.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Strip `args` to raw values and call the function.
    pub fn call(&self, args: &[Value]) -> DiffResult<Raw> {
        (self.func)(&raw_args(args))
    }
}

impl fmt::Debug for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constant").field("name", &self.name).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::Registry;
    use crate::scalar::DiffFloat;

    #[test]
    fn strips_nested_differentiable_values() {
        let len = Constant::new("len", |a| {
            let n = a.first().and_then(Raw::items).map_or(0, <[Raw]>::len);
            Ok(Raw::Int(n as i64))
        });
        let v = Registry::with_defaults()
            .variables(Raw::from(vec![1.0, 2.0, 3.0]))
            .unwrap();
        assert_eq!(len.call(&[v]).unwrap(), Raw::Int(3));
        assert_eq!(len.name(), "len");
    }

    #[test]
    fn result_is_never_differentiable() {
        let first = Constant::new("first", |a| Ok(a[0].clone()));
        let x = Value::from(DiffFloat::variable(4.0));
        assert_eq!(first.call(&[x]).unwrap(), Raw::Float(4.0));
    }
}
