use std::fmt;
use std::sync::Arc;

use crate::config::default_epsilon;
use crate::error::{DiffError, DiffResult};
use crate::raw::Raw;
use crate::registry::{self, Registry};
use crate::value::Value;

use super::{
    any_differentiable, assemble, chain_local, diff_args, finite, output_shape, raw_args,
    trace_dispatch, BaseFn, DiffFunction,
};

/// A function with one analytic derivative per argument.
///
/// Each derivative function receives the same raw arguments as the base
/// function and returns `∂out/∂arg_i` (a sequence of partials when the
/// output is a sequence). An argument with no derivative function
/// contributes [`Partial::NotImplemented`](crate::Partial::NotImplemented)
/// rather than zero.
///
/// Derivative functions are evaluated independently, so work shared
/// between them is repeated; see [`Joint`](super::Joint) for the
/// alternative.
///
/// # Examples
///
/// ```
/// use fwdiff::{number_arg, Analytic, DiffFunction, Raw, Value};
///
/// // f(x, y) = x·sin(y)
/// let f = Analytic::new("f", |a| {
///     Ok(Raw::Float(number_arg("f", a, 0)? * number_arg("f", a, 1)?.sin()))
/// })
/// .with_derivative(0, |a| Ok(Raw::Float(number_arg("f", a, 1)?.sin())))
/// .with_derivative(1, |a| {
///     Ok(Raw::Float(number_arg("f", a, 0)? * number_arg("f", a, 1)?.cos()))
/// });
///
/// let x = Value::variable(2.0).unwrap();
/// let y = Value::variable(0.0).unwrap();
/// let z = f.call(&[x.clone(), y.clone()]).unwrap();
///
/// assert_eq!(z.derivative(x.var_id().unwrap()), 0.0); // sin(0)
/// assert_eq!(z.derivative(y.var_id().unwrap()), 2.0); // 2·cos(0)
/// ```
#[derive(Clone)]
pub struct Analytic {
    name: String,
    func: Arc<BaseFn>,
    derivatives: Vec<Option<Arc<BaseFn>>>,
}

impl Analytic {
    /// Wrap `func` with no derivative functions attached yet.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Raw]) -> DiffResult<Raw> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
            derivatives: Vec::new(),
        }
    }

    /// Replace all derivative functions, in argument order.
    pub fn with_derivatives(mut self, derivatives: Vec<Arc<BaseFn>>) -> Self {
        self.derivatives = derivatives.into_iter().map(Some).collect();
        self
    }

    /// Attach the derivative with respect to argument `index`.
    pub fn with_derivative<F>(mut self, index: usize, derivative: F) -> Self
    where
        F: Fn(&[Raw]) -> DiffResult<Raw> + Send + Sync + 'static,
    {
        self.set_derivative(index, Arc::new(derivative));
        self
    }

    /// Attach the derivative with respect to argument `index`; earlier
    /// positions without one stay missing.
    pub fn set_derivative(&mut self, index: usize, derivative: Arc<BaseFn>) {
        if self.derivatives.len() <= index {
            self.derivatives.resize(index + 1, None);
        }
        self.derivatives[index] = Some(derivative);
    }

    /// `true` if argument `index` has a derivative function.
    pub fn has_derivative(&self, index: usize) -> bool {
        matches!(self.derivatives.get(index), Some(Some(_)))
    }

    /// The same binary operation with its operands swapped.
    ///
    /// `reflected(x, y) = self(y, x)`, and the derivative with respect
    /// to the first operand of the reflected function is the original
    /// derivative with respect to the second, evaluated at the swapped
    /// arguments.
    ///
    /// ```
    /// use fwdiff::{number_arg, Analytic, DiffFunction, Raw, Value};
    ///
    /// let sub = Analytic::new("sub", |a| Ok(Raw::Float(number_arg("sub", a, 0)? - number_arg("sub", a, 1)?)))
    ///     .with_derivative(0, |_| Ok(Raw::Float(1.0)))
    ///     .with_derivative(1, |_| Ok(Raw::Float(-1.0)));
    /// let rsub = sub.reflected("rsub");
    ///
    /// let x = Value::variable(2.0).unwrap();
    /// // rsub(x, 10) = 10 - x
    /// let y = rsub.call(&[x.clone(), Value::from(10.0)]).unwrap();
    /// assert_eq!(y.raw(), Raw::Float(8.0));
    /// assert_eq!(y.derivative(x.var_id().unwrap()), -1.0);
    /// ```
    pub fn reflected(&self, name: impl Into<String>) -> Analytic {
        let name = name.into();
        let derivatives = [1, 0]
            .iter()
            .map(|&i| {
                self.derivatives
                    .get(i)
                    .cloned()
                    .flatten()
                    .map(|d| swapped(&name, d))
            })
            .collect();
        Analytic {
            func: swapped(&name, self.func.clone()),
            name,
            derivatives,
        }
    }

    /// Evaluate with forward-difference estimates instead of the
    /// analytic derivatives, using the process-wide registry and
    /// default epsilon. Useful for checking derivative functions.
    pub fn finite_differences(&self, args: &[Value]) -> DiffResult<Value> {
        self.finite_differences_with(&registry::global(), args, default_epsilon())
    }

    /// As [`Analytic::finite_differences`], with an explicit registry
    /// and step.
    pub fn finite_differences_with(
        &self,
        registry: &Registry,
        args: &[Value],
        epsilon: f64,
    ) -> DiffResult<Value> {
        finite::estimate(&self.name, &*self.func, registry, args, epsilon)
    }
}

fn swapped(name: &str, f: Arc<BaseFn>) -> Arc<BaseFn> {
    let name = name.to_string();
    Arc::new(move |args: &[Raw]| match args {
        [a, b] => f(&[b.clone(), a.clone()]),
        _ if args.len() < 2 => Err(DiffError::MissingArgument {
            function: name.clone(),
            index: args.len(),
        }),
        _ => Err(DiffError::evaluation(
            name.clone(),
            format!("expected 2 arguments, got {}", args.len()),
        )),
    })
}

impl DiffFunction for Analytic {
    fn name(&self) -> &str {
        &self.name
    }

    fn call_with(&self, registry: &Registry, args: &[Value]) -> DiffResult<Value> {
        let raw = raw_args(args);
        let out = (self.func)(&raw)?;
        if !any_differentiable(args) {
            return Ok(Value::Raw(out));
        }
        trace_dispatch("analytic", &self.name, args);

        let shape = output_shape(registry, &self.name, &out)?;
        let mut contributions = Vec::new();
        for (i, arg) in diff_args(args) {
            let local = match self.derivatives.get(i) {
                Some(Some(derivative)) => Some(derivative(&raw)?),
                _ => None,
            };
            contributions.push(chain_local(&self.name, arg, local.as_ref(), shape)?);
        }
        assemble(registry, &self.name, out, shape, contributions)
    }
}

impl fmt::Debug for Analytic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let present: Vec<bool> = self.derivatives.iter().map(Option::is_some).collect();
        f.debug_struct("Analytic")
            .field("name", &self.name)
            .field("derivatives", &present)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::function::number_arg;
    use crate::partial::Partial;
    use crate::raw::SeqKind;
    use approx::assert_relative_eq;

    fn product() -> Analytic {
        Analytic::new("mul", |a| {
            Ok(Raw::Float(number_arg("mul", a, 0)? * number_arg("mul", a, 1)?))
        })
        .with_derivative(0, |a| Ok(Raw::Float(number_arg("mul", a, 1)?)))
        .with_derivative(1, |a| Ok(Raw::Float(number_arg("mul", a, 0)?)))
    }

    fn var(x: f64) -> Value {
        Registry::with_defaults()
            .variables(Raw::Float(x))
            .unwrap()
    }

    #[test]
    fn product_rule() {
        let registry = Registry::with_defaults();
        let (x, y) = (var(2.0), var(3.0));
        let z = product().call_with(&registry, &[x.clone(), y.clone()]).unwrap();
        assert_eq!(z.raw(), Raw::Float(6.0));
        assert_eq!(z.derivative(x.var_id().unwrap()), 3.0);
        assert_eq!(z.derivative(y.var_id().unwrap()), 2.0);
    }

    #[test]
    fn aliased_argument_contributions_are_summed() {
        let registry = Registry::with_defaults();
        let x = var(2.0);
        let z = product().call_with(&registry, &[x.clone(), x.clone()]).unwrap();
        assert_eq!(z.derivative(x.var_id().unwrap()), 4.0);
    }

    #[test]
    fn plain_arguments_short_circuit_without_registry() {
        let empty = Registry::new();
        let z = product()
            .call_with(&empty, &[Value::from(2.0), Value::from(5.0)])
            .unwrap();
        assert_eq!(z, Value::Raw(Raw::Float(10.0)));
    }

    #[test]
    fn finite_differences_default_to_global_step() {
        let (x, y) = (Value::variable(2.0).unwrap(), Value::variable(3.0).unwrap());
        let z = product().finite_differences(&[x.clone(), y.clone()]).unwrap();
        assert_eq!(z.raw(), Raw::Float(6.0));
        assert_relative_eq!(
            z.derivative(x.var_id().unwrap()).value().unwrap(),
            3.0,
            max_relative = 1e-5
        );
        assert_relative_eq!(
            z.derivative(y.var_id().unwrap()).value().unwrap(),
            2.0,
            max_relative = 1e-5
        );
    }

    #[test]
    fn missing_derivative_is_marked_not_zero() {
        let registry = Registry::with_defaults();
        let f = Analytic::new("f", |a| {
            Ok(Raw::Float(number_arg("f", a, 0)? + number_arg("f", a, 1)?))
        })
        .with_derivative(1, |_| Ok(Raw::Float(1.0)));
        assert!(!f.has_derivative(0));
        assert!(f.has_derivative(1));

        let (x, y) = (var(1.0), var(1.0));
        let z = f.call_with(&registry, &[x.clone(), y.clone()]).unwrap();
        assert_eq!(z.derivative(x.var_id().unwrap()), Partial::NotImplemented);
        assert_eq!(z.derivative(y.var_id().unwrap()), 1.0);
    }

    #[test]
    fn derivative_errors_propagate_unchanged() {
        let registry = Registry::with_defaults();
        let f = Analytic::new("f", |_| Ok(Raw::Float(0.0)))
            .with_derivative(0, |_| Err(DiffError::evaluation("df", "singular")));
        let err = f.call_with(&registry, &[var(1.0)]).unwrap_err();
        assert_eq!(err, DiffError::evaluation("df", "singular"));
    }

    #[test]
    fn sequence_output_is_wrapped_per_element() {
        let registry = Registry::with_defaults();
        // foo(x1, x2) = (x1 + x2, x1·x2, sin x1)
        let foo = Analytic::new("foo", |a| {
            let (x1, x2) = (number_arg("foo", a, 0)?, number_arg("foo", a, 1)?);
            Ok(Raw::tuple([
                Raw::Float(x1 + x2),
                Raw::Float(x1 * x2),
                Raw::Float(x1.sin()),
            ]))
        })
        .with_derivative(0, |a| {
            let (x1, x2) = (number_arg("foo", a, 0)?, number_arg("foo", a, 1)?);
            Ok(Raw::tuple([Raw::Float(1.0), Raw::Float(x2), Raw::Float(x1.cos())]))
        })
        .with_derivative(1, |a| {
            let x1 = number_arg("foo", a, 0)?;
            Ok(Raw::tuple([Raw::Float(1.0), Raw::Float(x1), Raw::Float(0.0)]))
        });

        let (a, b) = (var(2.0), var(3.0));
        let out = foo.call_with(&registry, &[a.clone(), b.clone()]).unwrap();
        let Value::Seq(SeqKind::Tuple, items) = out else {
            panic!("expected a tuple");
        };
        let (ia, ib) = (a.var_id().unwrap(), b.var_id().unwrap());

        assert_eq!(items[0].derivative(ia), 1.0);
        assert_eq!(items[0].derivative(ib), 1.0);
        assert_eq!(items[1].derivative(ia), 3.0);
        assert_eq!(items[1].derivative(ib), 2.0);
        assert_relative_eq!(items[2].derivative(ia).value().unwrap(), 2.0_f64.cos());
        assert_eq!(items[2].derivative(ib), 0.0);
    }

    #[test]
    fn reflected_swaps_derivatives() {
        let registry = Registry::with_defaults();
        let div = Analytic::new("div", |a| {
            Ok(Raw::Float(number_arg("div", a, 0)? / number_arg("div", a, 1)?))
        })
        .with_derivative(0, |a| Ok(Raw::Float(1.0 / number_arg("div", a, 1)?)))
        .with_derivative(1, |a| {
            let (x, y) = (number_arg("div", a, 0)?, number_arg("div", a, 1)?);
            Ok(Raw::Float(-x / (y * y)))
        });
        let rdiv = div.reflected("rdiv");

        // rdiv(x, 6) = 6 / x, d/dx = -6 / x²
        let x = var(2.0);
        let z = rdiv.call_with(&registry, &[x.clone(), Value::from(6.0)]).unwrap();
        assert_eq!(z.raw(), Raw::Float(3.0));
        assert_eq!(z.derivative(x.var_id().unwrap()), -1.5);
    }

    #[test]
    fn finite_differences_agree_with_analytic() {
        let registry = Registry::with_defaults();
        let (x, y) = (var(1.5), var(-4.0));
        let exact = product().call_with(&registry, &[x.clone(), y.clone()]).unwrap();
        let approx = product()
            .finite_differences_with(&registry, &[x.clone(), y.clone()], 1e-7)
            .unwrap();
        for id in [x.var_id().unwrap(), y.var_id().unwrap()] {
            assert_relative_eq!(
                approx.derivative(id).value().unwrap(),
                exact.derivative(id).value().unwrap(),
                max_relative = 1e-5
            );
        }
    }
}
