//! Differentiable function dispatch.
//!
//! Three interchangeable strategies produce local partial derivatives:
//!
//! - [`Analytic`]: one derivative function per argument
//! - [`Joint`]: the function returns its value and all partials at once
//! - [`FiniteDifference`]: forward-difference estimates, no derivative
//!   functions required
//!
//! All three then run the same assembly: chain each differentiable
//! argument's derivative map through its local partial, sum the
//! results (a variable passed twice must have both contributions
//! added), and ask the [`Registry`] to build the output. A sequence
//! output is wrapped element by element into a container of the same
//! flavour.
//!
//! If no argument is differentiable the raw result is returned as-is
//! and the registry is never consulted.
//!
//! [`Constant`] is the odd one out: it strips differentiable arguments
//! and never produces a differentiable value, for piecewise-constant
//! operations such as comparisons.

use std::sync::Arc;

use tracing::trace;

use crate::derivatives::{sum_dicts, DerivativeMap};
use crate::error::{DiffError, DiffResult};
use crate::partial::Partial;
use crate::raw::Raw;
use crate::registry::{self, Registry};
use crate::value::{DiffValue, Differentiable, Value};

mod analytic;
mod constant;
mod finite;
mod joint;

pub use analytic::Analytic;
pub use constant::Constant;
pub use finite::FiniteDifference;
pub use joint::{Joint, JointFn, JointOutput};

/// A function of raw arguments.
pub type BaseFn = dyn Fn(&[Raw]) -> DiffResult<Raw> + Send + Sync;

/// Box a closure as a shareable [`BaseFn`].
///
/// ```
/// use fwdiff::{base_fn, number_arg, Raw};
///
/// let double = base_fn(|args| Ok(Raw::Float(2.0 * number_arg("double", args, 0)?)));
/// assert_eq!(double(&[Raw::Float(4.0)]).unwrap(), Raw::Float(8.0));
/// ```
pub fn base_fn<F>(f: F) -> Arc<BaseFn>
where
    F: Fn(&[Raw]) -> DiffResult<Raw> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Read argument `index` as a number, failing with `MissingArgument`
/// or `NotNumeric`.
pub fn number_arg(function: &str, args: &[Raw], index: usize) -> DiffResult<f64> {
    args.get(index)
        .ok_or_else(|| DiffError::MissingArgument {
            function: function.to_string(),
            index,
        })?
        .as_f64()
}

/// The common contract of every differentiation strategy.
pub trait DiffFunction {
    /// The name used in errors and log fields.
    fn name(&self) -> &str;

    /// Evaluate against an explicit registry.
    fn call_with(&self, registry: &Registry, args: &[Value]) -> DiffResult<Value>;

    /// Evaluate against the process-wide registry.
    fn call(&self, args: &[Value]) -> DiffResult<Value> {
        self.call_with(&registry::global(), args)
    }
}

pub(crate) fn raw_args(args: &[Value]) -> Vec<Raw> {
    args.iter().map(Value::raw).collect()
}

pub(crate) fn diff_args(args: &[Value]) -> impl Iterator<Item = (usize, &DiffValue)> {
    args.iter()
        .enumerate()
        .filter_map(|(i, a)| a.as_diff().map(|d| (i, d)))
}

pub(crate) fn any_differentiable(args: &[Value]) -> bool {
    args.iter().any(Value::is_differentiable)
}

/// How a raw output will be wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Shape {
    /// One registered value.
    Single,
    /// A sequence of this many elements, wrapped one by one.
    Items(usize),
}

pub(crate) fn output_shape(registry: &Registry, function: &str, out: &Raw) -> DiffResult<Shape> {
    if registry.contains(out.kind()) {
        return Ok(Shape::Single);
    }
    let unsupported = |kind| DiffError::UnsupportedOutputType {
        function: function.to_string(),
        kind,
    };
    match out {
        Raw::Seq(_, items) => match items.iter().find(|item| !registry.contains(item.kind())) {
            Some(item) => Err(unsupported(item.kind())),
            None => Ok(Shape::Items(items.len())),
        },
        other => Err(unsupported(other.kind())),
    }
}

/// One argument's chained contribution to the output.
pub(crate) enum Contribution {
    Single(DerivativeMap),
    Items(Vec<DerivativeMap>),
}

/// Chain `arg` through a local derivative given as a raw value.
///
/// `None` is the missing-derivative case: every output position gets
/// `NotImplemented` for every variable `arg` depends on.
pub(crate) fn chain_local(
    function: &str,
    arg: &DiffValue,
    local: Option<&Raw>,
    shape: Shape,
) -> DiffResult<Contribution> {
    match (shape, local) {
        (Shape::Single, None) => Ok(Contribution::Single(arg.chain(Partial::NotImplemented))),
        (Shape::Single, Some(d)) => Ok(Contribution::Single(arg.chain(Partial::Known(d.as_f64()?)))),
        (Shape::Items(n), None) => Ok(Contribution::Items(vec![
            arg.chain(Partial::NotImplemented);
            n
        ])),
        (Shape::Items(n), Some(d)) => {
            let items = d.items().ok_or_else(|| shape_error(function, n, 1))?;
            if items.len() != n {
                return Err(shape_error(function, n, items.len()));
            }
            items
                .iter()
                .map(|dij| Ok(arg.chain(Partial::Known(dij.as_f64()?))))
                .collect::<DiffResult<Vec<_>>>()
                .map(Contribution::Items)
        }
    }
}

pub(crate) fn shape_error(function: &str, expected: usize, found: usize) -> DiffError {
    DiffError::DerivativeShape {
        function: function.to_string(),
        expected,
        found,
    }
}

/// Sum contributions and wrap `out` according to `shape`.
pub(crate) fn assemble(
    registry: &Registry,
    function: &str,
    out: Raw,
    shape: Shape,
    contributions: Vec<Contribution>,
) -> DiffResult<Value> {
    match (shape, out) {
        (Shape::Items(n), Raw::Seq(kind, items)) => {
            let mut per_item: Vec<Vec<DerivativeMap>> = (0..n).map(|_| Vec::new()).collect();
            for contribution in contributions {
                match contribution {
                    Contribution::Items(maps) if maps.len() == n => {
                        for (slot, map) in per_item.iter_mut().zip(maps) {
                            slot.push(map);
                        }
                    }
                    Contribution::Items(maps) => return Err(shape_error(function, n, maps.len())),
                    Contribution::Single(_) => return Err(shape_error(function, n, 1)),
                }
            }
            let wrapped = items
                .into_iter()
                .zip(per_item)
                .map(|(item, maps)| {
                    registry
                        .construct(item, Some(sum_dicts(maps)))
                        .map(Value::Diff)
                })
                .collect::<DiffResult<Vec<_>>>()?;
            Ok(Value::Seq(kind, wrapped))
        }
        (_, out) => {
            let mut maps = Vec::with_capacity(contributions.len());
            for contribution in contributions {
                match contribution {
                    Contribution::Single(map) => maps.push(map),
                    Contribution::Items(m) => return Err(shape_error(function, 1, m.len())),
                }
            }
            registry
                .construct(out, Some(sum_dicts(maps)))
                .map(Value::Diff)
        }
    }
}

pub(crate) fn trace_dispatch(strategy: &'static str, function: &str, args: &[Value]) {
    trace!(
        strategy,
        function,
        arity = args.len(),
        differentiable = diff_args(args).count(),
        "dispatching differentiable call"
    );
}

/// Wrap `func` with one analytic derivative per argument.
///
/// ```
/// use fwdiff::{base_fn, number_arg, wrap_analytic, DiffFunction, Raw, Value};
///
/// let square = wrap_analytic(
///     "square",
///     |a: &[Raw]| Ok(Raw::Float(number_arg("square", a, 0)?.powi(2))),
///     vec![base_fn(|a| Ok(Raw::Float(2.0 * number_arg("square", a, 0)?)))],
/// );
///
/// let x = Value::variable(3.0).unwrap();
/// let y = square.call(&[x.clone()]).unwrap();
/// assert_eq!(y.derivative(x.var_id().unwrap()), 6.0);
/// ```
pub fn wrap_analytic<F>(
    name: impl Into<String>,
    func: F,
    derivatives: Vec<Arc<BaseFn>>,
) -> Analytic
where
    F: Fn(&[Raw]) -> DiffResult<Raw> + Send + Sync + 'static,
{
    Analytic::new(name, func).with_derivatives(derivatives)
}

/// Wrap a function that returns its value and partials together.
pub fn wrap_joint<F>(name: impl Into<String>, func: F, request_derivatives: bool) -> Joint
where
    F: Fn(&[Raw], Option<&[bool]>) -> DiffResult<JointOutput> + Send + Sync + 'static,
{
    Joint::new(name, func, request_derivatives)
}

/// Wrap a piecewise-constant function.
pub fn wrap_constant<F>(name: impl Into<String>, func: F) -> Constant
where
    F: Fn(&[Raw]) -> DiffResult<Raw> + Send + Sync + 'static,
{
    Constant::new(name, func)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::SeqKind;
    use crate::scalar::DiffFloat;

    #[test]
    fn scalar_output_is_single() {
        let registry = Registry::with_defaults();
        assert_eq!(output_shape(&registry, "f", &Raw::Float(1.0)), Ok(Shape::Single));
        assert_eq!(
            output_shape(&registry, "f", &Raw::from(vec![1.0, 2.0])),
            Ok(Shape::Items(2))
        );
    }

    #[test]
    fn unrepresentable_output_is_rejected() {
        let registry = Registry::with_defaults();
        let err = output_shape(&registry, "f", &Raw::Int(1)).unwrap_err();
        assert_eq!(
            err,
            DiffError::UnsupportedOutputType {
                function: "f".to_string(),
                kind: crate::raw::RawKind::Int,
            }
        );
    }

    #[test]
    fn sequence_elements_must_be_registered() {
        let registry = Registry::with_defaults();
        let nested = Raw::list([Raw::from(vec![1.0]), Raw::from(vec![2.0])]);
        assert_eq!(
            output_shape(&registry, "f", &nested),
            Err(DiffError::UnsupportedOutputType {
                function: "f".to_string(),
                kind: crate::raw::RawKind::List,
            })
        );
        assert_eq!(
            output_shape(&registry, "f", &Raw::tuple([Raw::Float(1.0), Raw::Int(2)])),
            Err(DiffError::UnsupportedOutputType {
                function: "f".to_string(),
                kind: crate::raw::RawKind::Int,
            })
        );
    }

    #[test]
    fn unregistered_sequence_elements_fail_alike_in_every_strategy() {
        let registry = Registry::with_defaults();
        let flags = |_: &[Raw]| -> DiffResult<Raw> {
            Ok(Raw::list([Raw::Bool(true), Raw::Bool(false)]))
        };
        let x = registry.variables(Raw::Float(1.0)).unwrap();
        let args = [x];

        let analytic = Analytic::new("f", flags).with_derivative(0, |_| Ok(Raw::Float(0.0)));
        let joint = Joint::new("f", move |a, _| Ok((flags(a)?, vec![None])), false);
        let finite = FiniteDifference::new("f", flags);

        let expected = DiffError::UnsupportedOutputType {
            function: "f".to_string(),
            kind: crate::raw::RawKind::Bool,
        };
        assert_eq!(analytic.call_with(&registry, &args), Err(expected.clone()));
        assert_eq!(joint.call_with(&registry, &args), Err(expected.clone()));
        assert_eq!(finite.call_with(&registry, &args), Err(expected));
    }

    #[test]
    fn missing_local_is_broadcast_as_marker() {
        let x = DiffValue::from(DiffFloat::variable(1.0));
        let Ok(Contribution::Items(maps)) = chain_local("f", &x, None, Shape::Items(3)) else {
            panic!("expected per-item contributions");
        };
        assert_eq!(maps.len(), 3);
        assert!(maps
            .iter()
            .all(|m| m.get_or_empty(&x.id()) == Partial::NotImplemented));
    }

    #[test]
    fn mismatched_local_length_is_rejected() {
        let x = DiffValue::from(DiffFloat::variable(1.0));
        let local = Raw::from(vec![1.0]);
        let err = chain_local("f", &x, Some(&local), Shape::Items(2))
            .err()
            .unwrap();
        assert_eq!(err, shape_error("f", 2, 1));
    }

    #[test]
    fn wrapped_joint_propagates_tuple_partials() {
        // polar(r, θ) = (r cos θ, r sin θ)
        let polar = wrap_joint(
            "polar",
            |a, mask| {
                let (r, t) = (number_arg("polar", a, 0)?, number_arg("polar", a, 1)?);
                let wants = |i: usize| mask.map_or(true, |m| m[i]);
                let dr = wants(0).then(|| Raw::tuple([Raw::Float(t.cos()), Raw::Float(t.sin())]));
                let dt = wants(1)
                    .then(|| Raw::tuple([Raw::Float(-r * t.sin()), Raw::Float(r * t.cos())]));
                Ok((Raw::tuple([Raw::Float(r * t.cos()), Raw::Float(r * t.sin())]), vec![dr, dt]))
            },
            true,
        );
        assert!(polar.requests_derivatives());

        let registry = Registry::with_defaults();
        let r = registry.variables(Raw::Float(2.0)).unwrap();
        let Value::Seq(SeqKind::Tuple, items) = polar
            .call_with(&registry, &[r.clone(), Value::from(0.0)])
            .unwrap()
        else {
            panic!("expected a tuple");
        };
        let id = r.var_id().unwrap();
        assert_eq!(items[0].raw(), Raw::Float(2.0));
        assert_eq!(items[0].derivative(id), 1.0);
        assert_eq!(items[1].derivative(id), 0.0);
    }

    #[test]
    fn wrapped_constant_drops_tracking() {
        let floor = wrap_constant("floor", |a| Ok(Raw::Float(number_arg("floor", a, 0)?.floor())));
        let x = Value::from(DiffFloat::variable(2.7));
        assert_eq!(floor.call(&[x]).unwrap(), Raw::Float(2.0));
        assert_eq!(floor.name(), "floor");
    }

    #[test]
    fn number_arg_reports_missing_position() {
        assert_eq!(
            number_arg("f", &[Raw::Float(1.0)], 1),
            Err(DiffError::MissingArgument {
                function: "f".to_string(),
                index: 1
            })
        );
    }
}
