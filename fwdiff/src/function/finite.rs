use std::fmt;
use std::sync::Arc;

use crate::config::{default_epsilon, validate_epsilon};
use crate::error::DiffResult;
use crate::raw::Raw;
use crate::registry::Registry;
use crate::value::{Differentiable, Value};

use super::{
    any_differentiable, assemble, diff_args, output_shape, raw_args, shape_error, trace_dispatch,
    BaseFn, Contribution, DiffFunction, Shape,
};

/// Forward-difference derivatives of `func` at `args`.
///
/// Each differentiable argument is perturbed on its own while every
/// other argument keeps its raw value.
pub(crate) fn estimate(
    name: &str,
    func: &dyn Fn(&[Raw]) -> DiffResult<Raw>,
    registry: &Registry,
    args: &[Value],
    epsilon: f64,
) -> DiffResult<Value> {
    let raw = raw_args(args);
    let out = func(&raw)?;
    if !any_differentiable(args) {
        return Ok(Value::Raw(out));
    }
    trace_dispatch("finite_difference", name, args);

    let shape = output_shape(registry, name, &out)?;
    let mut contributions = Vec::new();
    for (i, arg) in diff_args(args) {
        let mut shifted_args = raw.clone();
        let perturbed = arg
            .delta(epsilon)
            .into_iter()
            .map(|shifted| {
                shifted_args[i] = shifted;
                func(&shifted_args)
            })
            .collect::<DiffResult<Vec<_>>>()?;

        let contribution = match shape {
            Shape::Single => Contribution::Single(arg.chain_from_delta(&out, &perturbed, epsilon)?),
            Shape::Items(n) => {
                let base = out.items().ok_or_else(|| shape_error(name, n, 1))?;
                let maps = (0..n)
                    .map(|k| {
                        let column = perturbed
                            .iter()
                            .map(|p| match p.items() {
                                Some(items) if items.len() == n => Ok(items[k].clone()),
                                Some(items) => Err(shape_error(name, n, items.len())),
                                None => Err(shape_error(name, n, 1)),
                            })
                            .collect::<DiffResult<Vec<_>>>()?;
                        arg.chain_from_delta(&base[k], &column, epsilon)
                    })
                    .collect::<DiffResult<Vec<_>>>()?;
                Contribution::Items(maps)
            }
        };
        contributions.push(contribution);
    }
    assemble(registry, name, out, shape, contributions)
}

/// A function differentiated purely by forward differences.
///
/// No derivative functions are needed, at the cost of accuracy: the
/// result is an approximation whose error grows with epsilon and with
/// the curvature of the function, and shrinks only until rounding
/// error takes over.
///
/// ```
/// use fwdiff::{number_arg, DiffFunction, FiniteDifference, Raw, Value};
///
/// let cube = FiniteDifference::new("cube", |a| Ok(Raw::Float(number_arg("cube", a, 0)?.powi(3))))
///     .with_epsilon(1e-7)
///     .unwrap();
///
/// let x = Value::variable(2.0).unwrap();
/// let d = cube.call(&[x.clone()]).unwrap().derivative(x.var_id().unwrap());
/// assert!((d.value().unwrap() - 12.0).abs() < 1e-4);
/// ```
#[derive(Clone)]
pub struct FiniteDifference {
    name: String,
    func: Arc<BaseFn>,
    epsilon: Option<f64>,
}

impl FiniteDifference {
    /// Wrap `func`, using the process-wide default step.
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&[Raw]) -> DiffResult<Raw> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
            epsilon: None,
        }
    }

    /// Use a fixed step instead of the process default.
    pub fn with_epsilon(mut self, epsilon: f64) -> DiffResult<Self> {
        self.epsilon = Some(validate_epsilon(epsilon)?);
        Ok(self)
    }

    /// The step in effect for the next call.
    pub fn epsilon(&self) -> f64 {
        self.epsilon.unwrap_or_else(default_epsilon)
    }
}

impl DiffFunction for FiniteDifference {
    fn name(&self) -> &str {
        &self.name
    }

    fn call_with(&self, registry: &Registry, args: &[Value]) -> DiffResult<Value> {
        estimate(&self.name, &*self.func, registry, args, self.epsilon())
    }
}

impl fmt::Debug for FiniteDifference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FiniteDifference")
            .field("name", &self.name)
            .field("epsilon", &self.epsilon)
            .finish()
    }
}
