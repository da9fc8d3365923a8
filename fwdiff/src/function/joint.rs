use std::fmt;
use std::sync::Arc;

use crate::config::default_epsilon;
use crate::error::DiffResult;
use crate::raw::Raw;
use crate::registry::{self, Registry};
use crate::value::Value;

use super::{
    any_differentiable, assemble, chain_local, diff_args, finite, output_shape, raw_args,
    trace_dispatch, DiffFunction,
};

/// Value and per-argument partials, as returned by a joint function.
///
/// Entry `i` of the partials is `∂out/∂arg_i`, or `None` if it was not
/// computed. A `None` (or a short vector) for a differentiable argument
/// becomes [`Partial::NotImplemented`](crate::Partial::NotImplemented).
pub type JointOutput = (Raw, Vec<Option<Raw>>);

/// A function that computes its value and partials in one call.
pub type JointFn = dyn Fn(&[Raw], Option<&[bool]>) -> DiffResult<JointOutput> + Send + Sync;

/// A function whose derivatives share work with its value.
///
/// When `request_derivatives` is set the function receives a mask
/// marking which arguments are differentiable, so it can skip partials
/// nobody will read. Otherwise it receives `None` and should compute
/// them all.
///
/// # Examples
///
/// ```
/// use fwdiff::{number_arg, DiffFunction, Joint, Raw, Value};
///
/// // hypot(x, y) shares r between value and both partials.
/// let hypot = Joint::new("hypot", |a, mask| {
///     let (x, y) = (number_arg("hypot", a, 0)?, number_arg("hypot", a, 1)?);
///     let r = x.hypot(y);
///     let wants = |i: usize| mask.map_or(true, |m| m[i]);
///     let dx = wants(0).then(|| Raw::Float(x / r));
///     let dy = wants(1).then(|| Raw::Float(y / r));
///     Ok((Raw::Float(r), vec![dx, dy]))
/// }, true);
///
/// let x = Value::variable(3.0).unwrap();
/// let h = hypot.call(&[x.clone(), Value::from(4.0)]).unwrap();
/// assert_eq!(h.raw(), Raw::Float(5.0));
/// assert_eq!(h.derivative(x.var_id().unwrap()), 0.6);
/// ```
#[derive(Clone)]
pub struct Joint {
    name: String,
    func: Arc<JointFn>,
    request_derivatives: bool,
}

impl Joint {
    /// Wrap `func`. With `request_derivatives` it receives the
    /// differentiable-argument mask.
    pub fn new<F>(name: impl Into<String>, func: F, request_derivatives: bool) -> Self
    where
        F: Fn(&[Raw], Option<&[bool]>) -> DiffResult<JointOutput> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Arc::new(func),
            request_derivatives,
        }
    }

    /// Whether the mask is passed to the function.
    pub fn requests_derivatives(&self) -> bool {
        self.request_derivatives
    }

    /// Evaluate with forward-difference estimates; only the value half
    /// of the joint function is used, with no partials requested.
    pub fn finite_differences(&self, args: &[Value]) -> DiffResult<Value> {
        self.finite_differences_with(&registry::global(), args, default_epsilon())
    }

    /// As [`Joint::finite_differences`], with an explicit registry and
    /// step.
    pub fn finite_differences_with(
        &self,
        registry: &Registry,
        args: &[Value],
        epsilon: f64,
    ) -> DiffResult<Value> {
        let value_only = |raw: &[Raw]| -> DiffResult<Raw> {
            let none = vec![false; raw.len()];
            let mask = self.request_derivatives.then_some(none.as_slice());
            (self.func)(raw, mask).map(|(out, _)| out)
        };
        finite::estimate(&self.name, &value_only, registry, args, epsilon)
    }
}

impl DiffFunction for Joint {
    fn name(&self) -> &str {
        &self.name
    }

    fn call_with(&self, registry: &Registry, args: &[Value]) -> DiffResult<Value> {
        let mask: Vec<bool> = args.iter().map(Value::is_differentiable).collect();
        let raw = raw_args(args);
        let request = self.request_derivatives.then_some(mask.as_slice());
        let (out, partials) = (self.func)(&raw, request)?;
        if !any_differentiable(args) {
            return Ok(Value::Raw(out));
        }
        trace_dispatch("joint", &self.name, args);

        let shape = output_shape(registry, &self.name, &out)?;
        let contributions = diff_args(args)
            .map(|(i, arg)| {
                let local = partials.get(i).and_then(Option::as_ref);
                chain_local(&self.name, arg, local, shape)
            })
            .collect::<DiffResult<Vec<_>>>()?;
        assemble(registry, &self.name, out, shape, contributions)
    }
}

impl fmt::Debug for Joint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Joint")
            .field("name", &self.name)
            .field("request_derivatives", &self.request_derivatives)
            .finish()
    }
}
