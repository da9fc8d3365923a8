//! Differentiable values and the values that flow through dispatch.

use std::fmt;

use num_traits::Zero;

use crate::derivatives::DerivativeMap;
use crate::error::DiffResult;
use crate::partial::Partial;
use crate::raw::{Raw, SeqKind};
use crate::registry;
use crate::scalar::DiffFloat;
use crate::var::VarId;

/// Behaviour every differentiable variant provides.
///
/// `chain` is the primitive everything else is built from: the
/// sensitivity of a downstream quantity to `v` is the sensitivity of
/// the downstream quantity to `self`, times the sensitivity of `self`
/// to `v`.
pub trait Differentiable {
    /// This value's own identity.
    fn id(&self) -> VarId;

    /// The raw value, without derivative information.
    fn raw(&self) -> Raw;

    /// All recorded partial derivatives.
    fn derivatives(&self) -> &DerivativeMap;

    /// `∂self/∂wrt`; zero for an untracked variable. Never fails.
    fn derivative(&self, wrt: VarId) -> Partial {
        self.derivatives()
            .get(&wrt)
            .copied()
            .unwrap_or_else(Partial::zero)
    }

    /// `{ v: outer · d | (v, d) in self.derivatives() }`.
    fn chain(&self, outer: Partial) -> DerivativeMap;

    /// Perturbed raw values at which to evaluate a function numerically.
    fn delta(&self, epsilon: f64) -> Vec<Raw>;

    /// Chain the forward-difference quotient of a function evaluated at
    /// `self.delta(epsilon)` (giving `perturbed`) and at the raw value
    /// (giving `base`).
    fn chain_from_delta(
        &self,
        base: &Raw,
        perturbed: &[Raw],
        epsilon: f64,
    ) -> DiffResult<DerivativeMap>;
}

/// A raw value together with its derivative map, tagged by variant.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq)]
pub enum DiffValue {
    /// A floating-point scalar.
    Scalar(DiffFloat),
}

impl DiffValue {
    /// The scalar variant, if this is one.
    pub fn as_scalar(&self) -> Option<&DiffFloat> {
        match self {
            DiffValue::Scalar(x) => Some(x),
        }
    }

    /// The display name, if any.
    pub fn name(&self) -> Option<&str> {
        match self {
            DiffValue::Scalar(x) => x.name(),
        }
    }

    /// Attach a display name.
    pub fn with_name(self, name: impl Into<String>) -> Self {
        match self {
            DiffValue::Scalar(x) => DiffValue::Scalar(x.with_name(name)),
        }
    }

    /// See [`DiffFloat::track`].
    pub fn track(&mut self, d_self: Option<f64>) {
        match self {
            DiffValue::Scalar(x) => x.track(d_self),
        }
    }
}

impl Differentiable for DiffValue {
    fn id(&self) -> VarId {
        match self {
            DiffValue::Scalar(x) => x.id(),
        }
    }

    fn raw(&self) -> Raw {
        match self {
            DiffValue::Scalar(x) => x.raw(),
        }
    }

    fn derivatives(&self) -> &DerivativeMap {
        match self {
            DiffValue::Scalar(x) => x.derivatives(),
        }
    }

    fn chain(&self, outer: Partial) -> DerivativeMap {
        match self {
            DiffValue::Scalar(x) => x.chain(outer),
        }
    }

    fn delta(&self, epsilon: f64) -> Vec<Raw> {
        match self {
            DiffValue::Scalar(x) => x.delta(epsilon),
        }
    }

    fn chain_from_delta(
        &self,
        base: &Raw,
        perturbed: &[Raw],
        epsilon: f64,
    ) -> DiffResult<DerivativeMap> {
        match self {
            DiffValue::Scalar(x) => x.chain_from_delta(base, perturbed, epsilon),
        }
    }
}

impl fmt::Display for DiffValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiffValue::Scalar(x) => fmt::Display::fmt(x, f),
        }
    }
}

impl From<DiffFloat> for DiffValue {
    fn from(x: DiffFloat) -> Self {
        DiffValue::Scalar(x)
    }
}

/// An argument to, or result of, a differentiable function.
///
/// Only [`Value::Diff`] counts as a differentiable argument. A
/// [`Value::Seq`] argument is stripped to its raw elements and treated
/// as a constant; sequences of differentiable values are produced by
/// functions whose output is a sequence.
///
/// ```
/// use fwdiff::Value;
///
/// let x = Value::variable(2.0).unwrap();
/// let y = x.mul(&x).unwrap();
///
/// assert_eq!(y.raw().as_f64().unwrap(), 4.0);
/// assert_eq!(y.derivative(x.var_id().unwrap()), 4.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// A constant.
    Raw(Raw),
    /// A tracked value.
    Diff(DiffValue),
    /// A container, usually the output of a sequence-valued function.
    Seq(SeqKind, Vec<Value>),
}

impl Value {
    /// A fresh independent variable, or a container of fresh variables
    /// if `raw` is a sequence. Uses the process-wide registry.
    pub fn variable(raw: impl Into<Raw>) -> DiffResult<Value> {
        registry::global().variables(raw.into())
    }

    /// Strip all derivative information.
    pub fn raw(&self) -> Raw {
        match self {
            Value::Raw(r) => r.clone(),
            Value::Diff(d) => d.raw(),
            Value::Seq(kind, items) => Raw::Seq(*kind, items.iter().map(Value::raw).collect()),
        }
    }

    /// `true` only for [`Value::Diff`].
    pub fn is_differentiable(&self) -> bool {
        matches!(self, Value::Diff(_))
    }

    /// The differentiable value, if any.
    pub fn as_diff(&self) -> Option<&DiffValue> {
        match self {
            Value::Diff(d) => Some(d),
            _ => None,
        }
    }

    /// Identity of a differentiable value.
    pub fn var_id(&self) -> Option<VarId> {
        self.as_diff().map(Differentiable::id)
    }

    /// The elements of a container.
    pub fn items(&self) -> Option<&[Value]> {
        match self {
            Value::Seq(_, items) => Some(items),
            _ => None,
        }
    }

    /// `∂self/∂wrt`.
    ///
    /// A raw value is a constant (zero). A sequence has no single
    /// derivative and answers `NotImplemented`; ask its items instead.
    pub fn derivative(&self, wrt: VarId) -> Partial {
        match self {
            Value::Raw(_) => Partial::zero(),
            Value::Diff(d) => d.derivative(wrt),
            Value::Seq(..) => Partial::NotImplemented,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Diff(d) => fmt::Display::fmt(d, f),
            other => fmt::Display::fmt(&other.raw(), f),
        }
    }
}

impl From<Raw> for Value {
    fn from(r: Raw) -> Self {
        Value::Raw(r)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Raw(Raw::Float(x))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Raw(Raw::Int(i))
    }
}

impl From<DiffValue> for Value {
    fn from(d: DiffValue) -> Self {
        Value::Diff(d)
    }
}

impl From<DiffFloat> for Value {
    fn from(x: DiffFloat) -> Self {
        Value::Diff(DiffValue::Scalar(x))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_strips_nested_sequences() {
        let x = DiffFloat::variable(1.5);
        let v = Value::Seq(SeqKind::Tuple, vec![x.into(), Value::from(2_i64)]);
        assert_eq!(v.raw(), Raw::tuple([Raw::Float(1.5), Raw::Int(2)]));
        assert!(!v.is_differentiable());
    }

    #[test]
    fn plain_values_are_constants() {
        let c = Value::from(3.0);
        assert_eq!(c.derivative(VarId::fresh()), 0.0);
        assert_eq!(c.var_id(), None);
    }

    #[test]
    fn variable_from_sequence_gives_independent_items() {
        let v = Value::variable(vec![1.0, 2.0]).unwrap();
        let items = v.items().unwrap();
        let (a, b) = (items[0].var_id().unwrap(), items[1].var_id().unwrap());
        assert_ne!(a, b);
        assert_eq!(items[0].derivative(a), 1.0);
        assert_eq!(items[0].derivative(b), 0.0);
        assert_eq!(v.derivative(a), Partial::NotImplemented);
    }

    #[test]
    fn diff_value_delegates_to_variant() {
        let mut d = DiffValue::from(DiffFloat::derived(5.0, DerivativeMap::new())).with_name("k");
        assert_eq!(d.name(), Some("k"));
        d.track(None);
        assert_eq!(d.derivative(d.id()), 1.0);
        assert_eq!(d.as_scalar().map(DiffFloat::value), Some(5.0));
    }
}
