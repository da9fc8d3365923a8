//! The scalar differentiable variant.

use std::cmp::Ordering;
use std::fmt;

use num_traits::One;

use crate::derivatives::{scale, DerivativeMap};
use crate::error::{DiffError, DiffResult};
use crate::partial::Partial;
use crate::raw::Raw;
use crate::value::{DiffValue, Differentiable};
use crate::var::VarId;

/// A floating-point value carrying its partial derivatives.
///
/// Created with [`DiffFloat::variable`] it is a fresh independent
/// variable, seeded with `∂self/∂self = 1`. Created with
/// [`DiffFloat::derived`] the supplied map is authoritative and the
/// value is not seeded with respect to itself (see [`DiffFloat::track`]).
///
/// Comparison acts on the raw value only; identity is the [`VarId`].
///
/// ```
/// use fwdiff::{DiffFloat, Differentiable};
///
/// let x = DiffFloat::variable(2.0);
/// let y = DiffFloat::variable(2.0);
///
/// assert_eq!(x.derivative(x.id()), 1.0);
/// assert_eq!(x.derivative(y.id()), 0.0);
/// assert_eq!(x, y); // equal values, distinct variables
/// assert_ne!(x.id(), y.id());
/// ```
#[derive(Debug, Clone)]
pub struct DiffFloat {
    id: VarId,
    value: f64,
    name: Option<String>,
    derivatives: DerivativeMap,
}

impl DiffFloat {
    /// A new independent variable.
    pub fn variable(value: f64) -> Self {
        let id = VarId::fresh();
        Self {
            id,
            value,
            name: None,
            derivatives: DerivativeMap::singleton(id, Partial::one()),
        }
    }

    /// A new independent variable with a display name.
    pub fn named(value: f64, name: impl Into<String>) -> Self {
        Self::variable(value).with_name(name)
    }

    /// A value whose sensitivities are given by `derivatives`.
    pub fn derived(value: f64, derivatives: DerivativeMap) -> Self {
        Self {
            id: VarId::fresh(),
            value,
            name: None,
            derivatives,
        }
    }

    /// Registry constructor for numeric raw kinds.
    ///
    /// `None` seeds a fresh variable; `Some(map)` builds a derived value.
    /// Non-numeric input fails with `UnsupportedType`.
    pub fn construct(raw: Raw, derivatives: Option<DerivativeMap>) -> DiffResult<DiffValue> {
        let value = raw
            .as_f64()
            .map_err(|_| DiffError::UnsupportedType { kind: raw.kind() })?;
        let scalar = match derivatives {
            Some(d) => Self::derived(value, d),
            None => Self::variable(value),
        };
        Ok(DiffValue::Scalar(scalar))
    }

    /// Attach a display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The raw value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// The display name, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Start tracking this value as a variable in its own right.
    ///
    /// Sets `∂self/∂self` to `d_self` (default `1`). Off by default for
    /// derived values.
    ///
    /// ```
    /// use fwdiff::{DiffFloat, DerivativeMap, Differentiable};
    ///
    /// let mut c = DiffFloat::derived(4.0, DerivativeMap::new());
    /// assert_eq!(c.derivative(c.id()), 0.0);
    ///
    /// c.track(None);
    /// assert_eq!(c.derivative(c.id()), 1.0);
    /// ```
    pub fn track(&mut self, d_self: Option<f64>) {
        let seed = d_self.map_or_else(Partial::one, Partial::Known);
        self.derivatives.insert(self.id, seed);
    }

    /// `name(value)` if named, else `dfloat(value)`.
    pub fn repr(&self) -> String {
        match &self.name {
            Some(name) => format!("{name}({:?})", self.value),
            None => format!("dfloat({:?})", self.value),
        }
    }

    /// Truthiness of the raw value.
    pub fn is_nonzero(&self) -> bool {
        self.value != 0.0
    }

    /// Complex conjugate; the identity on reals.
    pub fn conjugate(&self) -> Self {
        Self::derived(self.value, self.derivatives.clone())
    }

    /// Real part; the identity on reals.
    pub fn real(&self) -> Self {
        Self::derived(self.value, self.derivatives.clone())
    }

    /// Imaginary part: zero, with zero sensitivity to every tracked
    /// variable.
    pub fn imag(&self) -> Self {
        let zeros = self.derivatives.map_values(|d| d.map(|_| 0.0));
        Self::derived(0.0, zeros)
    }
}

impl Differentiable for DiffFloat {
    fn id(&self) -> VarId {
        self.id
    }

    fn raw(&self) -> Raw {
        Raw::Float(self.value)
    }

    fn derivatives(&self) -> &DerivativeMap {
        &self.derivatives
    }

    fn chain(&self, outer: Partial) -> DerivativeMap {
        scale(&self.derivatives, outer)
    }

    fn delta(&self, epsilon: f64) -> Vec<Raw> {
        vec![Raw::Float(self.value + epsilon)]
    }

    fn chain_from_delta(
        &self,
        base: &Raw,
        perturbed: &[Raw],
        epsilon: f64,
    ) -> DiffResult<DerivativeMap> {
        let shifted = match perturbed.first() {
            Some(r) => r.as_f64()?,
            None => return Ok(self.chain(Partial::NotImplemented)),
        };
        let slope = (shifted - base.as_f64()?) / epsilon;
        Ok(self.chain(Partial::Known(slope)))
    }
}

impl PartialEq for DiffFloat {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl PartialOrd for DiffFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl fmt::Display for DiffFloat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn variable_is_seeded_with_itself() {
        let x = DiffFloat::variable(3.0);
        assert_eq!(x.derivatives().len(), 1);
        assert_eq!(x.derivative(x.id()), 1.0);
    }

    #[test]
    fn derived_value_is_not_self_seeded() {
        let x = DiffFloat::variable(3.0);
        let y = DiffFloat::derived(9.0, x.chain(Partial::Known(6.0)));
        assert_eq!(y.derivative(y.id()), 0.0);
        assert_eq!(y.derivative(x.id()), 6.0);
    }

    #[test]
    fn track_accepts_custom_seed() {
        let mut y = DiffFloat::derived(1.0, DerivativeMap::new());
        y.track(Some(2.5));
        assert_eq!(y.derivative(y.id()), 2.5);
    }

    #[test]
    fn chain_multiplies_every_partial() {
        let x = DiffFloat::variable(1.0);
        let z = DiffFloat::variable(1.0);
        let mut m = x.chain(Partial::Known(2.0));
        m.accumulate(z.id(), Partial::Known(5.0));
        let y = DiffFloat::derived(0.0, m);

        let out = y.chain(Partial::Known(-3.0));
        assert_eq!(out.get_or_empty(&x.id()), -6.0);
        assert_eq!(out.get_or_empty(&z.id()), -15.0);
    }

    #[test]
    fn chain_from_delta_is_forward_difference() {
        let x = DiffFloat::variable(2.0);
        let eps = 1e-6;
        let shifted = x.delta(eps);
        // f(t) = t², evaluated at 2 + eps
        let base = Raw::Float(4.0);
        let at_shifted = Raw::Float(shifted[0].as_f64().unwrap().powi(2));
        let d = x.chain_from_delta(&base, &[at_shifted], eps).unwrap();
        assert_relative_eq!(d.get_or_empty(&x.id()).value().unwrap(), 4.0, epsilon = 1e-4);
    }

    #[test]
    fn construct_rejects_non_numbers() {
        let err = DiffFloat::construct(Raw::Bool(true), None).unwrap_err();
        assert_eq!(
            err,
            DiffError::UnsupportedType {
                kind: crate::raw::RawKind::Bool
            }
        );
    }

    #[test]
    fn repr_uses_name() {
        assert_eq!(DiffFloat::named(2.0, "a").repr(), "a(2.0)");
        assert_eq!(DiffFloat::variable(0.5).repr(), "dfloat(0.5)");
        assert_eq!(DiffFloat::variable(0.5).to_string(), "0.5");
    }

    #[test]
    fn imag_part_has_zero_sensitivity() {
        let x = DiffFloat::variable(7.0);
        let im = x.imag();
        assert_eq!(im.value(), 0.0);
        assert_eq!(im.derivative(x.id()), 0.0);
        assert!(!im.is_nonzero());
        assert_eq!(x.conjugate().derivative(x.id()), 1.0);
        assert_eq!(x.real().value(), 7.0);
    }
}
