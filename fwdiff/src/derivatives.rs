//! Derivative-map algebra.
//!
//! A [`DerivativeMap`] records, for every variable a value depends on,
//! the partial derivative of that value with respect to it. A missing
//! key means a zero derivative. Maps add key by key, which is how
//! contributions from several arguments (or from the same variable
//! passed twice) are accumulated.

use algebra_core::{Monoid, SumMap};

use crate::partial::Partial;
use crate::var::VarId;

/// Sparse map from variable to partial derivative.
pub type DerivativeMap = SumMap<VarId, Partial>;

/// Sum any number of derivative maps.
///
/// For each key present in any input the result holds the sum of all
/// inputs' values for that key. Associative and commutative; zero maps
/// produce an empty map.
///
/// ```
/// use fwdiff::{sum_dicts, DerivativeMap, Partial, VarId};
///
/// let (a, b) = (VarId::fresh(), VarId::fresh());
///
/// let one: DerivativeMap = [(a, Partial::Known(1.0))].into_iter().collect();
/// let two: DerivativeMap = [(a, Partial::Known(2.0)), (b, Partial::Known(3.0))]
///     .into_iter()
///     .collect();
///
/// let sum = sum_dicts([one, two]);
/// assert_eq!(sum.get_or_empty(&a), 3.0);
/// assert_eq!(sum.get_or_empty(&b), 3.0);
///
/// assert!(sum_dicts(Vec::new()).is_empty());
/// ```
pub fn sum_dicts<I>(maps: I) -> DerivativeMap
where
    I: IntoIterator<Item = DerivativeMap>,
{
    DerivativeMap::concat(maps)
}

/// Scale every entry of `map` by `outer`: one step of the chain rule.
///
/// Shared by every variant's `chain` implementation.
pub fn scale(map: &DerivativeMap, outer: Partial) -> DerivativeMap {
    map.map_values(|d| outer * *d)
}
