//! Partial-derivative magnitudes.
//!
//! A [`Partial`] is either a known number or the explicit
//! "not implemented" marker produced when no derivative function was
//! supplied for an argument. The marker is absorbing: any sum or
//! product involving it is itself `NotImplemented`, so a consumer can
//! always tell "this derivative is zero" apart from "this derivative
//! could not be computed".

use std::fmt;
use std::ops::{Add, Mul, Neg};

use algebra_core::{CommutativeMonoid, Monoid, Semigroup};
use num_traits::{One, Zero};

/// A partial derivative.
///
/// # Examples
///
/// ```
/// use fwdiff::Partial;
///
/// let a = Partial::Known(2.0);
/// let b = Partial::Known(3.0);
/// assert_eq!(a + b, 5.0);
/// assert_eq!(a * b, 6.0);
///
/// // The marker absorbs arithmetic.
/// assert_eq!(a * Partial::NotImplemented, Partial::NotImplemented);
/// assert_eq!(Partial::NotImplemented + b, Partial::NotImplemented);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Partial {
    /// A computed derivative.
    Known(f64),
    /// No derivative function was available.
    NotImplemented,
}

impl Partial {
    /// The numeric value, if known.
    pub fn value(self) -> Option<f64> {
        match self {
            Partial::Known(v) => Some(v),
            Partial::NotImplemented => None,
        }
    }

    /// `true` unless this is the not-implemented marker.
    pub fn is_known(self) -> bool {
        matches!(self, Partial::Known(_))
    }

    /// Apply `f` to a known value; the marker passes through.
    pub fn map(self, f: impl FnOnce(f64) -> f64) -> Self {
        match self {
            Partial::Known(v) => Partial::Known(f(v)),
            Partial::NotImplemented => Partial::NotImplemented,
        }
    }
}

impl From<f64> for Partial {
    fn from(v: f64) -> Self {
        Partial::Known(v)
    }
}

impl PartialEq<f64> for Partial {
    fn eq(&self, other: &f64) -> bool {
        matches!(self, Partial::Known(v) if v == other)
    }
}

impl fmt::Display for Partial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partial::Known(v) => write!(f, "{v}"),
            Partial::NotImplemented => f.write_str("NotImplemented"),
        }
    }
}

impl Add for Partial {
    type Output = Partial;

    fn add(self, rhs: Partial) -> Partial {
        match (self, rhs) {
            (Partial::Known(a), Partial::Known(b)) => Partial::Known(a + b),
            _ => Partial::NotImplemented,
        }
    }
}

impl Mul for Partial {
    type Output = Partial;

    fn mul(self, rhs: Partial) -> Partial {
        match (self, rhs) {
            (Partial::Known(a), Partial::Known(b)) => Partial::Known(a * b),
            _ => Partial::NotImplemented,
        }
    }
}

impl Neg for Partial {
    type Output = Partial;

    fn neg(self) -> Partial {
        self.map(|v| -v)
    }
}

impl Zero for Partial {
    fn zero() -> Self {
        Partial::Known(0.0)
    }

    fn is_zero(&self) -> bool {
        *self == 0.0
    }
}

impl One for Partial {
    fn one() -> Self {
        Partial::Known(1.0)
    }
}

// Partials accumulate by addition.
impl Semigroup for Partial {
    fn combine(&self, other: &Self) -> Self {
        *self + *other
    }
}

impl Monoid for Partial {
    fn empty() -> Self {
        Partial::zero()
    }
}

impl CommutativeMonoid for Partial {}
