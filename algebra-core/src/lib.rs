#![deny(missing_docs)]
//! # algebra-core: additive algebra for sparse accumulation
//!
//! This crate provides the small set of algebraic structures that
//! forward-mode differentiation needs to accumulate contributions:
//!
//! - [`Semigroup`]: associative binary operation
//! - [`Monoid`]: semigroup with identity element
//! - [`CommutativeMonoid`]: monoid whose operation is order-independent
//! - [`SumMap`]: a sparse map whose values form a monoid, combined
//!   key by key
//!
//! ## Quick start
//!
//! ```rust
//! use algebra_core::{Monoid, Semigroup, SumMap};
//!
//! #[derive(Clone, Copy, Debug, PartialEq)]
//! struct Total(f64);
//!
//! impl Semigroup for Total {
//!     fn combine(&self, other: &Self) -> Self {
//!         Total(self.0 + other.0)
//!     }
//! }
//!
//! impl Monoid for Total {
//!     fn empty() -> Self {
//!         Total(0.0)
//!     }
//! }
//!
//! let a: SumMap<&str, Total> = [("x", Total(1.0))].into_iter().collect();
//! let b: SumMap<&str, Total> = [("x", Total(2.0)), ("y", Total(3.0))].into_iter().collect();
//!
//! let sum = SumMap::concat([a, b]);
//! assert_eq!(sum.get(&"x"), Some(&Total(3.0)));
//! assert_eq!(sum.get(&"y"), Some(&Total(3.0)));
//! ```
//!
//! Absent keys behave as the identity element, so combining maps never
//! needs to special-case a key that only one side knows about.

pub mod sum_map;

pub use sum_map::SumMap;

/// A **semigroup**: a type with an associative binary operation.
///
/// Laws (not enforced by type system):
///
/// - **Associative**:
///   `a.combine(b).combine(c) == a.combine(b.combine(c))`
///
/// # Example
///
/// ```rust
/// use algebra_core::Semigroup;
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// struct Longest(usize);
///
/// impl Semigroup for Longest {
///     fn combine(&self, other: &Self) -> Self {
///         Longest(self.0.max(other.0))
///     }
/// }
///
/// let a = Longest(3);
/// let b = Longest(7);
/// let c = Longest(5);
/// assert_eq!(a.combine(&b).combine(&c), a.combine(&b.combine(&c)));
/// ```
pub trait Semigroup: Sized {
    /// Combine two elements associatively.
    fn combine(&self, other: &Self) -> Self;

    /// In-place combine.
    fn combine_assign(&mut self, other: &Self) {
        *self = self.combine(other);
    }
}

/// A **monoid**: a semigroup with an identity element.
///
/// Laws (not enforced by type system):
///
/// - **Associative**:
///   `a.combine(b).combine(c) == a.combine(b.combine(c))`
/// - **Left identity**: `empty().combine(a) == a`
/// - **Right identity**: `a.combine(empty()) == a`
///
/// # Example
///
/// ```rust
/// use algebra_core::{Monoid, Semigroup};
///
/// #[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// struct Count(u32);
///
/// impl Semigroup for Count {
///     fn combine(&self, other: &Self) -> Self {
///         Count(self.0 + other.0)
///     }
/// }
///
/// impl Monoid for Count {
///     fn empty() -> Self {
///         Count(0)
///     }
/// }
///
/// assert_eq!(Count::concat([Count(1), Count(2), Count(4)]), Count(7));
/// assert_eq!(Count::concat(Vec::new()), Count::empty());
/// ```
pub trait Monoid: Semigroup {
    /// The identity element.
    fn empty() -> Self;

    /// Fold an iterator using combine, starting from empty.
    ///
    /// An empty iterator produces [`Monoid::empty`].
    fn concat<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = Self>,
    {
        iter.into_iter().fold(Self::empty(), |mut acc, x| {
            acc.combine_assign(&x);
            acc
        })
    }

    /// Returns `true` if this is the identity element.
    fn is_empty_element(&self) -> bool
    where
        Self: PartialEq,
    {
        *self == Self::empty()
    }
}

/// A **commutative monoid**: a monoid where combine is commutative.
///
/// Laws (not enforced by type system):
///
/// - **Associative**:
///   `a.combine(b).combine(c) == a.combine(b.combine(c))`
/// - **Commutative**: `a.combine(b) == b.combine(a)`
/// - **Identity**: `a.combine(empty()) == a == empty().combine(a)`
///
/// Summing contributions in a [`SumMap`] is only order-independent
/// when the value type is commutative.
pub trait CommutativeMonoid: Monoid {
    // Marker trait - laws are documented above
}
