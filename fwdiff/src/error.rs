//! Error types for fwdiff.
//!
//! Every failure is a contract violation (an unregistered type, a
//! malformed wrapper, a failing user function) and surfaces immediately
//! to the caller of the differentiable function. Nothing is retried.
//!
//! A derivative that could not be computed is *not* an error: it is
//! carried through the derivative map as
//! [`Partial::NotImplemented`](crate::Partial::NotImplemented).

use thiserror::Error;

use crate::raw::RawKind;

/// Result alias used throughout the crate.
pub type DiffResult<T> = Result<T, DiffError>;

/// Errors raised while evaluating or differentiating a function.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DiffError {
    /// A differentiable value was requested for a raw kind with no
    /// registered variant.
    #[error("type {kind} not implemented as a differentiable object")]
    UnsupportedType {
        /// The unregistered kind.
        kind: RawKind,
    },

    /// A function's raw output is neither a registered kind nor a
    /// sequence of registered kinds.
    #[error("output of `{function}` ({kind}) not implemented as a differentiable object")]
    UnsupportedOutputType {
        /// Function that produced the output.
        function: String,
        /// The kind that could not be wrapped.
        kind: RawKind,
    },

    /// A number was required but a value of another kind was found.
    #[error("expected a number, found {kind}")]
    NotNumeric {
        /// The kind found instead.
        kind: RawKind,
    },

    /// A per-argument derivative did not line up with a sequence output.
    #[error("derivative of `{function}` has {found} components, expected {expected}")]
    DerivativeShape {
        /// Function whose derivative was malformed.
        function: String,
        /// Number of output elements.
        expected: usize,
        /// Number of derivative components.
        found: usize,
    },

    /// A function read an argument position the caller did not supply.
    #[error("`{function}` is missing argument {index}")]
    MissingArgument {
        /// Function that read the argument.
        function: String,
        /// Position requested.
        index: usize,
    },

    /// An operator table has no entry under this name.
    #[error("unknown operator `{0}`")]
    UnknownOperator(String),

    /// Finite-difference step must be finite and positive.
    #[error("invalid finite-difference epsilon {0}")]
    InvalidEpsilon(f64),

    /// Raised by a wrapped function; propagated unchanged.
    #[error("`{function}` failed: {reason}")]
    Evaluation {
        /// Failing function.
        function: String,
        /// Its explanation.
        reason: String,
    },
}

impl DiffError {
    /// Convenience constructor for user functions that need to fail.
    pub fn evaluation(function: impl Into<String>, reason: impl Into<String>) -> Self {
        DiffError::Evaluation {
            function: function.into(),
            reason: reason.into(),
        }
    }
}
