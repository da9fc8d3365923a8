//! Raw (undifferentiated) values.
//!
//! [`Raw`] is the closed set of value kinds a wrapped function can
//! consume or produce. The registry is keyed by [`RawKind`], the tag of
//! a raw value.

use std::fmt;

use num_traits::ToPrimitive;

use crate::error::{DiffError, DiffResult};

/// The container flavour of a sequence value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeqKind {
    /// A growable list.
    List,
    /// A fixed tuple.
    Tuple,
}

impl SeqKind {
    /// The raw kind of a sequence of this flavour.
    pub fn kind(self) -> RawKind {
        match self {
            SeqKind::List => RawKind::List,
            SeqKind::Tuple => RawKind::Tuple,
        }
    }
}

/// The tag of a [`Raw`] value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RawKind {
    /// [`Raw::Float`].
    Float,
    /// [`Raw::Int`].
    Int,
    /// [`Raw::Bool`].
    Bool,
    /// A list sequence.
    List,
    /// A tuple sequence.
    Tuple,
}

impl fmt::Display for RawKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RawKind::Float => "float",
            RawKind::Int => "int",
            RawKind::Bool => "bool",
            RawKind::List => "list",
            RawKind::Tuple => "tuple",
        };
        f.write_str(name)
    }
}

/// A plain value with no derivative information.
///
/// ```
/// use fwdiff::{Raw, RawKind};
///
/// let x = Raw::from(2.5);
/// assert_eq!(x.kind(), RawKind::Float);
/// assert_eq!(x.as_f64().unwrap(), 2.5);
///
/// let v = Raw::from(vec![1.0, 2.0]);
/// assert_eq!(v.kind(), RawKind::List);
/// assert_eq!(v.items().map(|xs| xs.len()), Some(2));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Raw {
    /// A double-precision float.
    Float(f64),
    /// A signed integer.
    Int(i64),
    /// A boolean; not numeric.
    Bool(bool),
    /// A list or tuple of raw values.
    Seq(SeqKind, Vec<Raw>),
}

impl Raw {
    /// Build a tuple.
    pub fn tuple(items: impl IntoIterator<Item = Raw>) -> Self {
        Raw::Seq(SeqKind::Tuple, items.into_iter().collect())
    }

    /// Build a list.
    pub fn list(items: impl IntoIterator<Item = Raw>) -> Self {
        Raw::Seq(SeqKind::List, items.into_iter().collect())
    }

    /// The kind tag of this value.
    pub fn kind(&self) -> RawKind {
        match self {
            Raw::Float(_) => RawKind::Float,
            Raw::Int(_) => RawKind::Int,
            Raw::Bool(_) => RawKind::Bool,
            Raw::Seq(kind, _) => kind.kind(),
        }
    }

    /// Numeric view of a float or integer.
    pub fn as_f64(&self) -> DiffResult<f64> {
        let n = match self {
            Raw::Float(x) => Some(*x),
            Raw::Int(i) => i.to_f64(),
            _ => None,
        };
        n.ok_or(DiffError::NotNumeric { kind: self.kind() })
    }

    /// Boolean view; only `Bool` qualifies.
    pub fn as_bool(&self) -> DiffResult<bool> {
        match self {
            Raw::Bool(b) => Ok(*b),
            _ => Err(DiffError::NotNumeric { kind: self.kind() }),
        }
    }

    /// The elements of a sequence.
    pub fn items(&self) -> Option<&[Raw]> {
        match self {
            Raw::Seq(_, items) => Some(items),
            _ => None,
        }
    }
}

impl fmt::Display for Raw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Raw::Float(x) => write!(f, "{x}"),
            Raw::Int(i) => write!(f, "{i}"),
            Raw::Bool(b) => write!(f, "{b}"),
            Raw::Seq(kind, items) => {
                let (open, close) = match kind {
                    SeqKind::List => ('[', ']'),
                    SeqKind::Tuple => ('(', ')'),
                };
                write!(f, "{open}")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "{close}")
            }
        }
    }
}

impl From<f64> for Raw {
    fn from(x: f64) -> Self {
        Raw::Float(x)
    }
}

impl From<i64> for Raw {
    fn from(i: i64) -> Self {
        Raw::Int(i)
    }
}

impl From<bool> for Raw {
    fn from(b: bool) -> Self {
        Raw::Bool(b)
    }
}

impl From<Vec<f64>> for Raw {
    fn from(xs: Vec<f64>) -> Self {
        Raw::list(xs.into_iter().map(Raw::Float))
    }
}

impl From<Vec<Raw>> for Raw {
    fn from(xs: Vec<Raw>) -> Self {
        Raw::Seq(SeqKind::List, xs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_read_as_numbers() {
        assert_eq!(Raw::Int(3).as_f64(), Ok(3.0));
    }

    #[test]
    fn bools_are_not_numbers() {
        assert_eq!(
            Raw::Bool(true).as_f64(),
            Err(DiffError::NotNumeric {
                kind: RawKind::Bool
            })
        );
    }

    #[test]
    fn display_nests_sequences() {
        let r = Raw::tuple([Raw::Float(1.5), Raw::list([Raw::Int(2)])]);
        assert_eq!(r.to_string(), "(1.5, [2])");
        assert_eq!(r.kind(), RawKind::Tuple);
    }
}
