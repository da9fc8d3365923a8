//! Raw kind → differentiable variant.
//!
//! The registry is the single place that decides which variant
//! represents a raw kind. Dispatch never names a concrete variant; it
//! asks the registry to build one.
//!
//! A process-wide registry is initialised on first use with the scalar
//! variant registered for [`RawKind::Float`]. Registration is meant to
//! happen once at start-up; concurrent registration from several
//! threads is not supported. Callers that want full control can build
//! their own [`Registry`] and pass it to `call_with`.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use once_cell::sync::Lazy;
use tracing::{debug, warn};

use crate::derivatives::DerivativeMap;
use crate::error::{DiffError, DiffResult};
use crate::raw::{Raw, RawKind};
use crate::scalar::DiffFloat;
use crate::value::{DiffValue, Value};

/// Builds a variant from a raw value.
///
/// `None` means "make a fresh, self-seeded variable"; `Some(map)` means
/// "make a derived value with exactly these sensitivities".
pub type Constructor = fn(Raw, Option<DerivativeMap>) -> DiffResult<DiffValue>;

/// Mapping from raw kind to variant constructor.
///
/// ```
/// use fwdiff::{DiffFloat, Raw, RawKind, Registry};
///
/// let mut registry = Registry::with_defaults();
/// assert!(registry.construct(Raw::Int(3), None).is_err());
///
/// registry.register(RawKind::Int, DiffFloat::construct);
/// let x = registry.construct(Raw::Int(3), None).unwrap();
/// assert_eq!(x.to_string(), "3");
/// ```
#[derive(Clone, Default)]
pub struct Registry {
    constructors: HashMap<RawKind, Constructor>,
}

impl Registry {
    /// An empty registry; every construction fails.
    pub fn new() -> Self {
        Self::default()
    }

    /// The scalar variant registered for floats.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(RawKind::Float, DiffFloat::construct);
        registry
    }

    /// Add an entry. Last write wins.
    pub fn register(&mut self, kind: RawKind, constructor: Constructor) {
        if self.constructors.insert(kind, constructor).is_some() {
            warn!(%kind, "differentiable constructor replaced");
        } else {
            debug!(%kind, "differentiable constructor registered");
        }
    }

    /// `true` if `kind` has a constructor.
    pub fn contains(&self, kind: RawKind) -> bool {
        self.constructors.contains_key(&kind)
    }

    /// Build the registered variant for `raw`.
    pub fn construct(&self, raw: Raw, derivatives: Option<DerivativeMap>) -> DiffResult<DiffValue> {
        let kind = raw.kind();
        let constructor = self
            .constructors
            .get(&kind)
            .ok_or(DiffError::UnsupportedType { kind })?;
        constructor(raw, derivatives)
    }

    /// A fresh independent variable for `raw`, optionally named.
    pub fn new_variable(&self, raw: Raw, name: Option<&str>) -> DiffResult<DiffValue> {
        let var = self.construct(raw, None)?;
        Ok(match name {
            Some(name) => var.with_name(name),
            None => var,
        })
    }

    /// Like [`Registry::new_variable`], but a sequence becomes a
    /// container of fresh variables, one per element.
    pub fn variables(&self, raw: Raw) -> DiffResult<Value> {
        match raw {
            Raw::Seq(kind, items) if !self.contains(kind.kind()) => {
                let vars = items
                    .into_iter()
                    .map(|item| self.new_variable(item, None).map(Value::Diff))
                    .collect::<DiffResult<Vec<_>>>()?;
                Ok(Value::Seq(kind, vars))
            }
            other => self.new_variable(other, None).map(Value::Diff),
        }
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.constructors.keys()).finish()
    }
}

static GLOBAL: Lazy<RwLock<Arc<Registry>>> =
    Lazy::new(|| RwLock::new(Arc::new(Registry::with_defaults())));

/// A snapshot of the process-wide registry.
///
/// The lock is released before this returns, so wrapped functions may
/// call other wrapped functions freely.
pub fn global() -> Arc<Registry> {
    GLOBAL
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Register a constructor in the process-wide registry.
///
/// Intended for start-up only. Snapshots already taken by in-flight
/// calls keep the previous table.
pub fn register_type(kind: RawKind, constructor: Constructor) {
    let mut guard = GLOBAL.write().unwrap_or_else(PoisonError::into_inner);
    Arc::make_mut(&mut guard).register(kind, constructor);
}

/// A fresh independent variable built by the process-wide registry.
///
/// ```
/// use fwdiff::{new_variable, Differentiable};
///
/// let a = new_variable(2.0, Some("a")).unwrap();
/// assert_eq!(a.name(), Some("a"));
/// assert_eq!(a.derivative(a.id()), 1.0);
/// ```
pub fn new_variable(raw: impl Into<Raw>, name: Option<&str>) -> DiffResult<DiffValue> {
    global().new_variable(raw.into(), name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::partial::Partial;
    use crate::value::Differentiable;

    #[test]
    fn empty_registry_rejects_everything() {
        let registry = Registry::new();
        assert_eq!(
            registry.construct(Raw::Float(1.0), None).unwrap_err(),
            DiffError::UnsupportedType {
                kind: RawKind::Float
            }
        );
    }

    #[test]
    fn unregistered_kind_is_named_in_error() {
        let registry = Registry::with_defaults();
        let err = registry.construct(Raw::Int(1), None).unwrap_err();
        assert_eq!(err, DiffError::UnsupportedType { kind: RawKind::Int });
        assert_eq!(err.to_string(), "type int not implemented as a differentiable object");
    }

    #[test]
    fn construct_with_map_is_not_self_seeded() {
        let registry = Registry::with_defaults();
        let x = registry.construct(Raw::Float(2.0), None).unwrap();
        let y = registry
            .construct(Raw::Float(4.0), Some(x.chain(Partial::Known(4.0))))
            .unwrap();
        assert_eq!(y.derivative(y.id()), 0.0);
        assert_eq!(y.derivative(x.id()), 4.0);
    }

    fn negated(raw: Raw, derivatives: Option<DerivativeMap>) -> DiffResult<DiffValue> {
        DiffFloat::construct(Raw::Float(-raw.as_f64()?), derivatives)
    }

    #[test]
    fn last_registration_wins() {
        let mut registry = Registry::with_defaults();
        registry.register(RawKind::Float, negated);
        let x = registry.construct(Raw::Float(2.0), None).unwrap();
        assert_eq!(x.raw(), Raw::Float(-2.0));
    }

    #[test]
    fn sequence_of_numbers_becomes_sequence_of_variables() {
        let registry = Registry::with_defaults();
        let v = registry
            .variables(Raw::tuple([Raw::Float(1.0), Raw::Float(2.0)]))
            .unwrap();
        match v {
            Value::Seq(crate::raw::SeqKind::Tuple, items) => {
                assert_eq!(items.len(), 2);
                assert!(items.iter().all(Value::is_differentiable));
            }
            other => panic!("expected a tuple, got {other:?}"),
        }
    }
}
