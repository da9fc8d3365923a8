//! Variable identities.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_VAR_ID: AtomicU64 = AtomicU64::new(1);

/// Opaque identity of a differentiable value.
///
/// Ids are issued from a process-wide counter and are never derived
/// from the value a variable holds, so two variables with equal raw
/// values remain distinct keys in a derivative map.
///
/// ```
/// use fwdiff::VarId;
///
/// let a = VarId::fresh();
/// let b = VarId::fresh();
/// assert_ne!(a, b);
/// assert!(a < b);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(u64);

impl VarId {
    /// Issue a new, never before seen id.
    pub fn fresh() -> Self {
        VarId(NEXT_VAR_ID.fetch_add(1, Ordering::Relaxed))
    }

    /// The underlying counter value.
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VarId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}
