//! Process-wide settings.
//!
//! The only setting is the default finite-difference step. It is meant
//! to be chosen once during start-up; concurrent writers are not
//! coordinated beyond the atomicity of the store itself.

use std::sync::atomic::{AtomicU64, Ordering};

use once_cell::sync::Lazy;
use tracing::debug;

use crate::error::{DiffError, DiffResult};

/// Perturbation size used when no other is configured.
pub const DEFAULT_EPSILON: f64 = 1e-8;

static EPSILON_BITS: Lazy<AtomicU64> = Lazy::new(|| AtomicU64::new(DEFAULT_EPSILON.to_bits()));

/// The current process-wide finite-difference step.
pub fn default_epsilon() -> f64 {
    f64::from_bits(EPSILON_BITS.load(Ordering::Relaxed))
}

/// Replace the process-wide finite-difference step.
///
/// ```
/// use fwdiff::{default_epsilon, set_default_epsilon, DiffError};
///
/// assert_eq!(set_default_epsilon(-1.0), Err(DiffError::InvalidEpsilon(-1.0)));
/// assert!(default_epsilon() > 0.0);
/// ```
pub fn set_default_epsilon(epsilon: f64) -> DiffResult<()> {
    validate_epsilon(epsilon)?;
    debug!(epsilon, "default finite-difference epsilon changed");
    EPSILON_BITS.store(epsilon.to_bits(), Ordering::Relaxed);
    Ok(())
}

pub(crate) fn validate_epsilon(epsilon: f64) -> DiffResult<f64> {
    if epsilon.is_finite() && epsilon > 0.0 {
        Ok(epsilon)
    } else {
        Err(DiffError::InvalidEpsilon(epsilon))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_positive_and_non_finite() {
        assert!(validate_epsilon(0.0).is_err());
        assert!(validate_epsilon(f64::NAN).is_err());
        assert!(validate_epsilon(f64::INFINITY).is_err());
        assert_eq!(validate_epsilon(1e-6), Ok(1e-6));
    }
}
