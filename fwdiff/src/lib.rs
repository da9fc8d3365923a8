//! Forward-mode automatic differentiation with sparse derivative maps.
//!
//! **Part of the fwdiff workspace**
//!
//! Every differentiable value carries a [`DerivativeMap`]: for each
//! independent variable it depends on, the partial derivative of the
//! value with respect to that variable. Wrapping an ordinary function
//! makes it propagate these maps by the chain rule:
//!
//! - [`Analytic`]: one derivative function per argument
//! - [`Joint`]: value and partials computed together
//! - [`FiniteDifference`]: numeric estimates, no derivatives needed
//!
//! Variables are identified by a [`VarId`], never by their value, so
//! two variables holding equal numbers remain distinct.
//!
//! # Differentiating a function
//!
//! ```
//! use fwdiff::{number_arg, Analytic, DiffFunction, Raw, Value};
//!
//! // f(x) = x³, f'(x) = 3x²
//! let cube = Analytic::new("cube", |a| Ok(Raw::Float(number_arg("cube", a, 0)?.powi(3))))
//!     .with_derivative(0, |a| Ok(Raw::Float(3.0 * number_arg("cube", a, 0)?.powi(2))));
//!
//! let x = Value::variable(2.0).unwrap();
//! let y = cube.call(&[x.clone()]).unwrap();
//! assert_eq!(y.raw(), Raw::Float(8.0));
//! assert_eq!(y.derivative(x.var_id().unwrap()), 12.0);
//! ```
//!
//! # Several variables at once
//!
//! One forward pass yields the partials with respect to every variable
//! that flowed in:
//!
//! ```
//! use fwdiff::Value;
//!
//! // f(x, y) = x² + x·y
//! let x = Value::variable(3.0).unwrap();
//! let y = Value::variable(4.0).unwrap();
//! let f = x.mul(&x).unwrap().add(&x.mul(&y).unwrap()).unwrap();
//!
//! assert_eq!(f.raw().as_f64().unwrap(), 21.0);
//! assert_eq!(f.derivative(x.var_id().unwrap()), 10.0); // 2x + y
//! assert_eq!(f.derivative(y.var_id().unwrap()), 3.0); // x
//! ```
//!
//! # Missing derivatives
//!
//! A derivative that was never supplied is not silently zero. It shows
//! up as [`Partial::NotImplemented`] and absorbs any arithmetic it
//! takes part in:
//!
//! ```
//! use fwdiff::{number_arg, Analytic, DiffFunction, Partial, Raw, Value};
//!
//! let opaque = Analytic::new("opaque", |a| Ok(Raw::Float(number_arg("opaque", a, 0)?.tanh())));
//! let x = Value::variable(0.5).unwrap();
//! let y = opaque.call(&[x.clone()]).unwrap();
//! assert_eq!(y.derivative(x.var_id().unwrap()), Partial::NotImplemented);
//! ```
//!
//! # Registering types
//!
//! A [`Registry`] decides which differentiable variant represents each
//! raw kind. The process-wide one starts with floats; more kinds can be
//! added at start-up with [`register_type`], or a private registry can
//! be passed to [`DiffFunction::call_with`].

#![deny(missing_docs)]

pub mod config;
pub mod derivatives;
pub mod error;
pub mod function;
pub mod ops;
pub mod partial;
pub mod raw;
pub mod registry;
pub mod scalar;
pub mod value;
pub mod var;

pub use config::{default_epsilon, set_default_epsilon, DEFAULT_EPSILON};
pub use derivatives::{scale, sum_dicts, DerivativeMap};
pub use error::{DiffError, DiffResult};
pub use function::{
    base_fn, number_arg, wrap_analytic, wrap_constant, wrap_joint, Analytic, BaseFn, Constant,
    DiffFunction, FiniteDifference, Joint, JointFn, JointOutput,
};
pub use ops::{scalar_ops, Operator, OperatorTable};
pub use partial::Partial;
pub use raw::{Raw, RawKind, SeqKind};
pub use registry::{global, new_variable, register_type, Constructor, Registry};
pub use scalar::DiffFloat;
pub use value::{DiffValue, Differentiable, Value};
pub use var::VarId;
