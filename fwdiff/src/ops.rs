//! The scalar operator table.
//!
//! Arithmetic operators are [`Analytic`] wrappers carrying the usual
//! calculus rules; comparisons, casts and the integer-division family
//! are value-only and never produce a differentiable result. The
//! reflected operators (`radd`, `rsub`, ...) take the receiver as their
//! *second* operand: `rsub(x, y) = y - x`.
//!
//! Arithmetic is done in `f64` with IEEE semantics, so `1 / 0` is `inf`
//! rather than an error.
//!
//! ```
//! use fwdiff::{scalar_ops, Value};
//!
//! let x = Value::variable(3.0).unwrap();
//! let y = scalar_ops().apply("pow", &[x.clone(), Value::from(2.0)]).unwrap();
//! assert_eq!(y.raw().as_f64().unwrap(), 9.0);
//! assert_eq!(y.derivative(x.var_id().unwrap()), 6.0);
//! ```

use std::collections::HashMap;

use num_traits::ToPrimitive;
use once_cell::sync::Lazy;

use crate::error::{DiffError, DiffResult};
use crate::function::{number_arg, Analytic, Constant, DiffFunction};
use crate::raw::Raw;
use crate::registry::{self, Registry};
use crate::value::Value;

/// One entry of an [`OperatorTable`].
#[derive(Debug, Clone)]
pub enum Operator {
    /// Derivative not propagated; the result is always raw.
    ValueOnly(Constant),
    /// Derivatives propagated by analytic rules.
    Analytic(Analytic),
}

impl Operator {
    /// The operator's name.
    pub fn name(&self) -> &str {
        match self {
            Operator::ValueOnly(c) => c.name(),
            Operator::Analytic(a) => a.name(),
        }
    }

    /// The analytic wrapper, for operators that propagate derivatives.
    pub fn as_analytic(&self) -> Option<&Analytic> {
        match self {
            Operator::Analytic(a) => Some(a),
            Operator::ValueOnly(_) => None,
        }
    }

    /// Apply against an explicit registry. Value-only operators ignore
    /// it.
    pub fn apply_with(&self, registry: &Registry, args: &[Value]) -> DiffResult<Value> {
        match self {
            Operator::ValueOnly(c) => c.call(args).map(Value::Raw),
            Operator::Analytic(a) => a.call_with(registry, args),
        }
    }
}

/// Operator name → implementation.
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    ops: HashMap<&'static str, Operator>,
}

impl OperatorTable {
    /// The operators of the scalar variant.
    pub fn scalar() -> Self {
        let mut table = Self::default();

        let add = Analytic::new("add", binary("add", |x, y| x + y))
            .with_derivative(0, binary("add", |_, _| 1.0))
            .with_derivative(1, binary("add", |_, _| 1.0));
        let sub = Analytic::new("sub", binary("sub", |x, y| x - y))
            .with_derivative(0, binary("sub", |_, _| 1.0))
            .with_derivative(1, binary("sub", |_, _| -1.0));
        let mul = Analytic::new("mul", binary("mul", |x, y| x * y))
            .with_derivative(0, binary("mul", |_, y| y))
            .with_derivative(1, binary("mul", |x, _| x));
        let div = Analytic::new("div", binary("div", |x, y| x / y))
            .with_derivative(0, binary("div", |_, y| 1.0 / y))
            .with_derivative(1, binary("div", |x, y| -x / (y * y)));
        let pow = Analytic::new("pow", binary("pow", f64::powf))
            .with_derivative(0, binary("pow", |x, y| y * x.powf(y - 1.0)))
            .with_derivative(1, binary("pow", |x, y| x.ln() * x.powf(y)));

        for (name, op) in [("radd", &add), ("rsub", &sub), ("rmul", &mul), ("rdiv", &div), ("rpow", &pow)] {
            table.insert_analytic(name, op.reflected(name));
        }
        for (name, op) in [("add", add), ("sub", sub), ("mul", mul), ("div", div), ("pow", pow)] {
            table.insert_analytic(name, op);
        }

        let unary_ops: [(&'static str, fn(f64) -> f64, fn(f64) -> f64); 8] = [
            ("neg", |x| -x, |_| -1.0),
            ("pos", |x| x, |_| 1.0),
            ("abs", f64::abs, sign),
            ("exp", f64::exp, f64::exp),
            ("ln", f64::ln, |x| 1.0 / x),
            ("sin", f64::sin, f64::cos),
            ("cos", f64::cos, |x| -x.sin()),
            ("sqrt", f64::sqrt, |x| 0.5 / x.sqrt()),
        ];
        for (name, f, df) in unary_ops {
            table.insert_analytic(
                name,
                Analytic::new(name, unary(name, f)).with_derivative(0, unary(name, df)),
            );
        }

        let comparisons: [(&'static str, fn(f64, f64) -> bool); 6] = [
            ("lt", |x, y| x < y),
            ("le", |x, y| x <= y),
            ("eq", |x, y| x == y),
            ("ne", |x, y| x != y),
            ("ge", |x, y| x >= y),
            ("gt", |x, y| x > y),
        ];
        for (name, cmp) in comparisons {
            table.insert_value_only(name, move |a| {
                Ok(Raw::Bool(cmp(number_arg(name, a, 0)?, number_arg(name, a, 1)?)))
            });
        }

        table.insert_value_only("to_int", |a| {
            let x = number_arg("to_int", a, 0)?;
            x.trunc()
                .to_i64()
                .map(Raw::Int)
                .ok_or_else(|| DiffError::evaluation("to_int", format!("{x} has no integer value")))
        });
        table.insert_value_only("to_float", |a| Ok(Raw::Float(number_arg("to_float", a, 0)?)));
        table.insert_value_only("trunc", unary("trunc", f64::trunc));
        table.insert_value_only("rem", binary("rem", floored_rem));
        table.insert_value_only("floor_div", binary("floor_div", floor_div));
        table.insert_value_only("div_rem", |a| {
            let (x, y) = (number_arg("div_rem", a, 0)?, number_arg("div_rem", a, 1)?);
            Ok(Raw::tuple([Raw::Float(floor_div(x, y)), Raw::Float(floored_rem(x, y))]))
        });

        table
    }

    fn insert_analytic(&mut self, name: &'static str, op: Analytic) {
        self.ops.insert(name, Operator::Analytic(op));
    }

    fn insert_value_only<F>(&mut self, name: &'static str, func: F)
    where
        F: Fn(&[Raw]) -> DiffResult<Raw> + Send + Sync + 'static,
    {
        self.ops.insert(name, Operator::ValueOnly(Constant::new(name, func)));
    }

    /// Look up an operator by name.
    pub fn get(&self, name: &str) -> Option<&Operator> {
        self.ops.get(name)
    }

    /// Every operator name, in no particular order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.ops.keys().copied()
    }

    /// Apply operator `name` using the process-wide registry.
    pub fn apply(&self, name: &str, args: &[Value]) -> DiffResult<Value> {
        self.apply_with(&registry::global(), name, args)
    }

    /// Apply operator `name` against an explicit registry.
    pub fn apply_with(&self, registry: &Registry, name: &str, args: &[Value]) -> DiffResult<Value> {
        self.get(name)
            .ok_or_else(|| DiffError::UnknownOperator(name.to_string()))?
            .apply_with(registry, args)
    }
}

static SCALAR_OPS: Lazy<OperatorTable> = Lazy::new(OperatorTable::scalar);

/// The shared scalar operator table.
pub fn scalar_ops() -> &'static OperatorTable {
    &SCALAR_OPS
}

fn unary(
    name: &'static str,
    f: fn(f64) -> f64,
) -> impl Fn(&[Raw]) -> DiffResult<Raw> + Send + Sync + 'static {
    move |a: &[Raw]| Ok(Raw::Float(f(number_arg(name, a, 0)?)))
}

fn binary(
    name: &'static str,
    f: fn(f64, f64) -> f64,
) -> impl Fn(&[Raw]) -> DiffResult<Raw> + Send + Sync + 'static {
    move |a: &[Raw]| Ok(Raw::Float(f(number_arg(name, a, 0)?, number_arg(name, a, 1)?)))
}

/// Subgradient of `abs`: zero at the origin.
fn sign(x: f64) -> f64 {
    if x == 0.0 {
        0.0
    } else {
        x.signum()
    }
}

/// Remainder taking the sign of the divisor.
fn floored_rem(x: f64, y: f64) -> f64 {
    let r = x % y;
    if r != 0.0 && (r < 0.0) != (y < 0.0) {
        r + y
    } else {
        r
    }
}

fn floor_div(x: f64, y: f64) -> f64 {
    (x / y).floor()
}

#[allow(clippy::should_implement_trait)]
impl Value {
    fn unary_op(&self, name: &str) -> DiffResult<Value> {
        scalar_ops().apply(name, std::slice::from_ref(self))
    }

    fn binary_op(&self, name: &str, rhs: &Value) -> DiffResult<Value> {
        scalar_ops().apply(name, &[self.clone(), rhs.clone()])
    }

    fn compare(&self, name: &str, rhs: &Value) -> DiffResult<bool> {
        self.binary_op(name, rhs)?.raw().as_bool()
    }

    /// `self + rhs`.
    pub fn add(&self, rhs: &Value) -> DiffResult<Value> {
        self.binary_op("add", rhs)
    }

    /// `self - rhs`.
    pub fn sub(&self, rhs: &Value) -> DiffResult<Value> {
        self.binary_op("sub", rhs)
    }

    /// `self · rhs`.
    pub fn mul(&self, rhs: &Value) -> DiffResult<Value> {
        self.binary_op("mul", rhs)
    }

    /// `self / rhs`.
    pub fn div(&self, rhs: &Value) -> DiffResult<Value> {
        self.binary_op("div", rhs)
    }

    /// `self ^ rhs`.
    pub fn pow(&self, rhs: &Value) -> DiffResult<Value> {
        self.binary_op("pow", rhs)
    }

    /// `lhs + self`.
    pub fn radd(&self, lhs: &Value) -> DiffResult<Value> {
        self.binary_op("radd", lhs)
    }

    /// `lhs - self`.
    pub fn rsub(&self, lhs: &Value) -> DiffResult<Value> {
        self.binary_op("rsub", lhs)
    }

    /// `lhs · self`.
    pub fn rmul(&self, lhs: &Value) -> DiffResult<Value> {
        self.binary_op("rmul", lhs)
    }

    /// `lhs / self`.
    pub fn rdiv(&self, lhs: &Value) -> DiffResult<Value> {
        self.binary_op("rdiv", lhs)
    }

    /// `lhs ^ self`.
    pub fn rpow(&self, lhs: &Value) -> DiffResult<Value> {
        self.binary_op("rpow", lhs)
    }

    /// `-self`.
    pub fn neg(&self) -> DiffResult<Value> {
        self.unary_op("neg")
    }

    /// `+self`.
    pub fn pos(&self) -> DiffResult<Value> {
        self.unary_op("pos")
    }

    /// `|self|`, with derivative 0 at the origin.
    pub fn abs(&self) -> DiffResult<Value> {
        self.unary_op("abs")
    }

    /// `e^self`.
    pub fn exp(&self) -> DiffResult<Value> {
        self.unary_op("exp")
    }

    /// Natural logarithm.
    pub fn ln(&self) -> DiffResult<Value> {
        self.unary_op("ln")
    }

    /// Sine.
    pub fn sin(&self) -> DiffResult<Value> {
        self.unary_op("sin")
    }

    /// Cosine.
    pub fn cos(&self) -> DiffResult<Value> {
        self.unary_op("cos")
    }

    /// Square root.
    pub fn sqrt(&self) -> DiffResult<Value> {
        self.unary_op("sqrt")
    }

    /// `self < rhs` on raw values.
    pub fn lt(&self, rhs: &Value) -> DiffResult<bool> {
        self.compare("lt", rhs)
    }

    /// `self <= rhs` on raw values.
    pub fn le(&self, rhs: &Value) -> DiffResult<bool> {
        self.compare("le", rhs)
    }

    /// `self > rhs` on raw values.
    pub fn gt(&self, rhs: &Value) -> DiffResult<bool> {
        self.compare("gt", rhs)
    }

    /// `self >= rhs` on raw values.
    pub fn ge(&self, rhs: &Value) -> DiffResult<bool> {
        self.compare("ge", rhs)
    }

    /// Numeric equality of the raw values.
    pub fn eq_value(&self, rhs: &Value) -> DiffResult<bool> {
        self.compare("eq", rhs)
    }

    /// Numeric inequality of the raw values.
    pub fn ne_value(&self, rhs: &Value) -> DiffResult<bool> {
        self.compare("ne", rhs)
    }

    /// Truncate to an integer; fails for non-finite or out-of-range
    /// values.
    pub fn to_int(&self) -> DiffResult<i64> {
        match self.unary_op("to_int")?.raw() {
            Raw::Int(i) => Ok(i),
            other => Err(DiffError::NotNumeric { kind: other.kind() }),
        }
    }

    /// The raw value as a float.
    pub fn to_float(&self) -> DiffResult<f64> {
        self.unary_op("to_float")?.raw().as_f64()
    }

    /// Round toward zero; not differentiable.
    pub fn trunc(&self) -> DiffResult<Raw> {
        Ok(self.unary_op("trunc")?.raw())
    }

    /// Remainder with the sign of `rhs`.
    pub fn rem(&self, rhs: &Value) -> DiffResult<Raw> {
        Ok(self.binary_op("rem", rhs)?.raw())
    }

    /// `floor(self / rhs)`.
    pub fn floor_div(&self, rhs: &Value) -> DiffResult<Raw> {
        Ok(self.binary_op("floor_div", rhs)?.raw())
    }

    /// `(floor_div, rem)` as a tuple.
    pub fn div_rem(&self, rhs: &Value) -> DiffResult<Raw> {
        Ok(self.binary_op("div_rem", rhs)?.raw())
    }
}

// Operator syntax for the fallible arithmetic above: `&x * &y` is
// `x.mul(&y)`.
macro_rules! binary_operator {
    ($($trait:ident :: $method:ident),* $(,)?) => {$(
        impl std::ops::$trait<&Value> for &Value {
            type Output = DiffResult<Value>;

            fn $method(self, rhs: &Value) -> DiffResult<Value> {
                Value::$method(self, rhs)
            }
        }
    )*};
}

binary_operator!(Add::add, Sub::sub, Mul::mul, Div::div);

impl std::ops::Neg for &Value {
    type Output = DiffResult<Value>;

    fn neg(self) -> DiffResult<Value> {
        Value::neg(self)
    }
}
