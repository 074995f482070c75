//! Arithmetic operators and the shared numeric promotion kernels.
//!
//! Promotion order: two exact integers stay exact (i128 internally, overflow
//! is a typed error), an exact/decimal mix stays decimal, any float pushes
//! the operation to f64.

use bramble_error::{BrambleError, Result};

use super::invalid_argument;
use crate::eval::EvalMode;
use crate::functions::Signature;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::function_set::ScalarFunctionSet;
use crate::functions::scalar::{RawScalarFunction, ScalarFunction};
use crate::types::TypeId;
use crate::values::{Decimal, Value};

pub const FUNCTION_SET_ADD: ScalarFunctionSet = ScalarFunctionSet {
    name: "+",
    aliases: &["add"],
    doc: &[&Documentation {
        category: Category::NUMERIC_OPERATOR,
        description: "Add two numeric values.",
        arguments: &["a", "b"],
        example: Some(Example {
            example: "1 + 2",
            output: "3",
        }),
    }],
    functions: &binary_overloads(&Add),
};

pub const FUNCTION_SET_SUB: ScalarFunctionSet = ScalarFunctionSet {
    name: "-",
    aliases: &["sub"],
    doc: &[&Documentation {
        category: Category::NUMERIC_OPERATOR,
        description: "Subtract the right value from the left.",
        arguments: &["a", "b"],
        example: None,
    }],
    functions: &binary_overloads(&Sub),
};

pub const FUNCTION_SET_MUL: ScalarFunctionSet = ScalarFunctionSet {
    name: "*",
    aliases: &["mul"],
    doc: &[&Documentation {
        category: Category::NUMERIC_OPERATOR,
        description: "Multiply two numeric values.",
        arguments: &["a", "b"],
        example: None,
    }],
    functions: &binary_overloads(&Mul),
};

pub const FUNCTION_SET_DIV: ScalarFunctionSet = ScalarFunctionSet {
    name: "/",
    aliases: &["div"],
    doc: &[&Documentation {
        category: Category::NUMERIC_OPERATOR,
        description: "Divide the left value by the right. Integer division truncates.",
        arguments: &["a", "b"],
        example: None,
    }],
    functions: &binary_overloads(&Div),
};

pub const FUNCTION_SET_MOD: ScalarFunctionSet = ScalarFunctionSet {
    name: "%",
    aliases: &["mod"],
    doc: &[&Documentation {
        category: Category::NUMERIC_OPERATOR,
        description: "Remainder of dividing the left value by the right.",
        arguments: &["a", "b"],
        example: None,
    }],
    functions: &binary_overloads(&Mod),
};

pub const FUNCTION_SET_NEGATE: ScalarFunctionSet = ScalarFunctionSet {
    name: "negate",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::NUMERIC_OPERATOR,
        description: "Negate a numeric value.",
        arguments: &["a"],
        example: None,
    }],
    functions: &[
        RawScalarFunction::new(&Signature::new(&[TypeId::Int64], TypeId::Int64), &Negate),
        RawScalarFunction::new(
            &Signature::new(&[TypeId::Decimal], TypeId::Decimal),
            &Negate,
        ),
        RawScalarFunction::new(
            &Signature::new(&[TypeId::Float64], TypeId::Float64),
            &Negate,
        ),
        RawScalarFunction::new(
            &Signature::new(&[TypeId::Dynamic], TypeId::Dynamic),
            &Negate,
        ),
    ],
};

/// Standard overload spread for a binary arithmetic operator.
///
/// The concrete overloads drive static typing; the trailing dynamic overload
/// exists so a schemaless argument still plans, with the type check deferred
/// to runtime.
const fn binary_overloads(
    f: &'static dyn ScalarFunction,
) -> [RawScalarFunction; 4] {
    const SIG_INT: Signature = Signature::new(&[TypeId::Int64, TypeId::Int64], TypeId::Int64);
    const SIG_DEC: Signature =
        Signature::new(&[TypeId::Decimal, TypeId::Decimal], TypeId::Decimal);
    const SIG_FLOAT: Signature =
        Signature::new(&[TypeId::Float64, TypeId::Float64], TypeId::Float64);
    const SIG_ANY: Signature =
        Signature::new(&[TypeId::Dynamic, TypeId::Dynamic], TypeId::Dynamic);
    [
        RawScalarFunction::new(&SIG_INT, f),
        RawScalarFunction::new(&SIG_DEC, f),
        RawScalarFunction::new(&SIG_FLOAT, f),
        RawScalarFunction::new(&SIG_ANY, f),
    ]
}

/// Numeric value promoted for arithmetic.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Num {
    Int(i128),
    Dec(Decimal),
    Float(f64),
}

pub(crate) fn num_of(func: &'static str, position: usize, value: &Value) -> Result<Num> {
    Ok(match value {
        Value::Int8(i) => Num::Int(*i as i128),
        Value::Int16(i) => Num::Int(*i as i128),
        Value::Int32(i) => Num::Int(*i as i128),
        Value::Int64(i) => Num::Int(*i as i128),
        Value::Int(i) => Num::Int(*i),
        Value::Decimal(d) => Num::Dec(*d),
        Value::Float32(f) => Num::Float(*f as f64),
        Value::Float64(f) => Num::Float(*f),
        other => return Err(invalid_argument(func, position, "numeric", other)),
    })
}

fn int_value(i: i128) -> Value {
    match i64::try_from(i) {
        Ok(v) => Value::Int64(v),
        Err(_) => Value::Int(i),
    }
}

fn overflow(func: &'static str) -> BrambleError {
    BrambleError::new("Numeric overflow").with_field("function", func)
}

fn num_float(n: Num) -> f64 {
    match n {
        Num::Int(i) => i as f64,
        Num::Dec(d) => d.to_f64(),
        Num::Float(f) => f,
    }
}

/// Apply a binary arithmetic op with promotion across numeric classes.
pub(crate) fn arith(
    func: &'static str,
    a: &Value,
    b: &Value,
    int_op: fn(i128, i128) -> Option<i128>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value> {
    let left = num_of(func, 0, a)?;
    let right = num_of(func, 1, b)?;
    match (left, right) {
        (Num::Int(x), Num::Int(y)) => {
            let out = int_op(x, y).ok_or_else(|| overflow(func))?;
            Ok(int_value(out))
        }
        (Num::Dec(x), Num::Dec(y)) => {
            let (xv, yv, scale) = x.align(y).ok_or_else(|| overflow(func))?;
            // Aligned decimals only stay decimal for add/sub; everything else
            // scales, so fall back to float for those via int_op failure.
            match int_op(xv, yv) {
                Some(out) if decimal_preserving(func) => {
                    Ok(Value::Decimal(Decimal::new(out, scale)))
                }
                _ => Ok(Value::Float64(float_op(x.to_f64(), y.to_f64()))),
            }
        }
        (Num::Dec(x), Num::Int(y)) => {
            arith(func, &Value::Decimal(x), &Value::Decimal(Decimal::from_i128(y)), int_op, float_op)
        }
        (Num::Int(x), Num::Dec(y)) => {
            arith(func, &Value::Decimal(Decimal::from_i128(x)), &Value::Decimal(y), int_op, float_op)
        }
        (x, y) => Ok(Value::Float64(float_op(num_float(x), num_float(y)))),
    }
}

fn decimal_preserving(func: &'static str) -> bool {
    matches!(func, "+" | "-")
}

pub(crate) fn num_add(a: &Value, b: &Value) -> Result<Value> {
    arith("+", a, b, i128::checked_add, |x, y| x + y)
}

#[derive(Debug, Clone, Copy)]
pub struct Add;

impl ScalarFunction for Add {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        num_add(&args[0], &args[1])
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sub;

impl ScalarFunction for Sub {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        arith("-", &args[0], &args[1], i128::checked_sub, |x, y| x - y)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Mul;

impl ScalarFunction for Mul {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        arith("*", &args[0], &args[1], i128::checked_mul, |x, y| x * y)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Div;

impl ScalarFunction for Div {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        arith("/", &args[0], &args[1], i128::checked_div, |x, y| x / y)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Mod;

impl ScalarFunction for Mod {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        arith("%", &args[0], &args[1], i128::checked_rem, |x, y| x % y)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Negate;

impl ScalarFunction for Negate {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        match num_of("negate", 0, &args[0])? {
            Num::Int(i) => {
                let out = i.checked_neg().ok_or_else(|| overflow("negate"))?;
                Ok(int_value(out))
            }
            Num::Dec(d) => {
                let value = d.value.checked_neg().ok_or_else(|| overflow("negate"))?;
                Ok(Value::Decimal(Decimal::new(value, d.scale)))
            }
            Num::Float(f) => Ok(Value::Float64(-f)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_addition_stays_exact() {
        let out = Add
            .invoke(&[Value::Int64(1), Value::Int64(2)], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Int64(3), out);
    }

    #[test]
    fn mixed_int_float_promotes() {
        let out = Add
            .invoke(&[Value::Int64(1), Value::Float64(0.5)], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Float64(1.5), out);
    }

    #[test]
    fn decimal_addition_aligns_scales() {
        let out = Add
            .invoke(
                &[
                    Value::Decimal(Decimal::new(15, 1)),  // 1.5
                    Value::Decimal(Decimal::new(25, 2)),  // 0.25
                ],
                EvalMode::Strict,
            )
            .unwrap();
        assert_eq!(Value::Decimal(Decimal::new(175, 2)), out);
    }

    #[test]
    fn overflow_is_typed_error() {
        let err = Add
            .invoke(
                &[Value::Int(i128::MAX), Value::Int64(1)],
                EvalMode::Strict,
            )
            .unwrap_err();
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn division_by_zero_int() {
        let err = Div
            .invoke(&[Value::Int64(1), Value::Int64(0)], EvalMode::Strict)
            .unwrap_err();
        assert!(err.to_string().contains("overflow"));
    }

    #[test]
    fn non_numeric_is_typed_error() {
        let err = Mul
            .invoke(
                &[Value::Str("x".into()), Value::Int64(2)],
                EvalMode::Strict,
            )
            .unwrap_err();
        assert!(err.to_string().contains("argument_position: 0"));
    }
}
