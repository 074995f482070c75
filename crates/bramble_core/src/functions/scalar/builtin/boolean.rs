//! Three-valued logical operators.
//!
//! These observe null/missing: `false AND null` is false and `true OR null`
//! is true, which propagation would get wrong.

use bramble_error::Result;

use super::invalid_argument;
use crate::eval::EvalMode;
use crate::functions::Signature;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::function_set::ScalarFunctionSet;
use crate::functions::scalar::{NullPropagation, RawScalarFunction, ScalarFunction};
use crate::types::TypeId;
use crate::values::Value;

const SIG_BINARY: Signature =
    Signature::new(&[TypeId::Dynamic, TypeId::Dynamic], TypeId::Bool);

pub const FUNCTION_SET_AND: ScalarFunctionSet = ScalarFunctionSet {
    name: "and",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::LOGICAL_OPERATOR,
        description: "Three-valued logical AND.",
        arguments: &["a", "b"],
        example: Some(Example {
            example: "false and null",
            output: "false",
        }),
    }],
    functions: &[RawScalarFunction::new(&SIG_BINARY, &And)],
};

pub const FUNCTION_SET_OR: ScalarFunctionSet = ScalarFunctionSet {
    name: "or",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::LOGICAL_OPERATOR,
        description: "Three-valued logical OR.",
        arguments: &["a", "b"],
        example: Some(Example {
            example: "true or null",
            output: "true",
        }),
    }],
    functions: &[RawScalarFunction::new(&SIG_BINARY, &Or)],
};

pub const FUNCTION_SET_NOT: ScalarFunctionSet = ScalarFunctionSet {
    name: "not",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::LOGICAL_OPERATOR,
        description: "Three-valued logical NOT.",
        arguments: &["a"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new(&[TypeId::Dynamic], TypeId::Bool),
        &Not,
    )],
};

/// Truth value of an operand: Some(bool) for booleans, None for null/missing
/// (the "unknown" of three-valued logic), error otherwise.
fn truth(
    func: &'static str,
    position: usize,
    value: &Value,
    mode: EvalMode,
) -> Result<Option<Option<bool>>> {
    match value {
        Value::Bool(b) => Ok(Some(Some(*b))),
        Value::Null | Value::Missing => Ok(Some(None)),
        other => match mode {
            EvalMode::Permissive => Ok(None),
            EvalMode::Strict => Err(invalid_argument(func, position, "boolean", other)),
        },
    }
}

fn logic_value(v: Option<bool>) -> Value {
    match v {
        Some(b) => Value::Bool(b),
        None => Value::Null,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct And;

impl ScalarFunction for And {
    fn propagation(&self) -> NullPropagation {
        NullPropagation::Observe
    }

    fn invoke(&self, args: &[Value], mode: EvalMode) -> Result<Value> {
        let (a, b) = match (
            truth("and", 0, &args[0], mode)?,
            truth("and", 1, &args[1], mode)?,
        ) {
            (Some(a), Some(b)) => (a, b),
            _ => return Ok(Value::Missing),
        };
        Ok(logic_value(match (a, b) {
            (Some(false), _) | (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        }))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Or;

impl ScalarFunction for Or {
    fn propagation(&self) -> NullPropagation {
        NullPropagation::Observe
    }

    fn invoke(&self, args: &[Value], mode: EvalMode) -> Result<Value> {
        let (a, b) = match (
            truth("or", 0, &args[0], mode)?,
            truth("or", 1, &args[1], mode)?,
        ) {
            (Some(a), Some(b)) => (a, b),
            _ => return Ok(Value::Missing),
        };
        Ok(logic_value(match (a, b) {
            (Some(true), _) | (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        }))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Not;

impl ScalarFunction for Not {
    fn propagation(&self) -> NullPropagation {
        NullPropagation::Observe
    }

    fn invoke(&self, args: &[Value], mode: EvalMode) -> Result<Value> {
        match truth("not", 0, &args[0], mode)? {
            Some(v) => Ok(logic_value(v.map(|b| !b))),
            None => Ok(Value::Missing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn false_dominates_and() {
        let out = And
            .invoke(&[Value::Bool(false), Value::Null], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Bool(false), out);
    }

    #[test]
    fn true_dominates_or() {
        let out = Or
            .invoke(&[Value::Null, Value::Bool(true)], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Bool(true), out);
    }

    #[test]
    fn unknown_stays_unknown() {
        let out = And
            .invoke(&[Value::Bool(true), Value::Missing], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Null, out);

        let out = Not.invoke(&[Value::Null], EvalMode::Strict).unwrap();
        assert_eq!(Value::Null, out);
    }

    #[test]
    fn non_boolean_operand() {
        let args = [Value::Int64(1), Value::Bool(true)];
        assert!(And.invoke(&args, EvalMode::Strict).is_err());
        assert_eq!(
            Value::Missing,
            And.invoke(&args, EvalMode::Permissive).unwrap()
        );
    }
}
