//! Comparison operators over any pair of values.
//!
//! Operands of different classes are incomparable: strict mode raises a typed
//! error, permissive mode yields missing.

use std::cmp::Ordering;

use bramble_error::{BrambleError, Result};

use crate::eval::EvalMode;
use crate::functions::Signature;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::function_set::ScalarFunctionSet;
use crate::functions::scalar::{RawScalarFunction, ScalarFunction};
use crate::types::TypeId;
use crate::values::{Value, compare};

const SIG_CMP: Signature =
    Signature::new(&[TypeId::Dynamic, TypeId::Dynamic], TypeId::Bool);

pub const FUNCTION_SET_EQ: ScalarFunctionSet = ScalarFunctionSet {
    name: "=",
    aliases: &["eq"],
    doc: &[&Documentation {
        category: Category::COMPARISON_OPERATOR,
        description: "Check if two values are equal.",
        arguments: &["a", "b"],
        example: Some(Example {
            example: "a = b",
            output: "true",
        }),
    }],
    functions: &[RawScalarFunction::new(&SIG_CMP, &Cmp::EQ)],
};

pub const FUNCTION_SET_NEQ: ScalarFunctionSet = ScalarFunctionSet {
    name: "!=",
    aliases: &["<>", "neq"],
    doc: &[&Documentation {
        category: Category::COMPARISON_OPERATOR,
        description: "Check if two values are not equal.",
        arguments: &["a", "b"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(&SIG_CMP, &Cmp::NEQ)],
};

pub const FUNCTION_SET_LT: ScalarFunctionSet = ScalarFunctionSet {
    name: "<",
    aliases: &["lt"],
    doc: &[&Documentation {
        category: Category::COMPARISON_OPERATOR,
        description: "Check if the left value is less than the right.",
        arguments: &["a", "b"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(&SIG_CMP, &Cmp::LT)],
};

pub const FUNCTION_SET_LT_EQ: ScalarFunctionSet = ScalarFunctionSet {
    name: "<=",
    aliases: &["lte"],
    doc: &[&Documentation {
        category: Category::COMPARISON_OPERATOR,
        description: "Check if the left value is less than or equal to the right.",
        arguments: &["a", "b"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(&SIG_CMP, &Cmp::LTE)],
};

pub const FUNCTION_SET_GT: ScalarFunctionSet = ScalarFunctionSet {
    name: ">",
    aliases: &["gt"],
    doc: &[&Documentation {
        category: Category::COMPARISON_OPERATOR,
        description: "Check if the left value is greater than the right.",
        arguments: &["a", "b"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(&SIG_CMP, &Cmp::GT)],
};

pub const FUNCTION_SET_GT_EQ: ScalarFunctionSet = ScalarFunctionSet {
    name: ">=",
    aliases: &["gte"],
    doc: &[&Documentation {
        category: Category::COMPARISON_OPERATOR,
        description: "Check if the left value is greater than or equal to the right.",
        arguments: &["a", "b"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(&SIG_CMP, &Cmp::GTE)],
};

pub const FUNCTION_SET_BETWEEN: ScalarFunctionSet = ScalarFunctionSet {
    name: "between",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::COMPARISON_OPERATOR,
        description: "Check if a value lies between a lower and upper bound, inclusive.",
        arguments: &["value", "low", "high"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new(
            &[TypeId::Dynamic, TypeId::Dynamic, TypeId::Dynamic],
            TypeId::Bool,
        ),
        &Between,
    )],
};

fn incomparable(name: &'static str, a: &Value, b: &Value, mode: EvalMode) -> Result<Value> {
    match mode {
        EvalMode::Permissive => Ok(Value::Missing),
        EvalMode::Strict => Err(BrambleError::new("Incomparable values")
            .with_field("function", name)
            .with_field("left", a.type_id())
            .with_field("right", b.type_id())),
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Cmp {
    name: &'static str,
    accept: fn(Ordering) -> bool,
}

impl Cmp {
    pub const EQ: Cmp = Cmp {
        name: "=",
        accept: |ord| ord == Ordering::Equal,
    };
    pub const NEQ: Cmp = Cmp {
        name: "!=",
        accept: |ord| ord != Ordering::Equal,
    };
    pub const LT: Cmp = Cmp {
        name: "<",
        accept: |ord| ord == Ordering::Less,
    };
    pub const LTE: Cmp = Cmp {
        name: "<=",
        accept: |ord| ord != Ordering::Greater,
    };
    pub const GT: Cmp = Cmp {
        name: ">",
        accept: |ord| ord == Ordering::Greater,
    };
    pub const GTE: Cmp = Cmp {
        name: ">=",
        accept: |ord| ord != Ordering::Less,
    };
}

impl ScalarFunction for Cmp {
    fn invoke(&self, args: &[Value], mode: EvalMode) -> Result<Value> {
        match compare(&args[0], &args[1]) {
            Some(ord) => Ok(Value::Bool((self.accept)(ord))),
            None => incomparable(self.name, &args[0], &args[1], mode),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Between;

impl ScalarFunction for Between {
    fn invoke(&self, args: &[Value], mode: EvalMode) -> Result<Value> {
        let low = Cmp::GTE.invoke(&[args[0].clone(), args[1].clone()], mode)?;
        let high = Cmp::LTE.invoke(&[args[0].clone(), args[2].clone()], mode)?;
        match (low, high) {
            (Value::Bool(a), Value::Bool(b)) => Ok(Value::Bool(a && b)),
            // Either side incomparable in permissive mode.
            _ => Ok(Value::Missing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_comparison_across_widths() {
        let out = Cmp::LT
            .invoke(&[Value::Int32(1), Value::Float64(1.5)], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Bool(true), out);
    }

    #[test]
    fn incomparable_strict_errors_permissive_missing() {
        let args = [Value::Int64(1), Value::Str("a".into())];
        assert!(Cmp::EQ.invoke(&args, EvalMode::Strict).is_err());
        assert_eq!(
            Value::Missing,
            Cmp::EQ.invoke(&args, EvalMode::Permissive).unwrap()
        );
    }

    #[test]
    fn between_inclusive() {
        let out = Between
            .invoke(
                &[Value::Int64(2), Value::Int64(2), Value::Int64(3)],
                EvalMode::Strict,
            )
            .unwrap();
        assert_eq!(Value::Bool(true), out);
    }
}
