//! Functions that observe null/missing instead of propagating them.

use bramble_error::Result;

use crate::eval::EvalMode;
use crate::functions::Signature;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::function_set::ScalarFunctionSet;
use crate::functions::scalar::{NullPropagation, RawScalarFunction, ScalarFunction};
use crate::types::TypeId;
use crate::values::Value;

pub const FUNCTION_SET_COALESCE: ScalarFunctionSet = ScalarFunctionSet {
    name: "coalesce",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Nullability,
        description: "Return the first argument that is neither null nor missing.",
        arguments: &["values"],
        example: Some(Example {
            example: "coalesce(null, missing, 3)",
            output: "3",
        }),
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new_variadic(&[TypeId::Dynamic], TypeId::Dynamic, TypeId::Dynamic),
        &Coalesce,
    )],
};

pub const FUNCTION_SET_NULLIF: ScalarFunctionSet = ScalarFunctionSet {
    name: "nullif",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Nullability,
        description: "Return null if the two arguments are equal, otherwise the first argument.",
        arguments: &["a", "b"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new(&[TypeId::Dynamic, TypeId::Dynamic], TypeId::Dynamic),
        &NullIf,
    )],
};

pub const FUNCTION_SET_EXISTS: ScalarFunctionSet = ScalarFunctionSet {
    name: "exists",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Nullability,
        description: "True if the argument is a non-empty collection.",
        arguments: &["collection"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new(&[TypeId::Dynamic], TypeId::Bool),
        &Exists,
    )],
};

pub const FUNCTION_SET_IS_NULL: ScalarFunctionSet = ScalarFunctionSet {
    name: "is_null",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Nullability,
        description: "True if the argument is null or missing.",
        arguments: &["value"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new(&[TypeId::Dynamic], TypeId::Bool),
        &IsNull,
    )],
};

pub const FUNCTION_SET_IS_MISSING: ScalarFunctionSet = ScalarFunctionSet {
    name: "is_missing",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Nullability,
        description: "True if the argument is missing, false for any other value including null.",
        arguments: &["value"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new(&[TypeId::Dynamic], TypeId::Bool),
        &IsMissing,
    )],
};

#[derive(Debug, Clone, Copy)]
pub struct Coalesce;

impl ScalarFunction for Coalesce {
    fn propagation(&self) -> NullPropagation {
        NullPropagation::Observe
    }

    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        for arg in args {
            if !arg.is_absent() {
                return Ok(arg.clone());
            }
        }
        Ok(Value::Null)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct NullIf;

impl ScalarFunction for NullIf {
    fn propagation(&self) -> NullPropagation {
        NullPropagation::Observe
    }

    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        if args[0] == args[1] {
            Ok(Value::Null)
        } else {
            Ok(args[0].clone())
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Exists;

impl ScalarFunction for Exists {
    fn propagation(&self) -> NullPropagation {
        NullPropagation::Observe
    }

    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        let non_empty = match &args[0] {
            Value::List(v) | Value::Bag(v) | Value::Sexp(v) => !v.is_empty(),
            Value::Strct(fields) => !fields.is_empty(),
            _ => false,
        };
        Ok(Value::Bool(non_empty))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IsNull;

impl ScalarFunction for IsNull {
    fn propagation(&self) -> NullPropagation {
        NullPropagation::Observe
    }

    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        Ok(Value::Bool(args[0].is_absent()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct IsMissing;

impl ScalarFunction for IsMissing {
    fn propagation(&self) -> NullPropagation {
        NullPropagation::Observe
    }

    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        Ok(Value::Bool(args[0].is_missing()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coalesce_skips_null_and_missing() {
        let out = Coalesce
            .invoke(
                &[Value::Null, Value::Missing, Value::Int64(3)],
                EvalMode::Strict,
            )
            .unwrap();
        assert_eq!(Value::Int64(3), out);

        let out = Coalesce
            .invoke(&[Value::Null, Value::Missing], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Null, out);
    }

    #[test]
    fn nullif_on_equal_values() {
        let out = NullIf
            .invoke(&[Value::Int64(1), Value::Int32(1)], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Null, out);

        let out = NullIf
            .invoke(&[Value::Int64(1), Value::Int64(2)], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Int64(1), out);
    }

    #[test]
    fn exists_checks_emptiness() {
        let out = Exists
            .invoke(&[Value::Bag(vec![Value::Null])], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Bool(true), out);

        let out = Exists
            .invoke(&[Value::List(Vec::new())], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Bool(false), out);
    }

    #[test]
    fn is_missing_distinguishes_null() {
        assert_eq!(
            Value::Bool(false),
            IsMissing.invoke(&[Value::Null], EvalMode::Strict).unwrap()
        );
        assert_eq!(
            Value::Bool(true),
            IsMissing
                .invoke(&[Value::Missing], EvalMode::Strict)
                .unwrap()
        );
        assert_eq!(
            Value::Bool(true),
            IsNull.invoke(&[Value::Missing], EvalMode::Strict).unwrap()
        );
    }
}
