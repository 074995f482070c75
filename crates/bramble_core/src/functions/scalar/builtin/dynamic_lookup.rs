//! The reserved dynamic variable lookup function.
//!
//! Only the resolver's lowering stage emits calls to this; user syntax never
//! reaches it. It exists for variables the resolver cannot pin to a single
//! lexical scope: the candidate binding locations become variadic arguments
//! and the scan happens at runtime against actual struct shapes.

use bramble_error::{BrambleError, Result};

use super::invalid_argument;
use crate::eval::EvalMode;
use crate::functions::Signature;
use crate::functions::documentation::{Category, Documentation};
use crate::functions::function_set::ScalarFunctionSet;
use crate::functions::scalar::{NullPropagation, RawScalarFunction, ScalarFunction};
use crate::types::TypeId;
use crate::values::Value;

pub const DYNAMIC_LOOKUP_NAME: &str = "$__dynamic_lookup__";

pub const FUNCTION_SET_DYNAMIC_LOOKUP: ScalarFunctionSet = ScalarFunctionSet {
    name: "$__dynamic_lookup__",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::System,
        description: "Scan candidate binding locations for a field matching the given \
                      name under the given case rule. Emitted by variable lowering only.",
        arguments: &["name", "case", "order", "candidates"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new_variadic(
            &[TypeId::Str, TypeId::Sym, TypeId::Sym],
            TypeId::Dynamic,
            TypeId::Dynamic,
        ),
        &DynamicLookup,
    )],
};

#[derive(Debug, Clone, Copy)]
pub struct DynamicLookup;

impl ScalarFunction for DynamicLookup {
    fn propagation(&self) -> NullPropagation {
        // Candidate locations may legitimately be missing.
        NullPropagation::Observe
    }

    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        let name = args[0]
            .as_text()
            .ok_or_else(|| invalid_argument(DYNAMIC_LOOKUP_NAME, 0, "variable name", &args[0]))?;

        let case = args[1]
            .as_text()
            .ok_or_else(|| invalid_argument(DYNAMIC_LOOKUP_NAME, 1, "case symbol", &args[1]))?;
        let sensitive = match case {
            "case_sensitive" => true,
            "case_insensitive" => false,
            _ => return Err(invalid_argument(DYNAMIC_LOOKUP_NAME, 1, "case symbol", &args[1])),
        };

        // The order flag dictated how lowering arranged the candidates; the
        // scan itself is always left-to-right.
        let order = args[2]
            .as_text()
            .ok_or_else(|| invalid_argument(DYNAMIC_LOOKUP_NAME, 2, "order symbol", &args[2]))?;
        if order != "locals_then_globals" && order != "globals_then_locals" {
            return Err(invalid_argument(DYNAMIC_LOOKUP_NAME, 2, "order symbol", &args[2]));
        }

        for candidate in &args[3..] {
            let fields = match candidate.as_struct() {
                Some(fields) => fields,
                None => continue,
            };
            for (field, value) in fields {
                let matched = if sensitive {
                    field == name
                } else {
                    field.eq_ignore_ascii_case(name)
                };
                if matched {
                    return Ok(value.clone());
                }
            }
        }

        Err(BrambleError::new("Undefined variable").with_field("variable", name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strct(fields: &[(&str, i64)]) -> Value {
        Value::Strct(
            fields
                .iter()
                .map(|(n, v)| (n.to_string(), Value::Int64(*v)))
                .collect(),
        )
    }

    fn args(name: &str, case: &str, candidates: Vec<Value>) -> Vec<Value> {
        let mut out = vec![
            Value::Str(name.to_string()),
            Value::Sym(case.to_string()),
            Value::Sym("locals_then_globals".to_string()),
        ];
        out.extend(candidates);
        out
    }

    #[test]
    fn first_matching_candidate_wins() {
        let out = DynamicLookup
            .invoke(
                &args(
                    "x",
                    "case_insensitive",
                    vec![strct(&[("y", 1)]), strct(&[("X", 2)]), strct(&[("x", 3)])],
                ),
                EvalMode::Permissive,
            )
            .unwrap();
        assert_eq!(Value::Int64(2), out);
    }

    #[test]
    fn case_sensitive_skips_folded_match() {
        let out = DynamicLookup
            .invoke(
                &args(
                    "x",
                    "case_sensitive",
                    vec![strct(&[("X", 1)]), strct(&[("x", 2)])],
                ),
                EvalMode::Permissive,
            )
            .unwrap();
        assert_eq!(Value::Int64(2), out);
    }

    #[test]
    fn no_match_is_undefined_variable() {
        let err = DynamicLookup
            .invoke(
                &args("z", "case_sensitive", vec![strct(&[("x", 1)])]),
                EvalMode::Permissive,
            )
            .unwrap_err();
        assert!(err.to_string().contains("Undefined variable"));
    }

    #[test]
    fn non_struct_candidates_are_skipped() {
        let out = DynamicLookup
            .invoke(
                &args(
                    "x",
                    "case_sensitive",
                    vec![Value::Missing, Value::Int64(9), strct(&[("x", 1)])],
                ),
                EvalMode::Permissive,
            )
            .unwrap();
        assert_eq!(Value::Int64(1), out);
    }
}
