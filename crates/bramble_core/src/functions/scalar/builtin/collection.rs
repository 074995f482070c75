//! Collection aggregates in scalar position: fold a single collection value
//! using the aggregate accumulators.
//!
//! The first argument is the quantifier, 'all' or 'distinct'.

use bramble_error::{BrambleError, Result};

use super::invalid_argument;
use crate::eval::EvalMode;
use crate::functions::Signature;
use crate::functions::aggregate::builtin::{Avg, Count, MinMax, Sum};
use crate::functions::aggregate::{Accumulator, AggregateFunction, DistinctAccumulator};
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::function_set::ScalarFunctionSet;
use crate::functions::scalar::{RawScalarFunction, ScalarFunction};
use crate::types::TypeId;
use crate::values::Value;

const SIG_COLL: Signature =
    Signature::new(&[TypeId::Str, TypeId::Dynamic], TypeId::Dynamic);

pub const FUNCTION_SET_COLL_COUNT: ScalarFunctionSet = ScalarFunctionSet {
    name: "coll_count",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Collection,
        description: "Count the elements of a collection that are neither null nor missing.",
        arguments: &["quantifier", "collection"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(&SIG_COLL, &CollAgg::COUNT)],
};

pub const FUNCTION_SET_COLL_SUM: ScalarFunctionSet = ScalarFunctionSet {
    name: "coll_sum",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Collection,
        description: "Sum the elements of a collection.",
        arguments: &["quantifier", "collection"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(&SIG_COLL, &CollAgg::SUM)],
};

pub const FUNCTION_SET_COLL_AVG: ScalarFunctionSet = ScalarFunctionSet {
    name: "coll_avg",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Collection,
        description: "Average the elements of a collection.",
        arguments: &["quantifier", "collection"],
        example: Some(Example {
            example: "coll_avg('distinct', [1, 1, 2])",
            output: "1.5",
        }),
    }],
    functions: &[RawScalarFunction::new(&SIG_COLL, &CollAgg::AVG)],
};

pub const FUNCTION_SET_COLL_MIN: ScalarFunctionSet = ScalarFunctionSet {
    name: "coll_min",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Collection,
        description: "Smallest element of a collection.",
        arguments: &["quantifier", "collection"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(&SIG_COLL, &CollAgg::MIN)],
};

pub const FUNCTION_SET_COLL_MAX: ScalarFunctionSet = ScalarFunctionSet {
    name: "coll_max",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Collection,
        description: "Largest element of a collection.",
        arguments: &["quantifier", "collection"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(&SIG_COLL, &CollAgg::MAX)],
};

#[derive(Debug, Clone, Copy)]
pub struct CollAgg {
    name: &'static str,
    agg: &'static dyn AggregateFunction,
}

impl CollAgg {
    pub const COUNT: CollAgg = CollAgg {
        name: "coll_count",
        agg: &Count,
    };
    pub const SUM: CollAgg = CollAgg {
        name: "coll_sum",
        agg: &Sum,
    };
    pub const AVG: CollAgg = CollAgg {
        name: "coll_avg",
        agg: &Avg,
    };
    pub const MIN: CollAgg = CollAgg {
        name: "coll_min",
        agg: &MinMax::MIN,
    };
    pub const MAX: CollAgg = CollAgg {
        name: "coll_max",
        agg: &MinMax::MAX,
    };
}

impl ScalarFunction for CollAgg {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        let quantifier = args[0]
            .as_text()
            .ok_or_else(|| invalid_argument(self.name, 0, "quantifier string", &args[0]))?;
        let distinct = match quantifier.to_ascii_lowercase().as_str() {
            "all" => false,
            "distinct" => true,
            _ => {
                return Err(BrambleError::new("Unknown quantifier")
                    .with_field("function", self.name)
                    .with_field("quantifier", quantifier.to_string()));
            }
        };

        let elements = args[1]
            .as_collection()
            .ok_or_else(|| invalid_argument(self.name, 1, "collection", &args[1]))?;

        let mut acc: Box<dyn Accumulator> = self.agg.new_accumulator();
        if distinct {
            acc = Box::new(DistinctAccumulator::new(acc));
        }
        for element in elements {
            if element.is_absent() {
                continue;
            }
            acc.update(element)?;
        }
        acc.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn list(vals: &[i64]) -> Value {
        Value::List(vals.iter().map(|v| Value::Int64(*v)).collect())
    }

    #[test]
    fn coll_avg_distinct_dedupes() {
        let out = CollAgg::AVG
            .invoke(
                &[Value::Str("distinct".into()), list(&[1, 1, 2])],
                EvalMode::Strict,
            )
            .unwrap();
        assert_eq!(Value::Float64(1.5), out);
    }

    #[test]
    fn coll_avg_all_keeps_duplicates() {
        let out = CollAgg::AVG
            .invoke(
                &[Value::Str("all".into()), list(&[1, 1, 2, 2])],
                EvalMode::Strict,
            )
            .unwrap();
        assert_eq!(Value::Float64(1.5), out);
    }

    #[test]
    fn coll_count_skips_absent_elements() {
        let coll = Value::Bag(vec![Value::Int64(1), Value::Null, Value::Missing]);
        let out = CollAgg::COUNT
            .invoke(&[Value::Str("all".into()), coll], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Int64(1), out);
    }

    #[test]
    fn non_collection_is_typed_error() {
        let err = CollAgg::SUM
            .invoke(
                &[Value::Str("all".into()), Value::Int64(3)],
                EvalMode::Strict,
            )
            .unwrap_err();
        assert!(err.to_string().contains("coll_sum"));
    }
}
