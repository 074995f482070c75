//! Built-in aggregate functions.
//!
//! Accumulators only see data values; null/missing inputs are filtered by the
//! caller. An empty fold finishes to null (count finishes to 0).

use std::cmp::Ordering;

use bramble_error::Result;

use super::{Accumulator, AggregateFunction, RawAggregateFunction};
use crate::functions::Signature;
use crate::functions::documentation::{Category, Documentation};
use crate::functions::function_set::AggregateFunctionSet;
use crate::functions::scalar::builtin::numeric::num_add;
use crate::types::TypeId;
use crate::values::{Value, compare};

/// Every built-in aggregate function set; the catalog registers these.
pub const ALL_AGGREGATE_FUNCTION_SETS: &[&AggregateFunctionSet] = &[
    &FUNCTION_SET_COUNT,
    &FUNCTION_SET_SUM,
    &FUNCTION_SET_AVG,
    &FUNCTION_SET_MIN,
    &FUNCTION_SET_MAX,
    &FUNCTION_SET_ANY,
    &FUNCTION_SET_EVERY,
];

const SIG_ANY_IN: Signature = Signature::new(&[TypeId::Dynamic], TypeId::Dynamic);

pub const FUNCTION_SET_COUNT: AggregateFunctionSet = AggregateFunctionSet {
    name: "count",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Aggregate,
        description: "Count of inputs that are neither null nor missing.",
        arguments: &["input"],
        example: None,
    }],
    functions: &[RawAggregateFunction::new(
        &Signature::new(&[TypeId::Dynamic], TypeId::Int64),
        &Count,
    )],
};

pub const FUNCTION_SET_SUM: AggregateFunctionSet = AggregateFunctionSet {
    name: "sum",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Aggregate,
        description: "Sum of numeric inputs.",
        arguments: &["input"],
        example: None,
    }],
    functions: &[RawAggregateFunction::new(&SIG_ANY_IN, &Sum)],
};

pub const FUNCTION_SET_AVG: AggregateFunctionSet = AggregateFunctionSet {
    name: "avg",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Aggregate,
        description: "Arithmetic mean of numeric inputs.",
        arguments: &["input"],
        example: None,
    }],
    functions: &[RawAggregateFunction::new(
        &Signature::new(&[TypeId::Dynamic], TypeId::Float64),
        &Avg,
    )],
};

pub const FUNCTION_SET_MIN: AggregateFunctionSet = AggregateFunctionSet {
    name: "min",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Aggregate,
        description: "Smallest input value.",
        arguments: &["input"],
        example: None,
    }],
    functions: &[RawAggregateFunction::new(&SIG_ANY_IN, &MinMax::MIN)],
};

pub const FUNCTION_SET_MAX: AggregateFunctionSet = AggregateFunctionSet {
    name: "max",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Aggregate,
        description: "Largest input value.",
        arguments: &["input"],
        example: None,
    }],
    functions: &[RawAggregateFunction::new(&SIG_ANY_IN, &MinMax::MAX)],
};

pub const FUNCTION_SET_ANY: AggregateFunctionSet = AggregateFunctionSet {
    name: "any",
    aliases: &["some"],
    doc: &[&Documentation {
        category: Category::Aggregate,
        description: "True if any input is true.",
        arguments: &["input"],
        example: None,
    }],
    functions: &[RawAggregateFunction::new(
        &Signature::new(&[TypeId::Bool], TypeId::Bool),
        &BoolAgg::ANY,
    )],
};

pub const FUNCTION_SET_EVERY: AggregateFunctionSet = AggregateFunctionSet {
    name: "every",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::Aggregate,
        description: "True if every input is true.",
        arguments: &["input"],
        example: None,
    }],
    functions: &[RawAggregateFunction::new(
        &Signature::new(&[TypeId::Bool], TypeId::Bool),
        &BoolAgg::EVERY,
    )],
};

#[derive(Debug, Clone, Copy)]
pub struct Count;

impl AggregateFunction for Count {
    fn new_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(CountState::default())
    }
}

#[derive(Debug, Default)]
pub struct CountState {
    count: i64,
}

impl Accumulator for CountState {
    fn update(&mut self, _value: &Value) -> Result<()> {
        self.count += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<Value> {
        Ok(Value::Int64(self.count))
    }

    fn partial(&mut self) -> Result<Value> {
        Ok(Value::Strct(vec![(
            "count".to_string(),
            Value::Int64(self.count),
        )]))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Sum;

impl AggregateFunction for Sum {
    fn new_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(SumState::default())
    }
}

#[derive(Debug, Default)]
pub struct SumState {
    sum: Option<Value>,
}

impl Accumulator for SumState {
    fn update(&mut self, value: &Value) -> Result<()> {
        self.sum = Some(match self.sum.take() {
            Some(acc) => num_add(&acc, value)?,
            None => num_add(&Value::Int64(0), value)?,
        });
        Ok(())
    }

    fn finish(&mut self) -> Result<Value> {
        Ok(self.sum.take().unwrap_or(Value::Null))
    }

    fn partial(&mut self) -> Result<Value> {
        let sum = self.sum.take().unwrap_or(Value::Null);
        Ok(Value::Strct(vec![("sum".to_string(), sum)]))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Avg;

impl AggregateFunction for Avg {
    fn new_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(AvgState::default())
    }
}

#[derive(Debug, Default)]
pub struct AvgState {
    sum: SumState,
    count: i64,
}

impl Accumulator for AvgState {
    fn update(&mut self, value: &Value) -> Result<()> {
        self.sum.update(value)?;
        self.count += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<Value> {
        if self.count == 0 {
            return Ok(Value::Null);
        }
        let sum = match self.sum.finish()? {
            Value::Int8(i) => i as f64,
            Value::Int16(i) => i as f64,
            Value::Int32(i) => i as f64,
            Value::Int64(i) => i as f64,
            Value::Int(i) => i as f64,
            Value::Decimal(d) => d.to_f64(),
            Value::Float32(f) => f as f64,
            Value::Float64(f) => f,
            _ => return Ok(Value::Null),
        };
        Ok(Value::Float64(sum / self.count as f64))
    }

    fn partial(&mut self) -> Result<Value> {
        let sum = self.sum.sum.take().unwrap_or(Value::Null);
        Ok(Value::Strct(vec![
            ("sum".to_string(), sum),
            ("count".to_string(), Value::Int64(self.count)),
        ]))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MinMax {
    keep: Ordering,
}

impl MinMax {
    pub const MIN: MinMax = MinMax {
        keep: Ordering::Less,
    };
    pub const MAX: MinMax = MinMax {
        keep: Ordering::Greater,
    };
}

impl AggregateFunction for MinMax {
    fn new_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(MinMaxState {
            keep: self.keep,
            best: None,
        })
    }
}

#[derive(Debug)]
pub struct MinMaxState {
    keep: Ordering,
    best: Option<Value>,
}

impl Accumulator for MinMaxState {
    fn update(&mut self, value: &Value) -> Result<()> {
        match &self.best {
            None => self.best = Some(value.clone()),
            Some(best) => {
                if compare(value, best) == Some(self.keep) {
                    self.best = Some(value.clone());
                }
            }
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<Value> {
        Ok(self.best.take().unwrap_or(Value::Null))
    }

    fn partial(&mut self) -> Result<Value> {
        let best = self.best.take().unwrap_or(Value::Null);
        Ok(Value::Strct(vec![("best".to_string(), best)]))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct BoolAgg {
    every: bool,
}

impl BoolAgg {
    pub const ANY: BoolAgg = BoolAgg { every: false };
    pub const EVERY: BoolAgg = BoolAgg { every: true };
}

impl AggregateFunction for BoolAgg {
    fn new_accumulator(&self) -> Box<dyn Accumulator> {
        Box::new(BoolAggState {
            every: self.every,
            result: self.every,
            valid: false,
        })
    }
}

#[derive(Debug)]
pub struct BoolAggState {
    every: bool,
    result: bool,
    valid: bool,
}

impl Accumulator for BoolAggState {
    fn update(&mut self, value: &Value) -> Result<()> {
        let b = matches!(value, Value::Bool(true));
        self.result = if self.every {
            self.result && b
        } else {
            self.result || b
        };
        self.valid = true;
        Ok(())
    }

    fn finish(&mut self) -> Result<Value> {
        if self.valid {
            Ok(Value::Bool(self.result))
        } else {
            Ok(Value::Null)
        }
    }

    fn partial(&mut self) -> Result<Value> {
        Ok(Value::Strct(vec![
            ("result".to_string(), Value::Bool(self.result)),
            ("valid".to_string(), Value::Bool(self.valid)),
        ]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::aggregate::DistinctAccumulator;

    #[test]
    fn sum_stays_exact_for_integers() {
        let mut acc = Sum.new_accumulator();
        for v in [Value::Int64(1), Value::Int32(2), Value::Int64(3)] {
            acc.update(&v).unwrap();
        }
        assert_eq!(Value::Int64(6), acc.finish().unwrap());
    }

    #[test]
    fn empty_sum_is_null_empty_count_is_zero() {
        assert_eq!(Value::Null, Sum.new_accumulator().finish().unwrap());
        assert_eq!(Value::Int64(0), Count.new_accumulator().finish().unwrap());
    }

    #[test]
    fn distinct_avg_dedupes_before_folding() {
        let mut acc = DistinctAccumulator::new(Avg.new_accumulator());
        for v in [Value::Int64(1), Value::Int64(1), Value::Int64(2)] {
            acc.update(&v).unwrap();
        }
        assert_eq!(Value::Float64(1.5), acc.finish().unwrap());
    }

    #[test]
    fn min_max_across_widths() {
        let mut min = MinMax::MIN.new_accumulator();
        let mut max = MinMax::MAX.new_accumulator();
        for v in [Value::Float64(2.5), Value::Int64(1), Value::Int64(4)] {
            min.update(&v).unwrap();
            max.update(&v).unwrap();
        }
        assert_eq!(Value::Int64(1), min.finish().unwrap());
        assert_eq!(Value::Int64(4), max.finish().unwrap());
    }

    #[test]
    fn avg_partial_state_carries_sum_and_count() {
        let mut acc = Avg.new_accumulator();
        acc.update(&Value::Int64(2)).unwrap();
        acc.update(&Value::Int64(4)).unwrap();
        let partial = acc.partial().unwrap();
        let fields = partial.as_struct().unwrap();
        assert_eq!(("sum".to_string(), Value::Int64(6)), fields[0]);
        assert_eq!(("count".to_string(), Value::Int64(2)), fields[1]);
    }

    #[test]
    fn every_requires_all_true() {
        let mut acc = BoolAgg::EVERY.new_accumulator();
        acc.update(&Value::Bool(true)).unwrap();
        acc.update(&Value::Bool(false)).unwrap();
        assert_eq!(Value::Bool(false), acc.finish().unwrap());
    }
}
