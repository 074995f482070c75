pub mod builtin;

use std::fmt;

use ahash::RandomState;
use bramble_error::Result;

use super::Signature;
use super::function_set::FunctionInfo;
use crate::types::StaticType;
use crate::values::Value;

/// ALL keeps duplicates, DISTINCT de-duplicates inputs before folding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SetQuantifier {
    #[default]
    All,
    Distinct,
}

impl fmt::Display for SetQuantifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "ALL"),
            Self::Distinct => write!(f, "DISTINCT"),
        }
    }
}

/// Per-group fold state.
///
/// Null and missing inputs are skipped by the caller before `update` is
/// reached; accumulators only ever see data values.
pub trait Accumulator: fmt::Debug {
    fn update(&mut self, value: &Value) -> Result<()>;

    /// Finish the fold into the final value.
    fn finish(&mut self) -> Result<Value>;

    /// Finish into partial state (a struct of the accumulator's fields)
    /// suitable for a later merge.
    fn partial(&mut self) -> Result<Value>;
}

/// An aggregate function overload, a factory for its accumulators.
pub trait AggregateFunction: fmt::Debug + Sync + Send {
    fn new_accumulator(&self) -> Box<dyn Accumulator>;
}

/// An aggregate function paired with the signature it implements.
#[derive(Debug, Clone, Copy)]
pub struct RawAggregateFunction {
    signature: &'static Signature,
    function: &'static dyn AggregateFunction,
}

impl RawAggregateFunction {
    pub const fn new(
        signature: &'static Signature,
        function: &'static dyn AggregateFunction,
    ) -> Self {
        RawAggregateFunction {
            signature,
            function,
        }
    }

    pub fn function(&self) -> &'static dyn AggregateFunction {
        self.function
    }
}

impl FunctionInfo for RawAggregateFunction {
    fn signature(&self) -> &Signature {
        self.signature
    }
}

impl PartialEq for RawAggregateFunction {
    fn eq(&self, other: &Self) -> bool {
        self.signature == other.signature
            && std::ptr::addr_eq(self.function as *const _, other.function as *const _)
    }
}

impl Eq for RawAggregateFunction {}

/// An aggregate as placed into an `Aggregate` operator by resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedAggregateFunction {
    pub name: &'static str,
    pub function: RawAggregateFunction,
    pub return_type: StaticType,
}

impl PlannedAggregateFunction {
    /// Accumulator for this call, honoring the quantifier.
    pub fn new_accumulator(&self, quantifier: SetQuantifier) -> Box<dyn Accumulator> {
        let inner = self.function.function().new_accumulator();
        match quantifier {
            SetQuantifier::All => inner,
            SetQuantifier::Distinct => Box::new(DistinctAccumulator::new(inner)),
        }
    }
}

impl fmt::Display for PlannedAggregateFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Wraps an accumulator with structural-equality de-duplication.
#[derive(Debug)]
pub struct DistinctAccumulator {
    seen: std::collections::HashSet<Value, RandomState>,
    inner: Box<dyn Accumulator>,
}

impl DistinctAccumulator {
    pub fn new(inner: Box<dyn Accumulator>) -> Self {
        DistinctAccumulator {
            seen: std::collections::HashSet::default(),
            inner,
        }
    }
}

impl Accumulator for DistinctAccumulator {
    fn update(&mut self, value: &Value) -> Result<()> {
        if self.seen.insert(value.clone()) {
            self.inner.update(value)?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<Value> {
        self.inner.finish()
    }

    fn partial(&mut self) -> Result<Value> {
        self.inner.partial()
    }
}
