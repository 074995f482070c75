use std::fmt;

use super::{Binding, Rel, RelOp, RelType};
use crate::explain::{Explainable, ExplainEntry};
use crate::expr::Rex;
use crate::functions::aggregate::{PlannedAggregateFunction, SetQuantifier};
use crate::ident::Symbol;
use crate::types::StaticType;

/// Whether the fold runs to completion or stops at mergeable partial state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateStrategy {
    /// One finished row per distinct group.
    Full,
    /// One partial-state row per distinct group, for later merging.
    Partial,
}

/// An aggregate reference, resolved or not.
#[derive(Debug, Clone, PartialEq)]
pub enum AggExpr {
    Unresolved(Symbol),
    Resolved(PlannedAggregateFunction),
}

impl fmt::Display for AggExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unresolved(name) => write!(f, "{name}?"),
            Self::Resolved(func) => write!(f, "{func}"),
        }
    }
}

/// One aggregate call with its own argument expressions, evaluated per input
/// row before folding into this call's accumulator.
#[derive(Debug, Clone, PartialEq)]
pub struct AggCall {
    pub name: Symbol,
    pub agg: AggExpr,
    pub quantifier: SetQuantifier,
    pub args: Vec<Rex>,
}

impl fmt::Display for AggCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({}", self.agg, self.quantifier)?;
        for arg in &self.args {
            write!(f, ", {arg}")?;
        }
        write!(f, ")")
    }
}

/// Groups input rows by structural equality of the group keys and folds each
/// call's accumulator over its group.
///
/// Output schema: the group key bindings in order, then one binding per call.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    pub input: Box<Rel>,
    pub strategy: AggregateStrategy,
    pub calls: Vec<AggCall>,
    pub group_names: Vec<Symbol>,
    pub group_keys: Vec<Rex>,
}

impl Aggregate {
    pub fn new(
        input: Rel,
        strategy: AggregateStrategy,
        calls: Vec<AggCall>,
        group_keys: Vec<(Symbol, Rex)>,
    ) -> Rel {
        let mut schema = Vec::with_capacity(group_keys.len() + calls.len());
        let mut group_names = Vec::with_capacity(group_keys.len());
        let mut keys = Vec::with_capacity(group_keys.len());
        for (name, key) in group_keys {
            schema.push(Binding::new(name.clone(), key.ty.clone()));
            group_names.push(name);
            keys.push(key);
        }
        for call in &calls {
            let ty = match (&call.agg, strategy) {
                (AggExpr::Resolved(func), AggregateStrategy::Full) => func.return_type.clone(),
                // Partial state is a struct of accumulator fields.
                (AggExpr::Resolved(_), AggregateStrategy::Partial) => StaticType::Strct(None),
                (AggExpr::Unresolved(_), _) => StaticType::Dynamic,
            };
            schema.push(Binding::new(call.name.clone(), ty));
        }

        Rel::new(
            RelType::new(schema),
            RelOp::Aggregate(Aggregate {
                input: Box::new(input),
                strategy,
                calls,
                group_names,
                group_keys: keys,
            }),
        )
    }
}

impl Explainable for Aggregate {
    fn explain_entry(&self, _verbose: bool) -> ExplainEntry {
        ExplainEntry::new("Aggregate")
            .with_value(
                "strategy",
                match self.strategy {
                    AggregateStrategy::Full => "FULL",
                    AggregateStrategy::Partial => "PARTIAL",
                },
            )
            .with_values("calls", self.calls.iter())
            .with_values("group_keys", self.group_keys.iter())
    }
}
