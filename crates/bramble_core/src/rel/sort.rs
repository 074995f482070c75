use std::fmt;

use super::{Rel, RelOp, RelProp};
use crate::explain::{Explainable, ExplainEntry};
use crate::expr::Rex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullOrder {
    First,
    Last,
}

/// One sort key with its direction and null placement.
#[derive(Debug, Clone, PartialEq)]
pub struct SortSpec {
    pub key: Rex,
    pub order: SortOrder,
    pub nulls: NullOrder,
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let order = match self.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        let nulls = match self.nulls {
            NullOrder::First => "NULLS FIRST",
            NullOrder::Last => "NULLS LAST",
        };
        write!(f, "{} {order} {nulls}", self.key)
    }
}

/// Total order over the specs, applied in listed priority order. The sort is
/// stable: rows equal under every spec keep their input order.
#[derive(Debug, Clone, PartialEq)]
pub struct Sort {
    pub input: Box<Rel>,
    pub specs: Vec<SortSpec>,
}

impl Sort {
    pub fn new(input: Rel, specs: Vec<SortSpec>) -> Rel {
        let ty = input.ty.clone().with_prop(RelProp::Ordered);
        Rel::new(
            ty,
            RelOp::Sort(Sort {
                input: Box::new(input),
                specs,
            }),
        )
    }
}

impl Explainable for Sort {
    fn explain_entry(&self, _verbose: bool) -> ExplainEntry {
        ExplainEntry::new("Sort").with_values("specs", self.specs.iter())
    }
}
