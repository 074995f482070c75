use super::{Rel, RelOp};
use crate::explain::{Explainable, ExplainEntry};
use crate::expr::Rex;

/// Keeps rows where the predicate is exactly boolean true; false, null, and
/// missing all drop the row.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub input: Box<Rel>,
    pub predicate: Rex,
}

impl Filter {
    pub fn new(input: Rel, predicate: Rex) -> Rel {
        let ty = input.ty.clone();
        Rel::new(
            ty,
            RelOp::Filter(Filter {
                input: Box::new(input),
                predicate,
            }),
        )
    }
}

impl Explainable for Filter {
    fn explain_entry(&self, _verbose: bool) -> ExplainEntry {
        ExplainEntry::new("Filter").with_value("predicate", &self.predicate)
    }
}
