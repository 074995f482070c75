use super::{Rel, RelOp};
use crate::explain::{Explainable, ExplainEntry};

/// Removes duplicate rows under structural value equality; struct field order
/// does not make two rows distinct. First occurrence wins, so input order
/// carries through for the survivors.
#[derive(Debug, Clone, PartialEq)]
pub struct Distinct {
    pub input: Box<Rel>,
}

impl Distinct {
    pub fn new(input: Rel) -> Rel {
        let ty = input.ty.clone();
        Rel::new(
            ty,
            RelOp::Distinct(Distinct {
                input: Box::new(input),
            }),
        )
    }
}

impl Explainable for Distinct {
    fn explain_entry(&self, _verbose: bool) -> ExplainEntry {
        ExplainEntry::new("Distinct")
    }
}
