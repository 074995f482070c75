use super::{Rel, RelOp};
use crate::explain::{Explainable, ExplainEntry};
use crate::expr::Rex;

/// Keeps at most the first N rows. Preserves input properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Limit {
    pub input: Box<Rel>,
    pub limit: Rex,
}

impl Limit {
    pub fn new(input: Rel, limit: Rex) -> Rel {
        let ty = input.ty.clone();
        Rel::new(
            ty,
            RelOp::Limit(Limit {
                input: Box::new(input),
                limit,
            }),
        )
    }
}

impl Explainable for Limit {
    fn explain_entry(&self, _verbose: bool) -> ExplainEntry {
        ExplainEntry::new("Limit").with_value("limit", &self.limit)
    }
}

/// Skips the first N rows. Preserves input properties.
#[derive(Debug, Clone, PartialEq)]
pub struct Offset {
    pub input: Box<Rel>,
    pub offset: Rex,
}

impl Offset {
    pub fn new(input: Rel, offset: Rex) -> Rel {
        let ty = input.ty.clone();
        Rel::new(
            ty,
            RelOp::Offset(Offset {
                input: Box::new(input),
                offset,
            }),
        )
    }
}

impl Explainable for Offset {
    fn explain_entry(&self, _verbose: bool) -> ExplainEntry {
        ExplainEntry::new("Offset").with_value("offset", &self.offset)
    }
}
