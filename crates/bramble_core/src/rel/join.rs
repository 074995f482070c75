use std::fmt;

use super::{Rel, RelOp, RelType};
use crate::explain::{Explainable, ExplainEntry};
use crate::expr::Rex;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

impl fmt::Display for JoinType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => write!(f, "INNER"),
            Self::Left => write!(f, "LEFT"),
            Self::Right => write!(f, "RIGHT"),
            Self::Full => write!(f, "FULL"),
        }
    }
}

/// Joins two tuple streams; output schema is the left bindings followed by
/// the right bindings. The condition collapses three-valued: only true
/// matches. LEFT/RIGHT pad the unmatched side with an all-missing tuple and
/// FULL does both.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub lhs: Box<Rel>,
    pub rhs: Box<Rel>,
    pub condition: Rex,
    pub join_type: JoinType,
}

impl Join {
    pub fn new(lhs: Rel, rhs: Rel, condition: Rex, join_type: JoinType) -> Rel {
        let mut schema = lhs.schema().to_vec();
        schema.extend(rhs.schema().iter().cloned());

        Rel::new(
            RelType::new(schema),
            RelOp::Join(Join {
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                condition,
                join_type,
            }),
        )
    }
}

impl Explainable for Join {
    fn explain_entry(&self, _verbose: bool) -> ExplainEntry {
        ExplainEntry::new("Join")
            .with_value("type", self.join_type)
            .with_value("condition", &self.condition)
    }
}
