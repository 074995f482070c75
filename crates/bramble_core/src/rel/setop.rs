use std::fmt;

use super::{Rel, RelOp, RelType};
use crate::explain::{Explainable, ExplainEntry};
use crate::functions::aggregate::SetQuantifier;
use crate::types::StaticType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpKind {
    Union,
    Intersect,
    Except,
}

impl fmt::Display for SetOpKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Union => write!(f, "UNION"),
            Self::Intersect => write!(f, "INTERSECT"),
            Self::Except => write!(f, "EXCEPT"),
        }
    }
}

/// Set operation over positionally aligned schemas.
///
/// The output schema takes the left side's binding names; each column type is
/// the union of the two sides' types at that position. A schema arity
/// mismatch becomes an `Err` operator, not a construction failure.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOp {
    pub kind: SetOpKind,
    pub lhs: Box<Rel>,
    pub rhs: Box<Rel>,
    pub quantifier: SetQuantifier,
}

impl SetOp {
    pub fn new(kind: SetOpKind, lhs: Rel, rhs: Rel, quantifier: SetQuantifier) -> Rel {
        if lhs.schema().len() != rhs.schema().len() {
            return Rel::error(format!(
                "Schema arity mismatch in {kind}: left has {} bindings, right has {}",
                lhs.schema().len(),
                rhs.schema().len(),
            ));
        }

        let schema = lhs
            .schema()
            .iter()
            .zip(rhs.schema().iter())
            .map(|(l, r)| {
                let ty = StaticType::union_of([l.ty.clone(), r.ty.clone()]);
                super::Binding::new(l.name.clone(), ty)
            })
            .collect();

        Rel::new(
            RelType::new(schema),
            RelOp::SetOp(SetOp {
                kind,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
                quantifier,
            }),
        )
    }
}

impl Explainable for SetOp {
    fn explain_entry(&self, _verbose: bool) -> ExplainEntry {
        ExplainEntry::new("SetOp")
            .with_value("kind", self.kind)
            .with_value("quantifier", self.quantifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::Rex;
    use crate::ident::Symbol;
    use crate::rel::scan::Scan;
    use crate::values::Value;

    fn scan(alias: &str) -> Rel {
        Scan::new(Rex::lit(Value::Bag(Vec::new())), Symbol::insensitive(alias))
    }

    #[test]
    fn arity_mismatch_becomes_err_op() {
        let lhs = scan("a");
        let rhs = crate::rel::scan::ScanIndexed::new(
            Rex::lit(Value::Bag(Vec::new())),
            Symbol::insensitive("b"),
            Symbol::insensitive("i"),
        );
        let rel = SetOp::new(SetOpKind::Union, lhs, rhs, SetQuantifier::All);
        assert!(matches!(rel.op, RelOp::Err { .. }));
        assert!(rel.has_errors());
    }

    #[test]
    fn schema_takes_left_names() {
        let rel = SetOp::new(
            SetOpKind::Except,
            scan("left"),
            scan("right"),
            SetQuantifier::Distinct,
        );
        assert_eq!("left", rel.schema()[0].name.text());
    }
}
