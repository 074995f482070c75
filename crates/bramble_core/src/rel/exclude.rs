use std::fmt;

use super::{Rel, RelOp};
use crate::explain::{Explainable, ExplainEntry};
use crate::ident::Symbol;

/// One hop of an exclusion path.
#[derive(Debug, Clone, PartialEq)]
pub enum ExcludeStep {
    /// Remove or descend into the named struct field.
    Attr(Symbol),
    /// Remove or descend into the element at this position.
    Pos(i64),
    /// Apply the remaining suffix to every struct field.
    StructWildcard,
    /// Apply the remaining suffix to every collection element.
    CollectionWildcard,
}

impl fmt::Display for ExcludeStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attr(sym) => write!(f, ".{sym}"),
            Self::Pos(i) => write!(f, "[{i}]"),
            Self::StructWildcard => write!(f, ".*"),
            Self::CollectionWildcard => write!(f, "[*]"),
        }
    }
}

/// Root binding of an exclusion path.
#[derive(Debug, Clone, PartialEq)]
pub enum ExcludeRoot {
    /// As written; exclude-path resolution binds this against the schema.
    Unresolved(Symbol),
    /// Bound to a schema slot.
    Resolved(usize),
}

/// Steps apply left to right from the rooted binding; a wildcard fans out to
/// every matching child before the remaining suffix applies to each.
#[derive(Debug, Clone, PartialEq)]
pub struct ExcludeItem {
    pub root: ExcludeRoot,
    pub steps: Vec<ExcludeStep>,
}

impl fmt::Display for ExcludeItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.root {
            ExcludeRoot::Unresolved(sym) => write!(f, "{sym}")?,
            ExcludeRoot::Resolved(slot) => write!(f, "${slot}")?,
        }
        for step in &self.steps {
            write!(f, "{step}")?;
        }
        Ok(())
    }
}

/// Structurally deletes the paths named by `items` from each row. Removal is
/// destructive: the field is gone from the output value, not nulled out.
#[derive(Debug, Clone, PartialEq)]
pub struct Exclude {
    pub input: Box<Rel>,
    pub items: Vec<ExcludeItem>,
}

impl Exclude {
    pub fn new(input: Rel, items: Vec<ExcludeItem>) -> Rel {
        let ty = input.ty.clone();
        Rel::new(
            ty,
            RelOp::Exclude(Exclude {
                input: Box::new(input),
                items,
            }),
        )
    }
}

impl Explainable for Exclude {
    fn explain_entry(&self, _verbose: bool) -> ExplainEntry {
        ExplainEntry::new("Exclude").with_values("items", self.items.iter())
    }
}
