use std::fmt;

use crate::ident::Symbol;

/// One hop of a path navigation.
#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    /// Positional index into a list/sexp; negative indexes from the end.
    Index(i64),
    /// Field lookup under the symbol's case rule.
    Key(Symbol),
    /// Fan out over all elements of a collection.
    Wildcard,
    /// Fan out over all field values of a struct.
    Unpivot,
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "[{i}]"),
            Self::Key(sym) => write!(f, ".{sym}"),
            Self::Wildcard => write!(f, "[*]"),
            Self::Unpivot => write!(f, ".*"),
        }
    }
}
