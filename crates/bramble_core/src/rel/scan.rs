//! Leaf operators turning a collection-valued expression into a tuple stream.

use super::{Binding, Rel, RelOp, RelType};
use crate::explain::{Explainable, ExplainEntry};
use crate::expr::Rex;
use crate::ident::Symbol;
use crate::types::StaticType;

/// One binding per element of the scanned collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Scan {
    pub rex: Rex,
    pub alias: Symbol,
}

impl Scan {
    pub fn new(rex: Rex, alias: Symbol) -> Rel {
        let elem = element_type(&rex);
        let ty = RelType::new(vec![Binding::new(alias.clone(), elem)]);
        Rel::new(ty, RelOp::Scan(Scan { rex, alias }))
    }
}

impl Explainable for Scan {
    fn explain_entry(&self, _verbose: bool) -> ExplainEntry {
        ExplainEntry::new("Scan")
            .with_value("source", &self.rex)
            .with_value("alias", &self.alias)
    }
}

/// Like `Scan`, plus a zero-based ordinal binding per emitted tuple.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanIndexed {
    pub rex: Rex,
    pub alias: Symbol,
    pub index_alias: Symbol,
}

impl ScanIndexed {
    pub fn new(rex: Rex, alias: Symbol, index_alias: Symbol) -> Rel {
        let elem = element_type(&rex);
        let ty = RelType::new(vec![
            Binding::new(alias.clone(), elem),
            Binding::new(index_alias.clone(), StaticType::Int64),
        ]);
        Rel::new(
            ty,
            RelOp::ScanIndexed(ScanIndexed {
                rex,
                alias,
                index_alias,
            }),
        )
    }
}

impl Explainable for ScanIndexed {
    fn explain_entry(&self, _verbose: bool) -> ExplainEntry {
        ExplainEntry::new("ScanIndexed")
            .with_value("source", &self.rex)
            .with_value("alias", &self.alias)
            .with_value("index_alias", &self.index_alias)
    }
}

/// Turns the fields of a struct into (key, value) tuples. Scanning a
/// non-struct yields a single tuple with a synthetic key.
#[derive(Debug, Clone, PartialEq)]
pub struct Unpivot {
    pub rex: Rex,
    pub key_alias: Symbol,
    pub value_alias: Symbol,
}

impl Unpivot {
    pub fn new(rex: Rex, key_alias: Symbol, value_alias: Symbol) -> Rel {
        let ty = RelType::new(vec![
            Binding::new(key_alias.clone(), StaticType::Str),
            Binding::new(value_alias.clone(), StaticType::Dynamic),
        ]);
        Rel::new(
            ty,
            RelOp::Unpivot(Unpivot {
                rex,
                key_alias,
                value_alias,
            }),
        )
    }
}

impl Explainable for Unpivot {
    fn explain_entry(&self, _verbose: bool) -> ExplainEntry {
        ExplainEntry::new("Unpivot")
            .with_value("source", &self.rex)
            .with_value("key_alias", &self.key_alias)
            .with_value("value_alias", &self.value_alias)
    }
}

fn element_type(rex: &Rex) -> StaticType {
    rex.ty.element().cloned().unwrap_or(StaticType::Dynamic)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Value;

    #[test]
    fn scan_schema_uses_element_type() {
        let rex = Rex::new(
            StaticType::Bag(Some(Box::new(StaticType::Int64))),
            crate::expr::RexOp::Lit(Value::Bag(Vec::new())),
        );
        let rel = Scan::new(rex, Symbol::insensitive("x"));
        assert_eq!(1, rel.schema().len());
        assert_eq!(StaticType::Int64, rel.schema()[0].ty);
    }

    #[test]
    fn scan_indexed_adds_ordinal_binding() {
        let rel = ScanIndexed::new(
            Rex::lit(Value::List(Vec::new())),
            Symbol::insensitive("x"),
            Symbol::insensitive("i"),
        );
        assert_eq!(2, rel.schema().len());
        assert_eq!(StaticType::Int64, rel.schema()[1].ty);
    }
}
