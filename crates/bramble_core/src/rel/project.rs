use super::{Binding, Rel, RelOp, RelType};
use crate::explain::{Explainable, ExplainEntry};
use crate::expr::Rex;
use crate::ident::Symbol;

/// Emits exactly one output tuple per input tuple, one binding per
/// projection expression in declared order. Never changes row cardinality.
#[derive(Debug, Clone, PartialEq)]
pub struct Project {
    pub input: Box<Rel>,
    pub projections: Vec<Rex>,
    pub names: Vec<Symbol>,
}

impl Project {
    pub fn new(input: Rel, projections: Vec<(Symbol, Rex)>) -> Rel {
        let mut names = Vec::with_capacity(projections.len());
        let mut exprs = Vec::with_capacity(projections.len());
        let mut schema = Vec::with_capacity(projections.len());
        for (name, rex) in projections {
            schema.push(Binding::new(name.clone(), rex.ty.clone()));
            names.push(name);
            exprs.push(rex);
        }

        // Projection preserves input row order.
        let mut ty = RelType::new(schema);
        ty.props = input.ty.props.clone();

        Rel::new(
            ty,
            RelOp::Project(Project {
                input: Box::new(input),
                projections: exprs,
                names,
            }),
        )
    }
}

impl Explainable for Project {
    fn explain_entry(&self, _verbose: bool) -> ExplainEntry {
        ExplainEntry::new("Project").with_values("projections", self.projections.iter())
    }
}
