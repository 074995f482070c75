//! The typed relational algebra IR.
//!
//! A `Rel` pairs an operator with the schema it emits and the physical
//! properties it guarantees. Schema order is positional and semantically
//! significant; join and set-operation alignment is by position, never by
//! name.

pub mod aggregate;
pub mod distinct;
pub mod exclude;
pub mod filter;
pub mod join;
pub mod limit;
pub mod project;
pub mod scan;
pub mod setop;
pub mod sort;

use std::collections::BTreeSet;
use std::fmt;

use aggregate::Aggregate;
use distinct::Distinct;
use exclude::Exclude;
use filter::Filter;
use join::Join;
use limit::{Limit, Offset};
use project::Project;
use scan::{Scan, ScanIndexed, Unpivot};
use setop::SetOp;
use sort::Sort;

use crate::explain::{Explainable, ExplainEntry};
use crate::expr::Rex;
use crate::ident::Symbol;
use crate::types::StaticType;

/// One named, typed output column of an operator.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: Symbol,
    pub ty: StaticType,
}

impl Binding {
    pub fn new(name: Symbol, ty: StaticType) -> Self {
        Binding { name, ty }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.ty)
    }
}

/// Physical properties an operator guarantees about its output, consumed by
/// the executor for optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RelProp {
    /// Output row order is meaningful and must be preserved.
    Ordered,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RelType {
    pub schema: Vec<Binding>,
    pub props: BTreeSet<RelProp>,
}

impl RelType {
    pub fn new(schema: Vec<Binding>) -> Self {
        RelType {
            schema,
            props: BTreeSet::new(),
        }
    }

    pub fn with_prop(mut self, prop: RelProp) -> Self {
        self.props.insert(prop);
        self
    }

    pub fn is_ordered(&self) -> bool {
        self.props.contains(&RelProp::Ordered)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rel {
    pub ty: RelType,
    pub op: RelOp,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RelOp {
    Scan(Scan),
    ScanIndexed(ScanIndexed),
    Unpivot(Unpivot),
    Distinct(Distinct),
    Filter(Filter),
    Project(Project),
    Sort(Sort),
    Limit(Limit),
    Offset(Offset),
    SetOp(SetOp),
    Join(Join),
    Aggregate(Aggregate),
    Exclude(Exclude),
    /// A malformed operator; construction never throws, the executor refuses
    /// trees containing this.
    Err {
        message: String,
    },
}

impl Rel {
    pub fn new(ty: RelType, op: RelOp) -> Self {
        Rel { ty, op }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Rel {
            ty: RelType::default(),
            op: RelOp::Err {
                message: message.into(),
            },
        }
    }

    pub fn schema(&self) -> &[Binding] {
        &self.ty.schema
    }

    /// Direct child operators.
    pub fn children(&self) -> Vec<&Rel> {
        match &self.op {
            RelOp::Scan(_) | RelOp::ScanIndexed(_) | RelOp::Unpivot(_) | RelOp::Err { .. } => {
                Vec::new()
            }
            RelOp::Distinct(n) => vec![&n.input],
            RelOp::Filter(n) => vec![&n.input],
            RelOp::Project(n) => vec![&n.input],
            RelOp::Sort(n) => vec![&n.input],
            RelOp::Limit(n) => vec![&n.input],
            RelOp::Offset(n) => vec![&n.input],
            RelOp::SetOp(n) => vec![&n.lhs, &n.rhs],
            RelOp::Join(n) => vec![&n.lhs, &n.rhs],
            RelOp::Aggregate(n) => vec![&n.input],
            RelOp::Exclude(n) => vec![&n.input],
        }
    }

    /// Visit each expression held directly by this operator.
    pub fn for_each_rex(&self, f: &mut impl FnMut(&Rex)) {
        match &self.op {
            RelOp::Scan(n) => f(&n.rex),
            RelOp::ScanIndexed(n) => f(&n.rex),
            RelOp::Unpivot(n) => f(&n.rex),
            RelOp::Distinct(_) | RelOp::Err { .. } => {}
            RelOp::Filter(n) => f(&n.predicate),
            RelOp::Project(n) => {
                for p in &n.projections {
                    f(p);
                }
            }
            RelOp::Sort(n) => {
                for spec in &n.specs {
                    f(&spec.key);
                }
            }
            RelOp::Limit(n) => f(&n.limit),
            RelOp::Offset(n) => f(&n.offset),
            RelOp::SetOp(_) => {}
            RelOp::Join(n) => f(&n.condition),
            RelOp::Aggregate(n) => {
                for key in &n.group_keys {
                    f(key);
                }
                for call in &n.calls {
                    for arg in &call.args {
                        f(arg);
                    }
                }
            }
            RelOp::Exclude(_) => {}
        }
    }

    /// Collect every `Err` message in this subtree, operators and
    /// expressions both.
    pub fn collect_errors(&self, out: &mut Vec<String>) {
        if let RelOp::Err { message } = &self.op {
            out.push(message.clone());
        }
        self.for_each_rex(&mut |rex| rex.collect_errors(out));
        for child in self.children() {
            child.collect_errors(out);
        }
    }

    pub fn has_errors(&self) -> bool {
        let mut errors = Vec::new();
        self.collect_errors(&mut errors);
        !errors.is_empty()
    }
}

impl Explainable for Rel {
    fn explain_entry(&self, verbose: bool) -> ExplainEntry {
        let mut entry = match &self.op {
            RelOp::Scan(n) => n.explain_entry(verbose),
            RelOp::ScanIndexed(n) => n.explain_entry(verbose),
            RelOp::Unpivot(n) => n.explain_entry(verbose),
            RelOp::Distinct(n) => n.explain_entry(verbose),
            RelOp::Filter(n) => n.explain_entry(verbose),
            RelOp::Project(n) => n.explain_entry(verbose),
            RelOp::Sort(n) => n.explain_entry(verbose),
            RelOp::Limit(n) => n.explain_entry(verbose),
            RelOp::Offset(n) => n.explain_entry(verbose),
            RelOp::SetOp(n) => n.explain_entry(verbose),
            RelOp::Join(n) => n.explain_entry(verbose),
            RelOp::Aggregate(n) => n.explain_entry(verbose),
            RelOp::Exclude(n) => n.explain_entry(verbose),
            RelOp::Err { message } => ExplainEntry::new("Err").with_value("message", message),
        };
        if verbose {
            entry = entry.with_values("schema", self.ty.schema.iter());
        }
        entry
    }
}

/// Render a plan tree with indentation, one entry per operator.
pub fn format_tree(rel: &Rel, verbose: bool) -> String {
    fn walk(rel: &Rel, depth: usize, verbose: bool, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&rel.explain_entry(verbose).to_string());
        out.push('\n');
        for child in rel.children() {
            walk(child, depth + 1, verbose, out);
        }
    }
    let mut out = String::new();
    walk(rel, 0, verbose, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::values::Value;

    #[test]
    fn format_tree_indents_children() {
        let scan = scan::Scan::new(
            Rex::lit(Value::Bag(Vec::new())),
            Symbol::insensitive("x"),
        );
        let rel = distinct::Distinct::new(filter::Filter::new(
            scan,
            Rex::lit(Value::Bool(true)),
        ));
        let text = format_tree(&rel, false);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!("Distinct", lines[0]);
        assert!(lines[1].starts_with("  Filter"));
        assert!(lines[2].starts_with("    Scan"));
    }

    #[test]
    fn collect_errors_crosses_operators_and_exprs() {
        let rel = filter::Filter::new(
            scan::Scan::new(Rex::error("inner"), Symbol::insensitive("x")),
            Rex::error("outer"),
        );
        let mut errors = Vec::new();
        rel.collect_errors(&mut errors);
        assert_eq!(vec!["outer".to_string(), "inner".to_string()], errors);
    }
}
