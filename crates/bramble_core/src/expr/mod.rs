//! The typed expression IR.
//!
//! A `Rex` pairs an operator with the static type the resolver computed for
//! it. The IR layer never infers types itself; lowering supplies provisional
//! types and the resolver rebuilds nodes bottom-up with corrected ones.
//! Trees are immutable once built.

pub mod case;
pub mod path;

use std::fmt;

use case::CaseBranch;
use path::PathStep;

use crate::explain::{Explainable, ExplainEntry};
use crate::functions::candidate::CastType;
use crate::functions::scalar::PlannedScalarFunction;
use crate::ident::{QualifiedName, Symbol};
use crate::rel::Rel;
use crate::types::StaticType;
use crate::values::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Rex {
    pub ty: StaticType,
    pub op: RexOp,
}

/// Which scope family an unresolved variable was written against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VarScope {
    Local,
    Global,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollKind {
    List,
    Bag,
    Sexp,
}

/// How a subquery's output collapses into scalar position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubqueryCoercion {
    /// Single row, single binding, yielding that value.
    Scalar,
    /// Single row yielding a struct of the row's bindings.
    Row,
}

/// A resolved overload kept for runtime dispatch, with its coercion plan.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicCandidate {
    pub function: PlannedScalarFunction,
    pub casts: Vec<CastType>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RexOp {
    Lit(Value),
    /// A variable reference before resolution binds it.
    VarUnresolved {
        name: Symbol,
        scope: VarScope,
    },
    /// A variable bound to a slot in the runtime row.
    VarResolved {
        slot: usize,
    },
    /// Reference to a catalog global.
    Global {
        name: QualifiedName,
    },
    Path {
        root: Box<Rex>,
        steps: Vec<PathStep>,
    },
    /// A call before overload resolution.
    CallUnresolved {
        name: Symbol,
        args: Vec<Rex>,
    },
    /// A call statically resolved to one overload.
    CallStatic {
        func: PlannedScalarFunction,
        args: Vec<Rex>,
    },
    /// A call deferred to runtime dispatch over ranked candidates.
    CallDynamic {
        args: Vec<Rex>,
        candidates: Vec<DynamicCandidate>,
    },
    Cast {
        arg: Box<Rex>,
        target: StaticType,
    },
    Case {
        branches: Vec<CaseBranch>,
        default: Box<Rex>,
    },
    Coll {
        kind: CollKind,
        values: Vec<Rex>,
    },
    Strct {
        /// Key/value pairs; keys are expressions so computed keys work.
        fields: Vec<(Rex, Rex)>,
    },
    /// Turn a tuple stream into a struct of key/value pairs.
    Pivot {
        key: Box<Rex>,
        value: Box<Rex>,
        rel: Box<Rel>,
    },
    /// Map a constructor over a tuple stream, yielding a bag.
    Select {
        constructor: Box<Rex>,
        rel: Box<Rel>,
    },
    /// A SELECT in scalar position.
    Subquery {
        select: Box<Rex>,
        coercion: SubqueryCoercion,
    },
    /// Merge the fields of the argument structs, left to right.
    TupleUnion {
        args: Vec<Rex>,
    },
    /// A malformed expression; carries its diagnostic and types to Dynamic.
    Err {
        message: String,
    },
}

impl Rex {
    pub fn new(ty: StaticType, op: RexOp) -> Self {
        Rex { ty, op }
    }

    /// Literal node typed from its value.
    pub fn lit(value: Value) -> Self {
        Rex {
            ty: value.static_type(),
            op: RexOp::Lit(value),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Rex {
            ty: StaticType::Dynamic,
            op: RexOp::Err {
                message: message.into(),
            },
        }
    }

    pub fn cast(arg: Rex, target: StaticType) -> Self {
        Rex {
            ty: target.clone(),
            op: RexOp::Cast {
                arg: Box::new(arg),
                target,
            },
        }
    }

    pub fn is_err(&self) -> bool {
        matches!(self.op, RexOp::Err { .. })
    }

    /// Visit each direct child expression.
    pub fn for_each_child(&self, f: &mut impl FnMut(&Rex)) {
        match &self.op {
            RexOp::Lit(_)
            | RexOp::VarUnresolved { .. }
            | RexOp::VarResolved { .. }
            | RexOp::Global { .. }
            | RexOp::Err { .. } => {}
            RexOp::Path { root, .. } => f(root),
            RexOp::CallUnresolved { args, .. }
            | RexOp::CallStatic { args, .. }
            | RexOp::CallDynamic { args, .. }
            | RexOp::TupleUnion { args } => {
                for arg in args {
                    f(arg);
                }
            }
            RexOp::Cast { arg, .. } => f(arg),
            RexOp::Case { branches, default } => {
                for branch in branches {
                    f(&branch.condition);
                    f(&branch.result);
                }
                f(default);
            }
            RexOp::Coll { values, .. } => {
                for value in values {
                    f(value);
                }
            }
            RexOp::Strct { fields } => {
                for (key, value) in fields {
                    f(key);
                    f(value);
                }
            }
            RexOp::Pivot { key, value, .. } => {
                f(key);
                f(value);
            }
            RexOp::Select { constructor, .. } => f(constructor),
            RexOp::Subquery { select, .. } => f(select),
        }
    }

    /// Collect every `Err` message in this expression, including those inside
    /// nested relational subtrees.
    pub fn collect_errors(&self, out: &mut Vec<String>) {
        if let RexOp::Err { message } = &self.op {
            out.push(message.clone());
        }
        match &self.op {
            RexOp::Pivot { rel, .. } | RexOp::Select { rel, .. } => rel.collect_errors(out),
            _ => {}
        }
        self.for_each_child(&mut |child| child.collect_errors(out));
    }

    pub fn has_errors(&self) -> bool {
        let mut errors = Vec::new();
        self.collect_errors(&mut errors);
        !errors.is_empty()
    }
}

impl fmt::Display for Rex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.op {
            RexOp::Lit(v) => write!(f, "{v}"),
            RexOp::VarUnresolved { name, .. } => write!(f, "{name}"),
            RexOp::VarResolved { slot } => write!(f, "${slot}"),
            RexOp::Global { name } => write!(f, "@{name}"),
            RexOp::Path { root, steps } => {
                write!(f, "{root}")?;
                for step in steps {
                    write!(f, "{step}")?;
                }
                Ok(())
            }
            RexOp::CallUnresolved { name, args } => write_call(f, name.text(), args),
            RexOp::CallStatic { func, args } => write_call(f, func.name, args),
            RexOp::CallDynamic { args, candidates } => {
                let name = candidates
                    .first()
                    .map(|c| c.function.name)
                    .unwrap_or("?");
                write_call(f, name, args)?;
                write!(f, " /* dynamic:{} */", candidates.len())
            }
            RexOp::Cast { arg, target } => write!(f, "CAST({arg} AS {target})"),
            RexOp::Case { branches, default } => {
                write!(f, "CASE")?;
                for branch in branches {
                    write!(f, " WHEN {} THEN {}", branch.condition, branch.result)?;
                }
                write!(f, " ELSE {default} END")
            }
            RexOp::Coll { kind, values } => {
                let (open, close) = match kind {
                    CollKind::List => ("[", "]"),
                    CollKind::Bag => ("<<", ">>"),
                    CollKind::Sexp => ("(", ")"),
                };
                write!(f, "{open}")?;
                for (idx, value) in values.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "{close}")
            }
            RexOp::Strct { fields } => {
                write!(f, "{{")?;
                for (idx, (key, value)) in fields.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
            RexOp::Pivot { key, value, .. } => write!(f, "PIVOT {value} AT {key}"),
            RexOp::Select { constructor, .. } => write!(f, "SELECT {constructor}"),
            RexOp::Subquery { select, .. } => write!(f, "({select})"),
            RexOp::TupleUnion { args } => write_call(f, "tupleunion", args),
            RexOp::Err { message } => write!(f, "ERR({message})"),
        }
    }
}

fn write_call(f: &mut fmt::Formatter<'_>, name: &str, args: &[Rex]) -> fmt::Result {
    write!(f, "{name}(")?;
    for (idx, arg) in args.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{arg}")?;
    }
    write!(f, ")")
}

impl Explainable for Rex {
    fn explain_entry(&self, verbose: bool) -> ExplainEntry {
        let name = match &self.op {
            RexOp::Lit(_) => "Lit",
            RexOp::VarUnresolved { .. } => "VarUnresolved",
            RexOp::VarResolved { .. } => "Var",
            RexOp::Global { .. } => "Global",
            RexOp::Path { .. } => "Path",
            RexOp::CallUnresolved { .. } => "CallUnresolved",
            RexOp::CallStatic { .. } => "Call",
            RexOp::CallDynamic { .. } => "CallDynamic",
            RexOp::Cast { .. } => "Cast",
            RexOp::Case { .. } => "Case",
            RexOp::Coll { .. } => "Collection",
            RexOp::Strct { .. } => "Struct",
            RexOp::Pivot { .. } => "Pivot",
            RexOp::Select { .. } => "Select",
            RexOp::Subquery { .. } => "Subquery",
            RexOp::TupleUnion { .. } => "TupleUnion",
            RexOp::Err { .. } => "Err",
        };
        let mut entry = ExplainEntry::new(name).with_value("expr", self);
        if verbose {
            entry = entry.with_value("type", &self.ty);
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lit_types_from_value() {
        let rex = Rex::lit(Value::Int64(3));
        assert_eq!(StaticType::Int64, rex.ty);
    }

    #[test]
    fn err_types_to_dynamic() {
        let rex = Rex::error("bad");
        assert_eq!(StaticType::Dynamic, rex.ty);
        assert!(rex.has_errors());
    }

    #[test]
    fn collect_errors_descends() {
        let rex = Rex::new(
            StaticType::Dynamic,
            RexOp::TupleUnion {
                args: vec![Rex::error("first"), Rex::lit(Value::Null), Rex::error("second")],
            },
        );
        let mut errors = Vec::new();
        rex.collect_errors(&mut errors);
        assert_eq!(vec!["first".to_string(), "second".to_string()], errors);
    }

    #[test]
    fn display_path() {
        use crate::ident::Symbol;

        let rex = Rex::new(
            StaticType::Dynamic,
            RexOp::Path {
                root: Box::new(Rex::new(
                    StaticType::Dynamic,
                    RexOp::VarResolved { slot: 0 },
                )),
                steps: vec![PathStep::Key(Symbol::insensitive("a")), PathStep::Index(2)],
            },
        );
        assert_eq!("$0.a[2]", rex.to_string());
    }
}
