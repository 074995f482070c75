//! Name and overload resolution.
//!
//! Resolution walks a lowered tree bottom-up and rebuilds it with variables
//! bound to row slots or catalog globals, calls pinned to overloads (or
//! deferred to runtime dispatch), and corrected static types. It never
//! fails: anything that cannot be resolved becomes an `Err` node plus a
//! diagnostic, so one pass reports every problem in the tree.
//!
//! Resolution is idempotent; resolving an already-resolved tree is a no-op.

pub mod diagnostics;

mod exclude;
mod resolve_fn;
mod resolve_rel;
mod resolve_rex;

use diagnostics::Diagnostic;
use tracing::debug;

use crate::expr::Rex;
use crate::functions::registry::Catalog;
use crate::ident::Symbol;
use crate::rel::{Binding, Rel};

/// Search order a lowered dynamic lookup scans its candidates in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupOrder {
    #[default]
    LocalsThenGlobals,
    GlobalsThenLocals,
}

impl LookupOrder {
    pub(crate) fn symbol_text(&self) -> &'static str {
        match self {
            Self::LocalsThenGlobals => "locals_then_globals",
            Self::GlobalsThenLocals => "globals_then_locals",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub lookup_order: LookupOrder,
}

/// The rebuilt tree plus every diagnostic recorded while rebuilding it.
#[derive(Debug)]
pub struct Resolution<T> {
    pub root: T,
    pub diagnostics: Vec<Diagnostic>,
}

impl<T> Resolution<T> {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Resolve a relational tree against the catalog.
pub fn resolve_rel(rel: &Rel, catalog: &Catalog, options: &ResolveOptions) -> Resolution<Rel> {
    let mut ctx = ResolveContext::new(catalog, options);
    let root = resolve_rel::resolve(&mut ctx, rel);
    debug!(diagnostics = ctx.diagnostics.len(), "resolved relational tree");
    Resolution {
        root,
        diagnostics: ctx.diagnostics,
    }
}

/// Resolve a standalone expression against the catalog.
///
/// Only catalog globals are in scope; local variables resolve through any
/// relational subtrees the expression contains.
pub fn resolve_rex(rex: &Rex, catalog: &Catalog, options: &ResolveOptions) -> Resolution<Rex> {
    let mut ctx = ResolveContext::new(catalog, options);
    let root = resolve_rex::resolve(&mut ctx, rex);
    debug!(diagnostics = ctx.diagnostics.len(), "resolved expression");
    Resolution {
        root,
        diagnostics: ctx.diagnostics,
    }
}

/// Mutable state threaded through one resolution pass.
pub(crate) struct ResolveContext<'a> {
    pub catalog: &'a Catalog,
    pub options: &'a ResolveOptions,
    pub diagnostics: Vec<Diagnostic>,
    /// Scope frames, outermost first. Row slots are flat across the stack:
    /// a binding's slot is its frame's base offset plus its index within
    /// the frame, matching how the executor concatenates rows.
    scopes: Vec<Vec<Binding>>,
}

impl<'a> ResolveContext<'a> {
    fn new(catalog: &'a Catalog, options: &'a ResolveOptions) -> Self {
        ResolveContext {
            catalog,
            options,
            diagnostics: Vec::new(),
            scopes: Vec::new(),
        }
    }

    pub fn diag(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn push_scope(&mut self, bindings: Vec<Binding>) {
        self.scopes.push(bindings);
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// All matches for the name in the innermost frame containing any,
    /// as (flat slot, binding) pairs. Inner frames shadow outer ones.
    pub fn innermost_matches(&self, name: &Symbol) -> Vec<(usize, &Binding)> {
        let mut base: Vec<usize> = Vec::with_capacity(self.scopes.len());
        let mut acc = 0;
        for frame in &self.scopes {
            base.push(acc);
            acc += frame.len();
        }

        for (frame_idx, frame) in self.scopes.iter().enumerate().rev() {
            let matches: Vec<_> = frame
                .iter()
                .enumerate()
                .filter(|(_, b)| b.name == *name)
                .map(|(idx, b)| (base[frame_idx] + idx, b))
                .collect();
            if !matches.is_empty() {
                return matches;
            }
        }
        Vec::new()
    }

    /// Every in-scope binding, innermost frame first, with flat slots.
    pub fn all_bindings(&self) -> Vec<(usize, &Binding)> {
        let mut base: Vec<usize> = Vec::with_capacity(self.scopes.len());
        let mut acc = 0;
        for frame in &self.scopes {
            base.push(acc);
            acc += frame.len();
        }

        let mut out = Vec::new();
        for (frame_idx, frame) in self.scopes.iter().enumerate().rev() {
            for (idx, binding) in frame.iter().enumerate() {
                out.push((base[frame_idx] + idx, binding));
            }
        }
        out
    }

    /// Binding at a flat slot, if the slot is in scope.
    pub fn binding_at(&self, slot: usize) -> Option<&Binding> {
        let mut offset = slot;
        for frame in &self.scopes {
            if offset < frame.len() {
                return Some(&frame[offset]);
            }
            offset -= frame.len();
        }
        None
    }

    /// Best "did you mean" suggestion for an unknown variable name, drawn
    /// from in-scope bindings and catalog globals.
    pub fn suggest_variable(&self, name: &str) -> Option<String> {
        let folded = name.to_ascii_lowercase();
        self.scopes
            .iter()
            .flatten()
            .map(|b| b.name.text())
            .chain(self.catalog.globals().iter().map(|(sym, _)| sym.text()))
            .map(|candidate| {
                (
                    candidate,
                    strsim::jaro_winkler(&folded, &candidate.to_ascii_lowercase()),
                )
            })
            .filter(|(_, score)| *score > 0.8)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(candidate, _)| candidate.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{RexOp, VarScope};
    use crate::functions::scalar::builtin::dynamic_lookup::DYNAMIC_LOOKUP_NAME;
    use crate::rel::RelOp;
    use crate::rel::exclude::{Exclude, ExcludeItem, ExcludeRoot, ExcludeStep};
    use crate::rel::filter::Filter;
    use crate::rel::join::{Join, JoinType};
    use crate::rel::scan::Scan;
    use crate::types::StaticType;
    use crate::values::Value;

    fn var(name: &str) -> Rex {
        Rex::new(
            StaticType::Dynamic,
            RexOp::VarUnresolved {
                name: Symbol::insensitive(name),
                scope: VarScope::Local,
            },
        )
    }

    fn scan(alias: &str) -> Rel {
        Scan::new(Rex::lit(Value::Bag(Vec::new())), Symbol::insensitive(alias))
    }

    fn typed_scan(alias: &str, elem: StaticType) -> Rel {
        Scan::new(
            Rex::new(
                StaticType::Bag(Some(Box::new(elem))),
                RexOp::Lit(Value::Bag(Vec::new())),
            ),
            Symbol::insensitive(alias),
        )
    }

    #[test]
    fn single_binding_resolves_to_slot() {
        let catalog = Catalog::with_builtins();
        let rel = Filter::new(scan("x"), var("x"));
        let resolution = resolve_rel(&rel, &catalog, &ResolveOptions::default());
        assert!(resolution.is_clean());

        let RelOp::Filter(filter) = &resolution.root.op else {
            panic!("expected filter");
        };
        assert!(matches!(filter.predicate.op, RexOp::VarResolved { slot: 0 }));
    }

    #[test]
    fn duplicate_bindings_lower_to_dynamic_lookup() {
        let catalog = Catalog::with_builtins();
        // Joining two scans under the same alias leaves two bindings named
        // `x` in the filter's frame.
        let join = Join::new(
            scan("x"),
            scan("x"),
            Rex::lit(Value::Bool(true)),
            JoinType::Inner,
        );
        let rel = Filter::new(join, var("x"));
        let resolution = resolve_rel(&rel, &catalog, &ResolveOptions::default());
        assert!(resolution.is_clean(), "{:?}", resolution.diagnostics);

        let RelOp::Filter(filter) = &resolution.root.op else {
            panic!("expected filter");
        };
        let RexOp::CallStatic { func, args } = &filter.predicate.op else {
            panic!("expected a lowered call, got {:?}", filter.predicate.op);
        };
        assert_eq!(DYNAMIC_LOOKUP_NAME, func.name);
        // Name, case rule, search order, then both candidate slots.
        assert_eq!(5, args.len());
        assert!(matches!(args[3].op, RexOp::VarResolved { slot: 0 }));
        assert!(matches!(args[4].op, RexOp::VarResolved { slot: 1 }));
    }

    #[test]
    fn unbound_name_over_dynamic_binding_defers_to_lookup() {
        let catalog = Catalog::with_builtins();
        // `price` isn't a binding, but the scanned element shape is unknown;
        // it may be a field of `item` at runtime.
        let rel = Filter::new(scan("item"), var("price"));
        let resolution = resolve_rel(&rel, &catalog, &ResolveOptions::default());
        assert!(resolution.is_clean(), "{:?}", resolution.diagnostics);

        let RelOp::Filter(filter) = &resolution.root.op else {
            panic!("expected filter");
        };
        let RexOp::CallStatic { func, .. } = &filter.predicate.op else {
            panic!("expected a lowered call, got {:?}", filter.predicate.op);
        };
        assert_eq!(DYNAMIC_LOOKUP_NAME, func.name);
    }

    #[test]
    fn unknown_variable_over_typed_binding_diagnoses() {
        let catalog = Catalog::with_builtins();
        // The element type is pinned to int, so `itemz` cannot be a hidden
        // field; resolution reports it with a suggestion.
        let rel = Filter::new(typed_scan("items", StaticType::Int64), var("itemz"));
        let resolution = resolve_rel(&rel, &catalog, &ResolveOptions::default());

        assert!(resolution.root.has_errors());
        assert_eq!(1, resolution.diagnostics.len());
        let message = &resolution.diagnostics[0].message;
        assert!(message.contains("itemz"), "{message}");
        assert!(message.contains("items"), "{message}");
    }

    #[test]
    fn exclude_root_binds_to_schema_slot() {
        let catalog = Catalog::with_builtins();
        let rel = Exclude::new(
            scan("t"),
            vec![ExcludeItem {
                root: ExcludeRoot::Unresolved(Symbol::insensitive("t")),
                steps: vec![ExcludeStep::Attr(Symbol::insensitive("a"))],
            }],
        );
        let resolution = resolve_rel(&rel, &catalog, &ResolveOptions::default());
        assert!(resolution.is_clean());

        let RelOp::Exclude(exclude) = &resolution.root.op else {
            panic!("expected exclude");
        };
        assert!(matches!(exclude.items[0].root, ExcludeRoot::Resolved(0)));
    }

    #[test]
    fn unknown_exclude_root_is_dropped_with_diagnostic() {
        let catalog = Catalog::with_builtins();
        let rel = Exclude::new(
            scan("t"),
            vec![ExcludeItem {
                root: ExcludeRoot::Unresolved(Symbol::insensitive("q")),
                steps: vec![ExcludeStep::Attr(Symbol::insensitive("a"))],
            }],
        );
        let resolution = resolve_rel(&rel, &catalog, &ResolveOptions::default());

        assert_eq!(1, resolution.diagnostics.len());
        assert!(resolution.diagnostics[0].message.contains("EXCLUDE"));
        let RelOp::Exclude(exclude) = &resolution.root.op else {
            panic!("expected exclude");
        };
        assert!(exclude.items.is_empty());
    }

    #[test]
    fn relational_resolution_is_idempotent() {
        let catalog = Catalog::with_builtins();
        let join = Join::new(
            scan("x"),
            scan("x"),
            Rex::lit(Value::Bool(true)),
            JoinType::Inner,
        );
        let rel = Filter::new(join, var("x"));

        let once = resolve_rel(&rel, &catalog, &ResolveOptions::default());
        let twice = resolve_rel(&once.root, &catalog, &ResolveOptions::default());
        assert!(twice.is_clean());
        assert_eq!(once.root, twice.root);
    }

    #[test]
    fn globals_then_locals_order_flips_candidates() {
        let mut catalog = Catalog::with_builtins();
        catalog.register_global(Symbol::insensitive("x"), StaticType::Strct(None));

        let options = ResolveOptions {
            lookup_order: LookupOrder::GlobalsThenLocals,
        };
        let join = Join::new(
            scan("x"),
            scan("x"),
            Rex::lit(Value::Bool(true)),
            JoinType::Inner,
        );
        let rel = Filter::new(join, var("x"));
        let resolution = resolve_rel(&rel, &catalog, &options);
        assert!(resolution.is_clean(), "{:?}", resolution.diagnostics);

        let RelOp::Filter(filter) = &resolution.root.op else {
            panic!("expected filter");
        };
        let RexOp::CallStatic { args, .. } = &filter.predicate.op else {
            panic!("expected a lowered call");
        };
        // Global candidate first under the flipped order.
        assert!(matches!(args[3].op, RexOp::Global { .. }));
        assert!(matches!(args[4].op, RexOp::VarResolved { .. }));
    }
}
