//! Expression resolution: variable binding and bottom-up retyping.

use super::diagnostics::Diagnostic;
use super::{ResolveContext, resolve_fn, resolve_rel};
use crate::expr::case::CaseBranch;
use crate::expr::path::PathStep;
use crate::expr::{CollKind, Rex, RexOp, SubqueryCoercion, VarScope};
use crate::ident::{QualifiedName, Symbol};
use crate::types::{StaticType, StructField};
use crate::values::Value;

pub(super) fn resolve(ctx: &mut ResolveContext, rex: &Rex) -> Rex {
    match &rex.op {
        // A literal carrying a declared type keeps it; only an untyped
        // literal re-derives its type from the value.
        RexOp::Lit(value) => {
            if rex.ty == StaticType::Dynamic {
                Rex::lit(value.clone())
            } else {
                rex.clone()
            }
        }

        RexOp::VarUnresolved { name, scope } => resolve_var(ctx, name, *scope),

        // Already bound; refresh the type in case the schema narrowed.
        RexOp::VarResolved { slot } => {
            let ty = ctx
                .binding_at(*slot)
                .map(|b| b.ty.clone())
                .unwrap_or_else(|| rex.ty.clone());
            Rex::new(ty, RexOp::VarResolved { slot: *slot })
        }

        RexOp::Global { name } => {
            let ty = global_type(ctx, name);
            Rex::new(ty, RexOp::Global { name: name.clone() })
        }

        RexOp::Path { root, steps } => {
            let root = resolve(ctx, root);
            let ty = path_type(root.ty.clone(), steps);
            Rex::new(
                ty,
                RexOp::Path {
                    root: Box::new(root),
                    steps: steps.clone(),
                },
            )
        }

        RexOp::CallUnresolved { name, args } => {
            let args: Vec<_> = args.iter().map(|a| resolve(ctx, a)).collect();
            resolve_fn::resolve_scalar_call(ctx, name, args)
        }

        RexOp::CallStatic { func, args } => {
            let args: Vec<_> = args.iter().map(|a| resolve(ctx, a)).collect();
            Rex::new(
                func.return_type.clone(),
                RexOp::CallStatic {
                    func: func.clone(),
                    args,
                },
            )
        }

        RexOp::CallDynamic { args, candidates } => {
            let args: Vec<_> = args.iter().map(|a| resolve(ctx, a)).collect();
            let ty = StaticType::union_of(
                candidates.iter().map(|c| c.function.return_type.clone()),
            );
            Rex::new(
                ty,
                RexOp::CallDynamic {
                    args,
                    candidates: candidates.clone(),
                },
            )
        }

        RexOp::Cast { arg, target } => Rex::cast(resolve(ctx, arg), target.clone()),

        RexOp::Case { branches, default } => {
            let branches: Vec<_> = branches
                .iter()
                .map(|b| CaseBranch {
                    condition: resolve(ctx, &b.condition),
                    result: resolve(ctx, &b.result),
                })
                .collect();
            let default = resolve(ctx, default);
            let ty = StaticType::union_of(
                branches
                    .iter()
                    .map(|b| b.result.ty.clone())
                    .chain(std::iter::once(default.ty.clone())),
            );
            Rex::new(
                ty,
                RexOp::Case {
                    branches,
                    default: Box::new(default),
                },
            )
        }

        RexOp::Coll { kind, values } => {
            let values: Vec<_> = values.iter().map(|v| resolve(ctx, v)).collect();
            let elem = if values.is_empty() {
                None
            } else {
                Some(Box::new(StaticType::union_of(
                    values.iter().map(|v| v.ty.clone()),
                )))
            };
            let ty = match kind {
                CollKind::List => StaticType::List(elem),
                CollKind::Bag => StaticType::Bag(elem),
                CollKind::Sexp => StaticType::Sexp(elem),
            };
            Rex::new(
                ty,
                RexOp::Coll {
                    kind: *kind,
                    values,
                },
            )
        }

        RexOp::Strct { fields } => {
            let fields: Vec<_> = fields
                .iter()
                .map(|(k, v)| (resolve(ctx, k), resolve(ctx, v)))
                .collect();
            let ty = struct_type(&fields);
            Rex::new(ty, RexOp::Strct { fields })
        }

        RexOp::Pivot { key, value, rel } => {
            let rel = resolve_rel::resolve(ctx, rel);
            ctx.push_scope(rel.schema().to_vec());
            let key = resolve(ctx, key);
            let value = resolve(ctx, value);
            ctx.pop_scope();
            Rex::new(
                StaticType::Strct(None),
                RexOp::Pivot {
                    key: Box::new(key),
                    value: Box::new(value),
                    rel: Box::new(rel),
                },
            )
        }

        RexOp::Select { constructor, rel } => {
            let rel = resolve_rel::resolve(ctx, rel);
            ctx.push_scope(rel.schema().to_vec());
            let constructor = resolve(ctx, constructor);
            ctx.pop_scope();
            let ty = StaticType::Bag(Some(Box::new(constructor.ty.clone())));
            Rex::new(
                ty,
                RexOp::Select {
                    constructor: Box::new(constructor),
                    rel: Box::new(rel),
                },
            )
        }

        RexOp::Subquery { select, coercion } => {
            let select = resolve(ctx, select);
            let ty = subquery_type(&select.ty, *coercion);
            Rex::new(
                ty,
                RexOp::Subquery {
                    select: Box::new(select),
                    coercion: *coercion,
                },
            )
        }

        RexOp::TupleUnion { args } => {
            let args: Vec<_> = args.iter().map(|a| resolve(ctx, a)).collect();
            Rex::new(StaticType::Strct(None), RexOp::TupleUnion { args })
        }

        RexOp::Err { .. } => rex.clone(),
    }
}

/// Bind a variable reference to a row slot, a catalog global, or a runtime
/// dynamic lookup over the plausible locations.
fn resolve_var(ctx: &mut ResolveContext, name: &Symbol, scope: VarScope) -> Rex {
    if scope == VarScope::Local {
        let matches: Vec<(usize, StaticType)> = ctx
            .innermost_matches(name)
            .into_iter()
            .map(|(slot, b)| (slot, b.ty.clone()))
            .collect();
        match matches.len() {
            1 => {
                let (slot, ty) = matches.into_iter().next().expect("single match");
                return Rex::new(ty, RexOp::VarResolved { slot });
            }
            0 => {}
            // Several bindings in the same frame answer to this name; which
            // one holds the value is a runtime question.
            _ => {
                let locals = slot_refs(matches);
                let globals = global_refs(ctx, name);
                return lower_dynamic_lookup(ctx, name, locals, globals);
            }
        }
    }

    // No local binding (or the reference was written against globals).
    let globals = ctx.catalog.matching_globals(name);
    match globals.len() {
        1 => {
            let (_, global, ty) = globals[0];
            let ty = ty.clone();
            let name = QualifiedName::bare(global.clone());
            return Rex::new(ty, RexOp::Global { name });
        }
        0 => {}
        _ => {
            let globals = global_refs(ctx, name);
            return lower_dynamic_lookup(ctx, name, Vec::new(), globals);
        }
    }

    if scope == VarScope::Local {
        // Schemaless fallback: the name may be a field of any in-scope
        // binding whose shape is a struct or statically unknown.
        let locals: Vec<Rex> = ctx
            .all_bindings()
            .iter()
            .filter(|(_, b)| b.ty.is_struct() || b.ty.is_dynamic())
            .map(|(slot, b)| Rex::new(b.ty.clone(), RexOp::VarResolved { slot: *slot }))
            .collect();
        if !locals.is_empty() {
            return lower_dynamic_lookup(ctx, name, locals, Vec::new());
        }
    }

    let diag = Diagnostic::unknown_variable(name, ctx.suggest_variable(name.text()).as_deref());
    let message = diag.message.clone();
    ctx.diag(diag);
    Rex::error(message)
}

fn slot_refs(matches: Vec<(usize, StaticType)>) -> Vec<Rex> {
    matches
        .into_iter()
        .map(|(slot, ty)| Rex::new(ty, RexOp::VarResolved { slot }))
        .collect()
}

fn global_refs(ctx: &ResolveContext, name: &Symbol) -> Vec<Rex> {
    ctx.catalog
        .matching_globals(name)
        .into_iter()
        .map(|(_, global, ty)| {
            Rex::new(
                ty.clone(),
                RexOp::Global {
                    name: QualifiedName::bare(global.clone()),
                },
            )
        })
        .collect()
}

/// Lower an ambiguous variable into a call to the reserved dynamic lookup
/// function, candidate locations arranged per the configured search order.
fn lower_dynamic_lookup(
    ctx: &mut ResolveContext,
    name: &Symbol,
    locals: Vec<Rex>,
    globals: Vec<Rex>,
) -> Rex {
    use super::LookupOrder;
    use crate::functions::scalar::builtin::dynamic_lookup::DYNAMIC_LOOKUP_NAME;

    let set = match ctx.catalog.scalar(&Symbol::sensitive(DYNAMIC_LOOKUP_NAME)) {
        Some(set) => set,
        None => {
            // A catalog without the reserved function cannot defer; report
            // the variable as unresolvable instead.
            let diag = Diagnostic::unknown_variable(name, None);
            let message = diag.message.clone();
            ctx.diag(diag);
            return Rex::error(message);
        }
    };

    let case = if name.is_sensitive() {
        "case_sensitive"
    } else {
        "case_insensitive"
    };
    let order = ctx.options.lookup_order;

    let mut args = vec![
        Rex::lit(Value::Str(name.text().to_string())),
        Rex::lit(Value::Sym(case.to_string())),
        Rex::lit(Value::Sym(order.symbol_text().to_string())),
    ];
    match order {
        LookupOrder::LocalsThenGlobals => {
            args.extend(locals);
            args.extend(globals);
        }
        LookupOrder::GlobalsThenLocals => {
            args.extend(globals);
            args.extend(locals);
        }
    }

    let func = resolve_fn::plan_scalar(set, 0);
    Rex::new(StaticType::Dynamic, RexOp::CallStatic { func, args })
}

fn global_type(ctx: &ResolveContext, name: &QualifiedName) -> StaticType {
    if !name.steps.is_empty() {
        return StaticType::Dynamic;
    }
    let matches = ctx.catalog.matching_globals(&name.root);
    match matches.as_slice() {
        [(_, _, ty)] => (*ty).clone(),
        _ => StaticType::Dynamic,
    }
}

/// Static type of a path navigation, `Dynamic` wherever the schema runs out.
fn path_type(ty: StaticType, steps: &[PathStep]) -> StaticType {
    let Some((step, rest)) = steps.split_first() else {
        return ty;
    };
    match step {
        PathStep::Key(sym) => match &ty {
            StaticType::Strct(Some(fields)) => {
                let matched: Vec<_> = fields
                    .iter()
                    .filter(|f| sym.matches(f.name.text()))
                    .collect();
                match matched.as_slice() {
                    [field] => path_type(field.ty.clone(), rest),
                    _ => StaticType::Dynamic,
                }
            }
            _ => StaticType::Dynamic,
        },
        PathStep::Index(_) => match ty.element() {
            Some(elem) => path_type(elem.clone(), rest),
            None => StaticType::Dynamic,
        },
        PathStep::Wildcard => {
            let elem = ty.element().cloned().unwrap_or(StaticType::Dynamic);
            StaticType::List(Some(Box::new(path_type(elem, rest))))
        }
        PathStep::Unpivot => {
            StaticType::List(Some(Box::new(path_type(StaticType::Dynamic, rest))))
        }
    }
}

/// A struct constructor has a known shape when every key is a literal text
/// value.
fn struct_type(fields: &[(Rex, Rex)]) -> StaticType {
    let mut typed = Vec::with_capacity(fields.len());
    for (key, value) in fields {
        let name = match &key.op {
            RexOp::Lit(v) => match v.as_text() {
                Some(text) => Symbol::sensitive(text),
                None => return StaticType::Strct(None),
            },
            _ => return StaticType::Strct(None),
        };
        typed.push(StructField {
            name,
            ty: value.ty.clone(),
        });
    }
    StaticType::Strct(Some(typed))
}

/// Type of a subquery coerced into scalar position.
fn subquery_type(select_ty: &StaticType, coercion: SubqueryCoercion) -> StaticType {
    let elem = match select_ty.element() {
        Some(elem) => elem.clone(),
        None => return StaticType::Dynamic,
    };
    match coercion {
        SubqueryCoercion::Row => elem,
        SubqueryCoercion::Scalar => match elem {
            StaticType::Strct(Some(fields)) if fields.len() == 1 => {
                fields.into_iter().next().expect("single field").ty
            }
            _ => StaticType::Dynamic,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::functions::function_set::FunctionInfo;
    use crate::functions::registry::Catalog;
    use crate::resolver::{ResolveOptions, Resolution};
    use crate::types::TypeId;

    fn resolve_with(rex: &Rex, catalog: &Catalog) -> Resolution<Rex> {
        crate::resolver::resolve_rex(rex, catalog, &ResolveOptions::default())
    }

    fn call(name: &str, args: Vec<Rex>) -> Rex {
        Rex::new(
            StaticType::Dynamic,
            RexOp::CallUnresolved {
                name: Symbol::insensitive(name),
                args,
            },
        )
    }

    #[test]
    fn typed_literal_keeps_declared_type() {
        let catalog = Catalog::with_builtins();
        let ty = StaticType::Bag(Some(Box::new(StaticType::Int64)));
        let rex = Rex::new(ty.clone(), RexOp::Lit(Value::Bag(Vec::new())));
        let resolution = resolve_with(&rex, &catalog);

        assert!(resolution.is_clean());
        assert_eq!(ty, resolution.root.ty);
    }

    #[test]
    fn unknown_function_diagnoses_with_suggestion() {
        let catalog = Catalog::with_builtins();
        let rex = call("char_lenght", vec![Rex::lit(Value::Str("a".into()))]);
        let resolution = resolve_with(&rex, &catalog);

        assert!(resolution.root.is_err());
        assert_eq!(1, resolution.diagnostics.len());
        assert!(resolution.diagnostics[0].message.contains("char_length"));
    }

    #[test]
    fn arity_mismatch_diagnoses_at_resolution() {
        let catalog = Catalog::with_builtins();
        let rex = call(
            "lower",
            vec![
                Rex::lit(Value::Str("a".into())),
                Rex::lit(Value::Str("b".into())),
            ],
        );
        let resolution = resolve_with(&rex, &catalog);

        assert!(resolution.root.is_err());
        assert!(resolution.diagnostics[0].message.contains("2 argument"));
    }

    #[test]
    fn exact_overload_resolves_static() {
        let catalog = Catalog::with_builtins();
        let rex = call("char_length", vec![Rex::lit(Value::Str("abc".into()))]);
        let resolution = resolve_with(&rex, &catalog);

        assert!(resolution.is_clean());
        assert_eq!(StaticType::Int64, resolution.root.ty);
        assert!(matches!(resolution.root.op, RexOp::CallStatic { .. }));
    }

    #[test]
    fn implicit_cast_inserted_for_narrower_argument() {
        let catalog = Catalog::with_builtins();
        let rex = call(
            "+",
            vec![Rex::lit(Value::Int8(1)), Rex::lit(Value::Int64(2))],
        );
        let resolution = resolve_with(&rex, &catalog);
        assert!(resolution.is_clean());

        let RexOp::CallStatic { args, .. } = &resolution.root.op else {
            panic!("expected a static call, got {:?}", resolution.root.op);
        };
        assert!(matches!(&args[0].op, RexOp::Cast { .. }));
        assert_eq!(StaticType::Int64, args[0].ty);
        assert!(matches!(&args[1].op, RexOp::Lit(_)));
    }

    #[test]
    fn dynamic_argument_defers_to_ranked_candidates() {
        let catalog = Catalog::with_builtins();
        let unknown = Rex::new(StaticType::Dynamic, RexOp::VarResolved { slot: 0 });
        let rex = call("+", vec![unknown, Rex::lit(Value::Int64(2))]);
        let resolution = resolve_with(&rex, &catalog);
        assert!(resolution.is_clean());

        let RexOp::CallDynamic { candidates, .. } = &resolution.root.op else {
            panic!("expected a dynamic call, got {:?}", resolution.root.op);
        };
        // Every arithmetic overload stays plausible; the int path ranks
        // first because the known argument matches it exactly.
        assert_eq!(4, candidates.len());
        assert_eq!(
            TypeId::Int64,
            candidates[0].function.function.signature().return_type
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let catalog = Catalog::with_builtins();
        let unknown = Rex::new(StaticType::Dynamic, RexOp::VarResolved { slot: 0 });
        let rex = call(
            "+",
            vec![unknown, call("char_length", vec![Rex::lit(Value::Str("a".into()))])],
        );

        let once = resolve_with(&rex, &catalog);
        assert!(once.is_clean());
        let twice = resolve_with(&once.root, &catalog);
        assert!(twice.is_clean());
        assert_eq!(once.root, twice.root);
    }

    #[test]
    fn bare_global_resolves_from_catalog() {
        let mut catalog = Catalog::with_builtins();
        catalog.register_global(
            Symbol::insensitive("inventory"),
            StaticType::Bag(Some(Box::new(StaticType::Strct(None)))),
        );

        let rex = Rex::new(
            StaticType::Dynamic,
            RexOp::VarUnresolved {
                name: Symbol::insensitive("inventory"),
                scope: VarScope::Local,
            },
        );
        let resolution = resolve_with(&rex, &catalog);
        assert!(resolution.is_clean());
        assert!(matches!(resolution.root.op, RexOp::Global { .. }));
        assert_eq!(
            StaticType::Bag(Some(Box::new(StaticType::Strct(None)))),
            resolution.root.ty
        );
    }

    #[test]
    fn unknown_variable_without_candidates_diagnoses() {
        let catalog = Catalog::with_builtins();
        let rex = Rex::new(
            StaticType::Dynamic,
            RexOp::VarUnresolved {
                name: Symbol::insensitive("nowhere"),
                scope: VarScope::Global,
            },
        );
        let resolution = resolve_with(&rex, &catalog);
        assert!(resolution.root.is_err());
        assert!(resolution.diagnostics[0].message.contains("nowhere"));
    }

    #[test]
    fn path_over_typed_struct_narrows() {
        let ty = StaticType::Strct(Some(vec![StructField {
            name: Symbol::insensitive("a"),
            ty: StaticType::List(Some(Box::new(StaticType::Int64))),
        }]));
        let got = path_type(
            ty,
            &[
                PathStep::Key(Symbol::insensitive("a")),
                PathStep::Index(0),
            ],
        );
        assert_eq!(StaticType::Int64, got);
    }

    #[test]
    fn path_over_unknown_shape_is_dynamic() {
        let got = path_type(
            StaticType::Dynamic,
            &[PathStep::Key(Symbol::insensitive("a"))],
        );
        assert_eq!(StaticType::Dynamic, got);
    }

    #[test]
    fn struct_constructor_with_literal_keys_is_typed() {
        let catalog = Catalog::with_builtins();
        let rex = Rex::new(
            StaticType::Dynamic,
            RexOp::Strct {
                fields: vec![(
                    Rex::lit(Value::Str("a".into())),
                    Rex::lit(Value::Int64(1)),
                )],
            },
        );
        let resolution = resolve_with(&rex, &catalog);
        assert!(resolution.is_clean());
        assert_eq!(
            StaticType::Strct(Some(vec![StructField {
                name: Symbol::sensitive("a"),
                ty: StaticType::Int64,
            }])),
            resolution.root.ty
        );
    }
}
