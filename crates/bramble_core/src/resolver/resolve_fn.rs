//! Overload resolution for scalar and aggregate calls.

use super::ResolveContext;
use super::diagnostics::Diagnostic;
use crate::expr::{DynamicCandidate, Rex, RexOp};
use crate::functions::candidate::{CandidateSignature, CastType};
use crate::functions::function_set::{FunctionInfo, FunctionSet, ScalarFunctionSet};
use crate::functions::scalar::PlannedScalarFunction;
use crate::functions::aggregate::PlannedAggregateFunction;
use crate::ident::Symbol;
use crate::rel::aggregate::{AggCall, AggExpr};
use crate::types::{StaticType, TypeId};

/// Outcome of picking an overload from a set.
enum Pick {
    /// One overload wins statically; apply these casts to the arguments.
    Static {
        function_idx: usize,
        casts: Vec<CastType>,
    },
    /// Statically unknown argument types keep several overloads plausible;
    /// defer to runtime dispatch over the ranked candidates.
    Dynamic(Vec<CandidateSignature>),
}

fn pick_overload<T: FunctionInfo>(
    set: &FunctionSet<T>,
    name: &Symbol,
    arg_tys: &[StaticType],
) -> Result<Pick, Diagnostic> {
    if !set.accepts_arity(arg_tys.len()) {
        return Err(Diagnostic::invalid_arity(name, arg_tys.len()));
    }

    // Statically unknown arguments never match exactly; they fall through to
    // the candidate search so runtime dispatch stays in play.
    if let Some((idx, _)) = set.find_exact(arg_tys) {
        return Ok(Pick::Static {
            function_idx: idx,
            casts: vec![CastType::NoCastNeeded; arg_tys.len()],
        });
    }
    let any_dynamic = arg_tys.iter().any(|t| t.is_dynamic());

    let candidates = set.candidates(arg_tys);
    if candidates.is_empty() {
        let sigs: Vec<_> = set.functions.iter().map(|f| f.signature()).collect();
        return Err(Diagnostic::no_matching_overload(name, arg_tys, &sigs));
    }

    if any_dynamic && candidates.len() > 1 {
        return Ok(Pick::Dynamic(candidates));
    }

    // A tie between equally ranked candidates of the same variadicity has no
    // principled winner.
    if let Some(second) = candidates.get(1) {
        let best = &candidates[0];
        if second.score == best.score && second.variadic == best.variadic {
            return Err(Diagnostic::ambiguous_overload(name, arg_tys));
        }
    }

    let best = candidates.into_iter().next().expect("non-empty candidates");
    Ok(Pick::Static {
        function_idx: best.function_idx,
        casts: best.casts,
    })
}

/// Insert cast nodes where the chosen overload needs a concrete argument
/// type. Casts to the top type are identity and are skipped.
fn apply_casts(args: Vec<Rex>, casts: &[CastType]) -> Vec<Rex> {
    args.into_iter()
        .zip(casts.iter())
        .map(|(arg, cast)| match cast {
            CastType::Cast { to, .. } if *to != TypeId::Dynamic && arg.ty.type_id() != *to => {
                Rex::cast(arg, StaticType::from_type_id(*to))
            }
            _ => arg,
        })
        .collect()
}

pub(super) fn plan_scalar(set: &ScalarFunctionSet, idx: usize) -> PlannedScalarFunction {
    let raw = set.functions[idx];
    PlannedScalarFunction {
        name: set.name,
        function: raw,
        return_type: StaticType::from_type_id(raw.signature().return_type),
    }
}

/// Resolve a scalar call whose arguments are already resolved.
pub(super) fn resolve_scalar_call(
    ctx: &mut ResolveContext,
    name: &Symbol,
    args: Vec<Rex>,
) -> Rex {
    let set = match ctx.catalog.scalar(name) {
        Some(set) => set,
        None => {
            let diag =
                Diagnostic::unknown_function(name, ctx.catalog.suggest_function(name.text()));
            let message = diag.message.clone();
            ctx.diag(diag);
            return Rex::error(message);
        }
    };

    let arg_tys: Vec<StaticType> = args.iter().map(|a| a.ty.clone()).collect();
    match pick_overload(set, name, &arg_tys) {
        Ok(Pick::Static {
            function_idx,
            casts,
        }) => {
            let func = plan_scalar(set, function_idx);
            let args = apply_casts(args, &casts);
            Rex::new(func.return_type.clone(), RexOp::CallStatic { func, args })
        }
        Ok(Pick::Dynamic(candidates)) => {
            let candidates: Vec<DynamicCandidate> = candidates
                .into_iter()
                .map(|c| DynamicCandidate {
                    function: plan_scalar(set, c.function_idx),
                    casts: c.casts,
                })
                .collect();
            let ty = StaticType::union_of(
                candidates.iter().map(|c| c.function.return_type.clone()),
            );
            Rex::new(ty, RexOp::CallDynamic { args, candidates })
        }
        Err(diag) => {
            let message = diag.message.clone();
            ctx.diag(diag);
            Rex::error(message)
        }
    }
}

/// Resolve an aggregate call whose argument expressions are already resolved.
///
/// Aggregate calls have no runtime-dispatch form; when the argument type is
/// statically unknown the best-ranked overload wins and its casts are checked
/// at runtime. A call that cannot be resolved keeps its diagnostic as an
/// error-node argument so the executor refuses the tree.
pub(super) fn resolve_agg_call(ctx: &mut ResolveContext, call: &AggCall, args: Vec<Rex>) -> AggCall {
    if let AggExpr::Resolved(_) = &call.agg {
        return AggCall {
            name: call.name.clone(),
            agg: call.agg.clone(),
            quantifier: call.quantifier,
            args,
        };
    }

    let unresolved_name = match &call.agg {
        AggExpr::Unresolved(name) => name.clone(),
        AggExpr::Resolved(_) => unreachable!("handled above"),
    };

    let failed = |ctx: &mut ResolveContext, diag: Diagnostic| {
        let message = diag.message.clone();
        ctx.diag(diag);
        AggCall {
            name: call.name.clone(),
            agg: AggExpr::Unresolved(unresolved_name.clone()),
            quantifier: call.quantifier,
            args: vec![Rex::error(message)],
        }
    };

    let set = match ctx.catalog.aggregate(&unresolved_name) {
        Some(set) => set,
        None => {
            let diag = Diagnostic::unknown_function(
                &unresolved_name,
                ctx.catalog.suggest_function(unresolved_name.text()),
            );
            return failed(ctx, diag);
        }
    };

    let arg_tys: Vec<StaticType> = args.iter().map(|a| a.ty.clone()).collect();
    let (function_idx, casts) = match pick_overload(set, &unresolved_name, &arg_tys) {
        Ok(Pick::Static {
            function_idx,
            casts,
        }) => (function_idx, casts),
        Ok(Pick::Dynamic(mut candidates)) => {
            let best = candidates.remove(0);
            (best.function_idx, best.casts)
        }
        Err(diag) => return failed(ctx, diag),
    };

    let raw = set.functions[function_idx];
    let planned = PlannedAggregateFunction {
        name: set.name,
        function: raw,
        return_type: StaticType::from_type_id(raw.signature().return_type),
    };
    AggCall {
        name: call.name.clone(),
        agg: AggExpr::Resolved(planned),
        quantifier: call.quantifier,
        args: apply_casts(args, &casts),
    }
}
