//! Relational tree resolution.
//!
//! Operators are rebuilt through their constructors so schemas recompute
//! from the freshly retyped expressions. Expressions held by an operator
//! resolve with the operator's input schema pushed as a scope frame; comma
//! style joins are lateral, so the right input sees the left input's frame.

use super::{ResolveContext, exclude, resolve_fn, resolve_rex};
use crate::rel::aggregate::Aggregate;
use crate::rel::distinct::Distinct;
use crate::rel::exclude::Exclude;
use crate::rel::filter::Filter;
use crate::rel::join::{Join, JoinType};
use crate::rel::limit::{Limit, Offset};
use crate::rel::project::Project;
use crate::rel::scan::{Scan, ScanIndexed, Unpivot};
use crate::rel::setop::SetOp;
use crate::rel::sort::{Sort, SortSpec};
use crate::rel::{Rel, RelOp};

pub(super) fn resolve(ctx: &mut ResolveContext, rel: &Rel) -> Rel {
    match &rel.op {
        RelOp::Scan(n) => {
            let rex = resolve_rex::resolve(ctx, &n.rex);
            Scan::new(rex, n.alias.clone())
        }

        RelOp::ScanIndexed(n) => {
            let rex = resolve_rex::resolve(ctx, &n.rex);
            ScanIndexed::new(rex, n.alias.clone(), n.index_alias.clone())
        }

        RelOp::Unpivot(n) => {
            let rex = resolve_rex::resolve(ctx, &n.rex);
            Unpivot::new(rex, n.key_alias.clone(), n.value_alias.clone())
        }

        RelOp::Distinct(n) => Distinct::new(resolve(ctx, &n.input)),

        RelOp::Filter(n) => {
            let input = resolve(ctx, &n.input);
            ctx.push_scope(input.schema().to_vec());
            let predicate = resolve_rex::resolve(ctx, &n.predicate);
            ctx.pop_scope();
            Filter::new(input, predicate)
        }

        RelOp::Project(n) => {
            let input = resolve(ctx, &n.input);
            ctx.push_scope(input.schema().to_vec());
            let projections: Vec<_> = n
                .names
                .iter()
                .zip(n.projections.iter())
                .map(|(name, rex)| (name.clone(), resolve_rex::resolve(ctx, rex)))
                .collect();
            ctx.pop_scope();
            Project::new(input, projections)
        }

        RelOp::Sort(n) => {
            let input = resolve(ctx, &n.input);
            ctx.push_scope(input.schema().to_vec());
            let specs: Vec<_> = n
                .specs
                .iter()
                .map(|spec| SortSpec {
                    key: resolve_rex::resolve(ctx, &spec.key),
                    order: spec.order,
                    nulls: spec.nulls,
                })
                .collect();
            ctx.pop_scope();
            Sort::new(input, specs)
        }

        // Limit and offset counts cannot reference the rows they trim.
        RelOp::Limit(n) => {
            let input = resolve(ctx, &n.input);
            let limit = resolve_rex::resolve(ctx, &n.limit);
            Limit::new(input, limit)
        }

        RelOp::Offset(n) => {
            let input = resolve(ctx, &n.input);
            let offset = resolve_rex::resolve(ctx, &n.offset);
            Offset::new(input, offset)
        }

        RelOp::SetOp(n) => {
            let lhs = resolve(ctx, &n.lhs);
            let rhs = resolve(ctx, &n.rhs);
            SetOp::new(n.kind, lhs, rhs, n.quantifier)
        }

        RelOp::Join(n) => {
            let lhs = resolve(ctx, &n.lhs);
            // Only inner and left joins are lateral. Right and full joins
            // execute their right input once, without a left row in scope,
            // so its slots must not account for the left frame.
            let rhs = match n.join_type {
                JoinType::Inner | JoinType::Left => {
                    ctx.push_scope(lhs.schema().to_vec());
                    let rhs = resolve(ctx, &n.rhs);
                    ctx.pop_scope();
                    rhs
                }
                JoinType::Right | JoinType::Full => resolve(ctx, &n.rhs),
            };
            ctx.push_scope(lhs.schema().to_vec());
            ctx.push_scope(rhs.schema().to_vec());
            let condition = resolve_rex::resolve(ctx, &n.condition);
            ctx.pop_scope();
            ctx.pop_scope();
            Join::new(lhs, rhs, condition, n.join_type)
        }

        RelOp::Aggregate(n) => {
            let input = resolve(ctx, &n.input);
            ctx.push_scope(input.schema().to_vec());
            let group_keys: Vec<_> = n
                .group_names
                .iter()
                .zip(n.group_keys.iter())
                .map(|(name, key)| (name.clone(), resolve_rex::resolve(ctx, key)))
                .collect();
            let calls: Vec<_> = n
                .calls
                .iter()
                .map(|call| {
                    let args: Vec<_> = call
                        .args
                        .iter()
                        .map(|a| resolve_rex::resolve(ctx, a))
                        .collect();
                    resolve_fn::resolve_agg_call(ctx, call, args)
                })
                .collect();
            ctx.pop_scope();
            Aggregate::new(input, n.strategy, calls, group_keys)
        }

        RelOp::Exclude(n) => {
            let input = resolve(ctx, &n.input);
            let items = exclude::resolve_items(ctx, input.schema(), &n.items);
            Exclude::new(input, items)
        }

        RelOp::Err { .. } => rel.clone(),
    }
}
