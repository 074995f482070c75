//! Row-at-a-time reference executor.
//!
//! Each operator consumes its children's rows and emits rows holding only
//! its own schema's values. Expressions inside an operator evaluate against
//! the flat row formed by the outer scopes' values followed by the
//! operator's input row, matching the slot layout resolution assigned.

use std::collections::{HashMap, HashSet};

use ahash::RandomState;
use bramble_error::{BrambleError, Result};
use tracing::debug;

use super::evaluator::{concat_row, evaluate};
use super::{EvalContext, EvalMode, Row};
use crate::expr::Rex;
use crate::functions::aggregate::{Accumulator, SetQuantifier};
use crate::rel::aggregate::{AggExpr, Aggregate, AggregateStrategy};
use crate::rel::exclude::{Exclude, ExcludeItem, ExcludeRoot, ExcludeStep};
use crate::rel::join::{Join, JoinType};
use crate::rel::setop::{SetOp, SetOpKind};
use crate::rel::sort::{NullOrder, SortOrder, SortSpec};
use crate::rel::{Rel, RelOp};
use crate::values::{Value, total_cmp};

/// Execute a resolved relational tree, producing its rows.
///
/// Trees containing error nodes are refused up front, reporting every
/// diagnostic at once.
pub fn execute(rel: &Rel, ctx: &EvalContext) -> Result<Vec<Row>> {
    let mut errors = Vec::new();
    rel.collect_errors(&mut errors);
    if !errors.is_empty() {
        return Err(BrambleError::new("Plan contains unresolved errors")
            .with_field("count", errors.len())
            .with_field("diagnostics", errors.join("; ")));
    }

    let rows = execute_rel(rel, &Vec::new(), ctx)?;
    debug!(rows = rows.len(), "executed plan");
    Ok(rows)
}

pub(crate) fn execute_rel(rel: &Rel, outer: &Row, ctx: &EvalContext) -> Result<Vec<Row>> {
    match &rel.op {
        RelOp::Scan(n) => {
            let source = evaluate(&n.rex, outer, ctx)?;
            scan_rows(source, ctx.mode)
        }

        RelOp::ScanIndexed(n) => {
            let source = evaluate(&n.rex, outer, ctx)?;
            let rows = scan_rows(source, ctx.mode)?;
            Ok(rows
                .into_iter()
                .enumerate()
                .map(|(idx, mut row)| {
                    row.push(Value::Int64(idx as i64));
                    row
                })
                .collect())
        }

        RelOp::Unpivot(n) => {
            let source = evaluate(&n.rex, outer, ctx)?;
            Ok(unpivot_rows(source))
        }

        RelOp::Distinct(n) => {
            let input = execute_rel(&n.input, outer, ctx)?;
            let mut seen: HashSet<Value, RandomState> = HashSet::default();
            let mut out = Vec::new();
            for row in input {
                if seen.insert(row_key(&row)) {
                    out.push(row);
                }
            }
            Ok(out)
        }

        RelOp::Filter(n) => {
            let input = execute_rel(&n.input, outer, ctx)?;
            let mut out = Vec::new();
            for row in input {
                let full = concat_row(outer, row.clone());
                // Three-valued collapse: only exactly-true keeps the row.
                if evaluate(&n.predicate, &full, ctx)? == Value::Bool(true) {
                    out.push(row);
                }
            }
            Ok(out)
        }

        RelOp::Project(n) => {
            let input = execute_rel(&n.input, outer, ctx)?;
            let mut out = Vec::with_capacity(input.len());
            for row in input {
                let full = concat_row(outer, row);
                let mut projected = Vec::with_capacity(n.projections.len());
                for rex in &n.projections {
                    projected.push(evaluate(rex, &full, ctx)?);
                }
                out.push(projected);
            }
            Ok(out)
        }

        RelOp::Sort(n) => {
            let input = execute_rel(&n.input, outer, ctx)?;
            sort_rows(input, &n.specs, outer, ctx)
        }

        RelOp::Limit(n) => {
            let mut input = execute_rel(&n.input, outer, ctx)?;
            let limit = eval_count(&n.limit, outer, ctx)?;
            input.truncate(limit);
            Ok(input)
        }

        RelOp::Offset(n) => {
            let input = execute_rel(&n.input, outer, ctx)?;
            let offset = eval_count(&n.offset, outer, ctx)?;
            Ok(input.into_iter().skip(offset).collect())
        }

        RelOp::SetOp(n) => execute_setop(n, outer, ctx),

        RelOp::Join(n) => execute_join(n, outer, ctx),

        RelOp::Aggregate(n) => execute_aggregate(n, outer, ctx),

        RelOp::Exclude(n) => execute_exclude(n, outer, ctx),

        RelOp::Err { message } => Err(BrambleError::new("Cannot execute an error operator")
            .with_field("diagnostic", message.clone())),
    }
}

/// Rows of a scanned source: one single-slot row per collection element. A
/// non-collection scans as a singleton in permissive mode and errors in
/// strict mode. Absent sources scan as empty.
fn scan_rows(source: Value, mode: EvalMode) -> Result<Vec<Row>> {
    match source {
        Value::List(v) | Value::Bag(v) | Value::Sexp(v) => {
            Ok(v.into_iter().map(|elem| vec![elem]).collect())
        }
        Value::Null | Value::Missing => Ok(Vec::new()),
        other => match mode {
            EvalMode::Permissive => Ok(vec![vec![other]]),
            EvalMode::Strict => Err(BrambleError::new("Cannot scan a non-collection value")
                .with_field("actual", other.type_id())),
        },
    }
}

/// Unpivoting a struct yields one (key, value) row per field; any other
/// value yields a single row under a synthetic key.
fn unpivot_rows(source: Value) -> Vec<Row> {
    match source {
        Value::Strct(fields) => fields
            .into_iter()
            .map(|(key, value)| vec![Value::Str(key), value])
            .collect(),
        Value::Null | Value::Missing => Vec::new(),
        other => vec![vec![Value::Str("_1".to_string()), other]],
    }
}

/// Hashable key for a whole row under structural equality.
fn row_key(row: &Row) -> Value {
    Value::List(row.clone())
}

fn eval_count(rex: &Rex, outer: &Row, ctx: &EvalContext) -> Result<usize> {
    let value = evaluate(rex, outer, ctx)?;
    let count = match value {
        Value::Int8(v) => v as i64,
        Value::Int16(v) => v as i64,
        Value::Int32(v) => v as i64,
        Value::Int64(v) => v,
        Value::Int(v) => i64::try_from(v)
            .map_err(|_| BrambleError::new("Row count out of range"))?,
        other => {
            return Err(BrambleError::new("Row count must be an integer")
                .with_field("actual", other.type_id()));
        }
    };
    Ok(usize::try_from(count).unwrap_or(0))
}

fn sort_rows(rows: Vec<Row>, specs: &[SortSpec], outer: &Row, ctx: &EvalContext) -> Result<Vec<Row>> {
    // Precompute keys so the comparator stays infallible.
    let mut keyed = Vec::with_capacity(rows.len());
    for row in rows {
        let full = concat_row(outer, row.clone());
        let mut keys = Vec::with_capacity(specs.len());
        for spec in specs {
            keys.push(evaluate(&spec.key, &full, ctx)?);
        }
        keyed.push((keys, row));
    }

    // Stable, so ties keep input order.
    keyed.sort_by(|(a, _), (b, _)| {
        for (spec, (ka, kb)) in specs.iter().zip(a.iter().zip(b.iter())) {
            let ord = compare_keys(ka, kb, spec);
            if ord != std::cmp::Ordering::Equal {
                return ord;
            }
        }
        std::cmp::Ordering::Equal
    });

    Ok(keyed.into_iter().map(|(_, row)| row).collect())
}

/// Compare one sort key pair. Null placement applies regardless of the sort
/// direction; missing sorts with null.
fn compare_keys(a: &Value, b: &Value, spec: &SortSpec) -> std::cmp::Ordering {
    use std::cmp::Ordering;

    match (a.is_absent(), b.is_absent()) {
        (true, true) => return Ordering::Equal,
        (true, false) => {
            return match spec.nulls {
                NullOrder::First => Ordering::Less,
                NullOrder::Last => Ordering::Greater,
            };
        }
        (false, true) => {
            return match spec.nulls {
                NullOrder::First => Ordering::Greater,
                NullOrder::Last => Ordering::Less,
            };
        }
        (false, false) => {}
    }

    let ord = total_cmp(a, b);
    match spec.order {
        SortOrder::Asc => ord,
        SortOrder::Desc => ord.reverse(),
    }
}

fn execute_setop(setop: &SetOp, outer: &Row, ctx: &EvalContext) -> Result<Vec<Row>> {
    let lhs = execute_rel(&setop.lhs, outer, ctx)?;
    let rhs = execute_rel(&setop.rhs, outer, ctx)?;

    let out = match (setop.kind, setop.quantifier) {
        (SetOpKind::Union, SetQuantifier::All) => {
            let mut out = lhs;
            out.extend(rhs);
            out
        }
        (SetOpKind::Union, SetQuantifier::Distinct) => {
            let mut seen: HashSet<Value, RandomState> = HashSet::default();
            let mut out = Vec::new();
            for row in lhs.into_iter().chain(rhs) {
                if seen.insert(row_key(&row)) {
                    out.push(row);
                }
            }
            out
        }
        (SetOpKind::Intersect, SetQuantifier::All) => {
            // Multiset intersection: each match consumes one right row.
            let mut counts = multiset(&rhs);
            let mut out = Vec::new();
            for row in lhs {
                if let Some(count) = counts.get_mut(&row_key(&row)) {
                    if *count > 0 {
                        *count -= 1;
                        out.push(row);
                    }
                }
            }
            out
        }
        (SetOpKind::Intersect, SetQuantifier::Distinct) => {
            let keys: HashSet<Value, RandomState> = rhs.iter().map(row_key).collect();
            let mut seen: HashSet<Value, RandomState> = HashSet::default();
            let mut out = Vec::new();
            for row in lhs {
                let key = row_key(&row);
                if keys.contains(&key) && seen.insert(key) {
                    out.push(row);
                }
            }
            out
        }
        (SetOpKind::Except, SetQuantifier::All) => {
            // Multiset difference: each right row cancels one left row.
            let mut counts = multiset(&rhs);
            let mut out = Vec::new();
            for row in lhs {
                match counts.get_mut(&row_key(&row)) {
                    Some(count) if *count > 0 => *count -= 1,
                    _ => out.push(row),
                }
            }
            out
        }
        (SetOpKind::Except, SetQuantifier::Distinct) => {
            let keys: HashSet<Value, RandomState> = rhs.iter().map(row_key).collect();
            let mut seen: HashSet<Value, RandomState> = HashSet::default();
            let mut out = Vec::new();
            for row in lhs {
                let key = row_key(&row);
                if !keys.contains(&key) && seen.insert(key) {
                    out.push(row);
                }
            }
            out
        }
    };
    Ok(out)
}

fn multiset(rows: &[Row]) -> HashMap<Value, usize, RandomState> {
    let mut counts: HashMap<Value, usize, RandomState> = HashMap::default();
    for row in rows {
        *counts.entry(row_key(row)).or_insert(0) += 1;
    }
    counts
}

/// Nested-loop join. The right input is lateral for INNER and LEFT joins: it
/// re-executes per left row with that row in scope. RIGHT and FULL joins need
/// an independent right input and execute it once.
fn execute_join(join: &Join, outer: &Row, ctx: &EvalContext) -> Result<Vec<Row>> {
    let lhs = execute_rel(&join.lhs, outer, ctx)?;
    let rhs_width = join.rhs.schema().len();
    let lhs_width = join.lhs.schema().len();

    let mut out = Vec::new();
    match join.join_type {
        JoinType::Inner | JoinType::Left => {
            for left in lhs {
                let left_scope = concat_row(outer, left.clone());
                let rhs = execute_rel(&join.rhs, &left_scope, ctx)?;
                let mut matched = false;
                for right in rhs {
                    let full = concat_row(&left_scope, right.clone());
                    if evaluate(&join.condition, &full, ctx)? == Value::Bool(true) {
                        matched = true;
                        out.push(joined_row(&left, right));
                    }
                }
                if !matched && join.join_type == JoinType::Left {
                    out.push(joined_row(&left, missing_pad(rhs_width)));
                }
            }
        }
        JoinType::Right => {
            let rhs = execute_rel(&join.rhs, outer, ctx)?;
            for right in rhs {
                let mut matched = false;
                for left in &lhs {
                    let full = full_row(outer, left, &right);
                    if evaluate(&join.condition, &full, ctx)? == Value::Bool(true) {
                        matched = true;
                        out.push(joined_row(left, right.clone()));
                    }
                }
                if !matched {
                    out.push(joined_row(&missing_pad(lhs_width), right));
                }
            }
        }
        JoinType::Full => {
            let rhs = execute_rel(&join.rhs, outer, ctx)?;
            let mut right_matched = vec![false; rhs.len()];
            for left in &lhs {
                let mut matched = false;
                for (ridx, right) in rhs.iter().enumerate() {
                    let full = full_row(outer, left, right);
                    if evaluate(&join.condition, &full, ctx)? == Value::Bool(true) {
                        matched = true;
                        right_matched[ridx] = true;
                        out.push(joined_row(left, right.clone()));
                    }
                }
                if !matched {
                    out.push(joined_row(left, missing_pad(rhs_width)));
                }
            }
            for (ridx, right) in rhs.into_iter().enumerate() {
                if !right_matched[ridx] {
                    out.push(joined_row(&missing_pad(lhs_width), right));
                }
            }
        }
    }
    Ok(out)
}

fn joined_row(left: &Row, right: Row) -> Row {
    let mut row = left.clone();
    row.extend(right);
    row
}

fn full_row(outer: &Row, left: &Row, right: &Row) -> Row {
    let mut full = outer.clone();
    full.extend(left.iter().cloned());
    full.extend(right.iter().cloned());
    full
}

/// Unmatched sides pad with missing, not null: the binding is absent, not
/// unknown.
fn missing_pad(width: usize) -> Row {
    vec![Value::Missing; width]
}

struct Group {
    keys: Vec<Value>,
    accumulators: Vec<Box<dyn Accumulator>>,
}

fn execute_aggregate(agg: &Aggregate, outer: &Row, ctx: &EvalContext) -> Result<Vec<Row>> {
    let input = execute_rel(&agg.input, outer, ctx)?;

    let new_group = |keys: Vec<Value>| -> Result<Group> {
        let mut accumulators = Vec::with_capacity(agg.calls.len());
        for call in &agg.calls {
            let func = match &call.agg {
                AggExpr::Resolved(func) => func,
                AggExpr::Unresolved(name) => {
                    return Err(BrambleError::new("Cannot execute an unresolved aggregate")
                        .with_field("function", name.to_string()));
                }
            };
            accumulators.push(func.new_accumulator(call.quantifier));
        }
        Ok(Group { keys, accumulators })
    };

    // Groups in first-seen order.
    let mut index: HashMap<Value, usize, RandomState> = HashMap::default();
    let mut groups: Vec<Group> = Vec::new();

    for row in input {
        let full = concat_row(outer, row);
        let mut keys = Vec::with_capacity(agg.group_keys.len());
        for key in &agg.group_keys {
            keys.push(evaluate(key, &full, ctx)?);
        }

        let group_idx = match index.get(&Value::List(keys.clone())) {
            Some(&idx) => idx,
            None => {
                let idx = groups.len();
                index.insert(Value::List(keys.clone()), idx);
                groups.push(new_group(keys)?);
                idx
            }
        };

        for (call, accumulator) in agg
            .calls
            .iter()
            .zip(groups[group_idx].accumulators.iter_mut())
        {
            let arg = call.args.first().ok_or_else(|| {
                BrambleError::new("Aggregate call has no argument")
                    .with_field("function", call.name.to_string())
            })?;
            let value = evaluate(arg, &full, ctx)?;
            // Absent inputs never reach accumulators.
            if !value.is_absent() {
                accumulator.update(&value)?;
            }
        }
    }

    // A global aggregate over zero rows still produces one group.
    if groups.is_empty() && agg.group_keys.is_empty() {
        groups.push(new_group(Vec::new())?);
    }

    let mut out = Vec::with_capacity(groups.len());
    for mut group in groups {
        let mut row = group.keys;
        for accumulator in &mut group.accumulators {
            let value = match agg.strategy {
                AggregateStrategy::Full => accumulator.finish()?,
                AggregateStrategy::Partial => accumulator.partial()?,
            };
            row.push(value);
        }
        out.push(row);
    }
    Ok(out)
}

fn execute_exclude(exclude: &Exclude, outer: &Row, ctx: &EvalContext) -> Result<Vec<Row>> {
    let input = execute_rel(&exclude.input, outer, ctx)?;
    let mut out = Vec::with_capacity(input.len());
    for mut row in input {
        for item in &exclude.items {
            apply_exclude_item(&mut row, item)?;
        }
        out.push(row);
    }
    Ok(out)
}

fn apply_exclude_item(row: &mut Row, item: &ExcludeItem) -> Result<()> {
    let slot = match &item.root {
        ExcludeRoot::Resolved(slot) => *slot,
        ExcludeRoot::Unresolved(name) => {
            return Err(BrambleError::new("Cannot execute an unresolved exclusion")
                .with_field("binding", name.to_string()));
        }
    };
    if let Some(value) = row.get_mut(slot) {
        *value = exclude_value(value, &item.steps);
    }
    Ok(())
}

/// Structurally remove the path named by `steps` from the value. Removal is
/// destructive: the field or element is gone from the output, not nulled.
/// Paths that miss leave the value untouched.
fn exclude_value(value: &Value, steps: &[ExcludeStep]) -> Value {
    let Some((step, rest)) = steps.split_first() else {
        return value.clone();
    };

    if rest.is_empty() {
        return match (step, value) {
            (ExcludeStep::Attr(sym), Value::Strct(fields)) => Value::Strct(
                fields
                    .iter()
                    .filter(|(name, _)| !sym.matches(name))
                    .cloned()
                    .collect(),
            ),
            (ExcludeStep::Pos(idx), _) => remove_element(value, *idx),
            (ExcludeStep::StructWildcard, Value::Strct(_)) => Value::Strct(Vec::new()),
            (ExcludeStep::CollectionWildcard, Value::List(_)) => Value::List(Vec::new()),
            (ExcludeStep::CollectionWildcard, Value::Bag(_)) => Value::Bag(Vec::new()),
            (ExcludeStep::CollectionWildcard, Value::Sexp(_)) => Value::Sexp(Vec::new()),
            _ => value.clone(),
        };
    }

    match (step, value) {
        (ExcludeStep::Attr(sym), Value::Strct(fields)) => Value::Strct(
            fields
                .iter()
                .map(|(name, field)| {
                    if sym.matches(name) {
                        (name.clone(), exclude_value(field, rest))
                    } else {
                        (name.clone(), field.clone())
                    }
                })
                .collect(),
        ),
        (ExcludeStep::Pos(idx), _) => map_element(value, *idx, rest),
        (ExcludeStep::StructWildcard, Value::Strct(fields)) => Value::Strct(
            fields
                .iter()
                .map(|(name, field)| (name.clone(), exclude_value(field, rest)))
                .collect(),
        ),
        (ExcludeStep::CollectionWildcard, _) if value.as_collection().is_some() => {
            map_collection(value, |elem| exclude_value(elem, rest))
        }
        _ => value.clone(),
    }
}

fn element_index(len: usize, idx: i64) -> Option<usize> {
    let len = len as i64;
    let at = if idx < 0 { len + idx } else { idx };
    if at < 0 || at >= len {
        None
    } else {
        Some(at as usize)
    }
}

fn remove_element(value: &Value, idx: i64) -> Value {
    let Some(elems) = value.as_collection() else {
        return value.clone();
    };
    let Some(at) = element_index(elems.len(), idx) else {
        return value.clone();
    };
    let mut elems = elems.to_vec();
    elems.remove(at);
    rebuild_collection(value, elems)
}

fn map_element(value: &Value, idx: i64, rest: &[ExcludeStep]) -> Value {
    let Some(elems) = value.as_collection() else {
        return value.clone();
    };
    let Some(at) = element_index(elems.len(), idx) else {
        return value.clone();
    };
    let mut elems = elems.to_vec();
    elems[at] = exclude_value(&elems[at], rest);
    rebuild_collection(value, elems)
}

fn map_collection(value: &Value, f: impl Fn(&Value) -> Value) -> Value {
    let elems = value
        .as_collection()
        .map(|elems| elems.iter().map(&f).collect())
        .unwrap_or_default();
    rebuild_collection(value, elems)
}

fn rebuild_collection(like: &Value, elems: Vec<Value>) -> Value {
    match like {
        Value::List(_) => Value::List(elems),
        Value::Bag(_) => Value::Bag(elems),
        Value::Sexp(_) => Value::Sexp(elems),
        _ => Value::List(elems),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::RexOp;
    use crate::ident::Symbol;
    use crate::rel::distinct::Distinct;
    use crate::rel::filter::Filter;
    use crate::rel::limit::{Limit, Offset};
    use crate::rel::scan::Scan;
    use crate::rel::sort::Sort;
    use crate::types::StaticType;

    fn ctx() -> EvalContext {
        EvalContext::new(EvalMode::Permissive)
    }

    fn ints(values: &[i64]) -> Value {
        Value::Bag(values.iter().map(|v| Value::Int64(*v)).collect())
    }

    fn scan(values: &[i64]) -> Rel {
        Scan::new(Rex::lit(ints(values)), Symbol::insensitive("x"))
    }

    fn slot(idx: usize) -> Rex {
        Rex::new(StaticType::Dynamic, RexOp::VarResolved { slot: idx })
    }

    fn rows_to_ints(rows: Vec<Row>) -> Vec<i64> {
        rows.into_iter()
            .map(|row| match &row[0] {
                Value::Int64(v) => *v,
                other => panic!("unexpected value {other}"),
            })
            .collect()
    }

    #[test]
    fn execute_refuses_err_trees_with_all_diagnostics() {
        let rel = Filter::new(
            Scan::new(Rex::error("first"), Symbol::insensitive("x")),
            Rex::error("second"),
        );
        let err = execute(&rel, &ctx()).unwrap_err();
        let message = format!("{err:?}");
        assert!(message.contains("first"), "{message}");
        assert!(message.contains("second"), "{message}");
    }

    #[test]
    fn filter_collapses_three_valued() {
        use crate::resolver::{ResolveOptions, resolve_rel};

        // x > 2 is null for a null element and true only for 3 and 4.
        let source = Value::Bag(vec![
            Value::Int64(1),
            Value::Null,
            Value::Int64(3),
            Value::Int64(4),
        ]);
        let predicate = Rex::new(
            StaticType::Dynamic,
            RexOp::CallUnresolved {
                name: Symbol::insensitive(">"),
                args: vec![slot(0), Rex::lit(Value::Int64(2))],
            },
        );
        let rel = Filter::new(
            Scan::new(Rex::lit(source), Symbol::insensitive("x")),
            predicate,
        );
        let catalog = crate::functions::registry::Catalog::with_builtins();
        let resolution = resolve_rel(&rel, &catalog, &ResolveOptions::default());
        assert!(resolution.is_clean(), "{:?}", resolution.diagnostics);

        let rows = execute(&resolution.root, &ctx()).unwrap();
        assert_eq!(vec![3, 4], rows_to_ints(rows));
    }

    #[test]
    fn distinct_keeps_first_occurrence() {
        let rel = Distinct::new(scan(&[3, 1, 3, 2, 1]));
        let rows = execute(&rel, &ctx()).unwrap();
        assert_eq!(vec![3, 1, 2], rows_to_ints(rows));
    }

    #[test]
    fn sort_is_stable_with_null_placement() {
        let source = Value::List(vec![
            Value::Int64(2),
            Value::Null,
            Value::Int64(1),
            Value::Int64(2),
        ]);
        let rel = Sort::new(
            Scan::new(Rex::lit(source), Symbol::insensitive("x")),
            vec![SortSpec {
                key: slot(0),
                order: SortOrder::Asc,
                nulls: NullOrder::Last,
            }],
        );
        let rows = execute(&rel, &ctx()).unwrap();
        assert_eq!(
            vec![
                Value::Int64(1),
                Value::Int64(2),
                Value::Int64(2),
                Value::Null
            ],
            rows.into_iter().map(|mut r| r.remove(0)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn sort_desc_keeps_null_placement() {
        let source = Value::List(vec![Value::Int64(1), Value::Null, Value::Int64(2)]);
        let rel = Sort::new(
            Scan::new(Rex::lit(source), Symbol::insensitive("x")),
            vec![SortSpec {
                key: slot(0),
                order: SortOrder::Desc,
                nulls: NullOrder::First,
            }],
        );
        let rows = execute(&rel, &ctx()).unwrap();
        assert_eq!(
            vec![Value::Null, Value::Int64(2), Value::Int64(1)],
            rows.into_iter().map(|mut r| r.remove(0)).collect::<Vec<_>>()
        );
    }

    #[test]
    fn limit_offset() {
        let rel = Offset::new(
            Limit::new(scan(&[1, 2, 3, 4, 5]), Rex::lit(Value::Int64(4))),
            Rex::lit(Value::Int64(1)),
        );
        let rows = execute(&rel, &ctx()).unwrap();
        assert_eq!(vec![2, 3, 4], rows_to_ints(rows));
    }

    #[test]
    fn union_all_keeps_duplicates() {
        let rel = SetOp::new(
            SetOpKind::Union,
            scan(&[1, 2]),
            scan(&[2, 3]),
            SetQuantifier::All,
        );
        let rows = execute(&rel, &ctx()).unwrap();
        assert_eq!(vec![1, 2, 2, 3], rows_to_ints(rows));
    }

    #[test]
    fn intersect_all_uses_multiset_counts() {
        let rel = SetOp::new(
            SetOpKind::Intersect,
            scan(&[1, 1, 2, 3]),
            scan(&[1, 1, 1, 2]),
            SetQuantifier::All,
        );
        let rows = execute(&rel, &ctx()).unwrap();
        assert_eq!(vec![1, 1, 2], rows_to_ints(rows));
    }

    #[test]
    fn except_distinct_dedupes() {
        let rel = SetOp::new(
            SetOpKind::Except,
            scan(&[1, 1, 2, 3]),
            scan(&[2]),
            SetQuantifier::Distinct,
        );
        let rows = execute(&rel, &ctx()).unwrap();
        assert_eq!(vec![1, 3], rows_to_ints(rows));
    }

    #[test]
    fn left_join_pads_with_missing() {
        use crate::rel::join::Join;
        use crate::resolver::{ResolveOptions, resolve_rel};

        let lhs = Scan::new(Rex::lit(ints(&[1, 2])), Symbol::insensitive("l"));
        let rhs = Scan::new(Rex::lit(ints(&[2, 3])), Symbol::insensitive("r"));
        let condition = Rex::new(
            StaticType::Dynamic,
            RexOp::CallUnresolved {
                name: Symbol::insensitive("="),
                args: vec![
                    Rex::new(
                        StaticType::Dynamic,
                        RexOp::VarUnresolved {
                            name: Symbol::insensitive("l"),
                            scope: crate::expr::VarScope::Local,
                        },
                    ),
                    Rex::new(
                        StaticType::Dynamic,
                        RexOp::VarUnresolved {
                            name: Symbol::insensitive("r"),
                            scope: crate::expr::VarScope::Local,
                        },
                    ),
                ],
            },
        );
        let rel = Join::new(lhs, rhs, condition, JoinType::Left);
        let catalog = crate::functions::registry::Catalog::with_builtins();
        let resolution = resolve_rel(&rel, &catalog, &ResolveOptions::default());
        assert!(resolution.is_clean(), "{:?}", resolution.diagnostics);

        let rows = execute(&resolution.root, &ctx()).unwrap();
        assert_eq!(
            vec![
                vec![Value::Int64(1), Value::Missing],
                vec![Value::Int64(2), Value::Int64(2)],
            ],
            rows
        );
    }

    #[test]
    fn right_join_filtered_right_input_binds_without_left_frame() {
        use crate::rel::join::Join;
        use crate::resolver::{ResolveOptions, resolve_rel};

        // A right join runs its right input once, with no left row in scope;
        // variables inside it must bind relative to the outer scope only.
        let lhs = Scan::new(Rex::lit(ints(&[1, 2])), Symbol::insensitive("l"));
        let rhs = Filter::new(
            Scan::new(Rex::lit(ints(&[1, 2, 3])), Symbol::insensitive("r")),
            Rex::new(
                StaticType::Dynamic,
                RexOp::CallUnresolved {
                    name: Symbol::insensitive(">"),
                    args: vec![
                        Rex::new(
                            StaticType::Dynamic,
                            RexOp::VarUnresolved {
                                name: Symbol::insensitive("r"),
                                scope: crate::expr::VarScope::Local,
                            },
                        ),
                        Rex::lit(Value::Int64(1)),
                    ],
                },
            ),
        );
        let rel = Join::new(lhs, rhs, Rex::lit(Value::Bool(true)), JoinType::Right);
        let catalog = crate::functions::registry::Catalog::with_builtins();
        let resolution = resolve_rel(&rel, &catalog, &ResolveOptions::default());
        assert!(resolution.is_clean(), "{:?}", resolution.diagnostics);

        let rows = execute(&resolution.root, &ctx()).unwrap();
        assert_eq!(
            vec![
                vec![Value::Int64(1), Value::Int64(2)],
                vec![Value::Int64(2), Value::Int64(2)],
                vec![Value::Int64(1), Value::Int64(3)],
                vec![Value::Int64(2), Value::Int64(3)],
            ],
            rows
        );
    }

    #[test]
    fn aggregate_groups_in_first_seen_order() {
        use crate::rel::aggregate::{AggCall, Aggregate, AggregateStrategy};
        use crate::resolver::{ResolveOptions, resolve_rel};

        // Group the parity of each value and count the members.
        let source = Value::Bag(vec![
            Value::Int64(3),
            Value::Int64(4),
            Value::Int64(5),
            Value::Null,
        ]);
        let key = Rex::new(
            StaticType::Dynamic,
            RexOp::CallUnresolved {
                name: Symbol::insensitive("%"),
                args: vec![slot(0), Rex::lit(Value::Int64(2))],
            },
        );
        let call = AggCall {
            name: Symbol::insensitive("n"),
            agg: crate::rel::aggregate::AggExpr::Unresolved(Symbol::insensitive("count")),
            quantifier: SetQuantifier::All,
            args: vec![slot(0)],
        };
        let rel = Aggregate::new(
            Scan::new(Rex::lit(source), Symbol::insensitive("x")),
            AggregateStrategy::Full,
            vec![call],
            vec![(Symbol::insensitive("parity"), key)],
        );
        let catalog = crate::functions::registry::Catalog::with_builtins();
        let resolution = resolve_rel(&rel, &catalog, &ResolveOptions::default());
        assert!(resolution.is_clean(), "{:?}", resolution.diagnostics);

        let rows = execute(&resolution.root, &ctx()).unwrap();
        // Odd group first (3 seen first), then even, then the null-key group;
        // count skips nothing here since each group's member is present.
        assert_eq!(
            vec![
                vec![Value::Int64(1), Value::Int64(2)],
                vec![Value::Int64(0), Value::Int64(1)],
                vec![Value::Null, Value::Int64(0)],
            ],
            rows
        );
    }

    #[test]
    fn global_aggregate_over_empty_input_yields_one_row() {
        use crate::rel::aggregate::{AggCall, Aggregate, AggregateStrategy};
        use crate::resolver::{ResolveOptions, resolve_rel};

        let call = AggCall {
            name: Symbol::insensitive("n"),
            agg: crate::rel::aggregate::AggExpr::Unresolved(Symbol::insensitive("count")),
            quantifier: SetQuantifier::All,
            args: vec![slot(0)],
        };
        let rel = Aggregate::new(
            scan(&[]),
            AggregateStrategy::Full,
            vec![call],
            Vec::new(),
        );
        let catalog = crate::functions::registry::Catalog::with_builtins();
        let resolution = resolve_rel(&rel, &catalog, &ResolveOptions::default());
        assert!(resolution.is_clean(), "{:?}", resolution.diagnostics);

        let rows = execute(&resolution.root, &ctx()).unwrap();
        assert_eq!(vec![vec![Value::Int64(0)]], rows);
    }

    #[test]
    fn exclude_removes_nested_field_destructively() {
        use crate::rel::exclude::Exclude;

        let row_value = Value::Strct(vec![
            (
                "a".to_string(),
                Value::Strct(vec![
                    ("b".to_string(), Value::Int64(1)),
                    ("c".to_string(), Value::Int64(2)),
                ]),
            ),
            ("d".to_string(), Value::Int64(3)),
        ]);
        let rel = Exclude::new(
            Scan::new(
                Rex::lit(Value::Bag(vec![row_value])),
                Symbol::insensitive("t"),
            ),
            vec![ExcludeItem {
                root: ExcludeRoot::Resolved(0),
                steps: vec![
                    ExcludeStep::Attr(Symbol::insensitive("a")),
                    ExcludeStep::Attr(Symbol::insensitive("b")),
                ],
            }],
        );
        let rows = execute(&rel, &ctx()).unwrap();
        assert_eq!(
            vec![vec![Value::Strct(vec![
                (
                    "a".to_string(),
                    Value::Strct(vec![("c".to_string(), Value::Int64(2))]),
                ),
                ("d".to_string(), Value::Int64(3)),
            ])]],
            rows
        );
    }

    #[test]
    fn exclude_collection_wildcard_fans_out() {
        use crate::rel::exclude::Exclude;

        let row_value = Value::List(vec![
            Value::Strct(vec![
                ("a".to_string(), Value::Int64(1)),
                ("b".to_string(), Value::Int64(2)),
            ]),
            Value::Strct(vec![("a".to_string(), Value::Int64(3))]),
        ]);
        let rel = Exclude::new(
            Scan::new(
                Rex::lit(Value::Bag(vec![row_value])),
                Symbol::insensitive("t"),
            ),
            vec![ExcludeItem {
                root: ExcludeRoot::Resolved(0),
                steps: vec![
                    ExcludeStep::CollectionWildcard,
                    ExcludeStep::Attr(Symbol::insensitive("a")),
                ],
            }],
        );
        let rows = execute(&rel, &ctx()).unwrap();
        assert_eq!(
            vec![vec![Value::List(vec![
                Value::Strct(vec![("b".to_string(), Value::Int64(2))]),
                Value::Strct(vec![]),
            ])]],
            rows
        );
    }

    #[test]
    fn unpivot_structs_and_scalars() {
        use crate::rel::scan::Unpivot;

        let rel = Unpivot::new(
            Rex::lit(Value::Strct(vec![
                ("a".to_string(), Value::Int64(1)),
                ("b".to_string(), Value::Int64(2)),
            ])),
            Symbol::insensitive("k"),
            Symbol::insensitive("v"),
        );
        let rows = execute(&rel, &ctx()).unwrap();
        assert_eq!(
            vec![
                vec![Value::Str("a".to_string()), Value::Int64(1)],
                vec![Value::Str("b".to_string()), Value::Int64(2)],
            ],
            rows
        );

        let rel = Unpivot::new(
            Rex::lit(Value::Int64(9)),
            Symbol::insensitive("k"),
            Symbol::insensitive("v"),
        );
        let rows = execute(&rel, &ctx()).unwrap();
        assert_eq!(vec![vec![Value::Str("_1".to_string()), Value::Int64(9)]], rows);
    }

    #[test]
    fn strict_scan_of_scalar_errors() {
        let rel = Scan::new(Rex::lit(Value::Int64(1)), Symbol::insensitive("x"));
        assert!(execute(&rel, &EvalContext::new(EvalMode::Strict)).is_err());
        assert_eq!(1, execute(&rel, &ctx()).unwrap().len());
    }
}
