//! Tree-walking expression evaluation.
//!
//! Evaluation happens against a flat row of slot values: the outer scopes'
//! values concatenated with the current operator's own bindings, matching
//! the slot layout resolution assigned.

use bramble_error::{BrambleError, Result};

use super::cast::cast_value;
use super::executor::execute_rel;
use super::{EvalContext, EvalMode, Row};
use crate::expr::path::PathStep;
use crate::expr::{DynamicCandidate, Rex, RexOp, SubqueryCoercion};
use crate::functions::Signature;
use crate::functions::function_set::FunctionInfo;
use crate::functions::implicit::implicit_cast_score;
use crate::functions::scalar::{NullPropagation, PlannedScalarFunction};
use crate::ident::QualifiedName;
use crate::types::{StaticType, TypeId};
use crate::values::Value;

pub fn evaluate(rex: &Rex, row: &Row, ctx: &EvalContext) -> Result<Value> {
    match &rex.op {
        RexOp::Lit(value) => Ok(value.clone()),

        RexOp::VarResolved { slot } => row.get(*slot).cloned().ok_or_else(|| {
            BrambleError::new("Variable slot out of range")
                .with_field("slot", *slot)
                .with_field("row_len", row.len())
        }),

        RexOp::Global { name } => eval_global(name, ctx),

        RexOp::VarUnresolved { name, .. } => Err(BrambleError::new(
            "Cannot evaluate an unresolved variable",
        )
        .with_field("variable", name.to_string())),

        RexOp::CallUnresolved { name, .. } => Err(BrambleError::new(
            "Cannot evaluate an unresolved function call",
        )
        .with_field("function", name.to_string())),

        RexOp::Path { root, steps } => {
            let root = evaluate(root, row, ctx)?;
            navigate(&root, steps)
        }

        RexOp::CallStatic { func, args } => {
            let args = eval_args(args, row, ctx)?;
            invoke_scalar(func, args, ctx.mode)
        }

        RexOp::CallDynamic { args, candidates } => {
            let args = eval_args(args, row, ctx)?;
            dispatch_dynamic(args, candidates, ctx.mode)
        }

        RexOp::Cast { arg, target } => {
            let value = evaluate(arg, row, ctx)?;
            cast_value(&value, target, ctx.mode)
        }

        RexOp::Case { branches, default } => {
            for branch in branches {
                let cond = evaluate(&branch.condition, row, ctx)?;
                // Null, missing, and false all fall through.
                if cond == Value::Bool(true) {
                    return evaluate(&branch.result, row, ctx);
                }
            }
            evaluate(default, row, ctx)
        }

        RexOp::Coll { kind, values } => {
            let mut out = Vec::with_capacity(values.len());
            for value in values {
                let value = evaluate(value, row, ctx)?;
                // Missing elements vanish from constructed collections.
                if !value.is_missing() {
                    out.push(value);
                }
            }
            use crate::expr::CollKind;
            Ok(match kind {
                CollKind::List => Value::List(out),
                CollKind::Bag => Value::Bag(out),
                CollKind::Sexp => Value::Sexp(out),
            })
        }

        RexOp::Strct { fields } => {
            let mut out = Vec::with_capacity(fields.len());
            for (key, value) in fields {
                let key = evaluate(key, row, ctx)?;
                let value = evaluate(value, row, ctx)?;
                push_struct_field(&mut out, key, value, ctx.mode)?;
            }
            Ok(Value::Strct(out))
        }

        RexOp::Pivot { key, value, rel } => {
            let rows = execute_rel(rel, row, ctx)?;
            let mut out = Vec::with_capacity(rows.len());
            for rel_row in rows {
                let full = concat_row(row, rel_row);
                let key = evaluate(key, &full, ctx)?;
                let value = evaluate(value, &full, ctx)?;
                push_struct_field(&mut out, key, value, ctx.mode)?;
            }
            Ok(Value::Strct(out))
        }

        RexOp::Select { constructor, rel } => {
            let rows = execute_rel(rel, row, ctx)?;
            let mut out = Vec::with_capacity(rows.len());
            for rel_row in rows {
                let full = concat_row(row, rel_row);
                out.push(evaluate(constructor, &full, ctx)?);
            }
            Ok(Value::Bag(out))
        }

        RexOp::Subquery { select, coercion } => {
            let value = evaluate(select, row, ctx)?;
            coerce_subquery(value, *coercion, ctx.mode)
        }

        RexOp::TupleUnion { args } => {
            let mut out = Vec::new();
            for arg in args {
                let value = evaluate(arg, row, ctx)?;
                match value {
                    Value::Strct(fields) => out.extend(fields),
                    Value::Null | Value::Missing => {}
                    other => match ctx.mode {
                        EvalMode::Permissive => {}
                        EvalMode::Strict => {
                            return Err(BrambleError::new(
                                "tupleunion argument must be a struct",
                            )
                            .with_field("actual", other.type_id()));
                        }
                    },
                }
            }
            Ok(Value::Strct(out))
        }

        RexOp::Err { message } => Err(BrambleError::new("Cannot evaluate an error expression")
            .with_field("diagnostic", message.clone())),
    }
}

fn eval_args(args: &[Rex], row: &Row, ctx: &EvalContext) -> Result<Vec<Value>> {
    args.iter().map(|a| evaluate(a, row, ctx)).collect()
}

pub(crate) fn concat_row(outer: &Row, own: Row) -> Row {
    let mut full = Vec::with_capacity(outer.len() + own.len());
    full.extend(outer.iter().cloned());
    full.extend(own);
    full
}

/// Invoke a statically resolved call, honoring its propagation rule.
fn invoke_scalar(func: &PlannedScalarFunction, args: Vec<Value>, mode: EvalMode) -> Result<Value> {
    if func.propagation() == NullPropagation::Propagate {
        if let Some(out) = propagate_absent(&args, mode) {
            return Ok(out);
        }
    }
    func.invoke(&args, mode)
}

/// Absent-input result for a propagating function, if any input is absent.
fn propagate_absent(args: &[Value], mode: EvalMode) -> Option<Value> {
    if args.iter().any(|a| a.is_null()) {
        return Some(Value::Null);
    }
    if args.iter().any(|a| a.is_missing()) {
        return Some(match mode {
            EvalMode::Strict => Value::Null,
            EvalMode::Permissive => Value::Missing,
        });
    }
    None
}

/// Runtime dispatch over the resolver's ranked candidates: the first
/// candidate the actual value types satisfy wins.
fn dispatch_dynamic(
    args: Vec<Value>,
    candidates: &[DynamicCandidate],
    mode: EvalMode,
) -> Result<Value> {
    for candidate in candidates {
        let sig = candidate.function.function.signature();
        if !args_satisfy(&args, sig) {
            continue;
        }

        if candidate.function.propagation() == NullPropagation::Propagate {
            if let Some(out) = propagate_absent(&args, mode) {
                return Ok(out);
            }
        }

        let mut casted = Vec::with_capacity(args.len());
        for (idx, arg) in args.iter().enumerate() {
            let want = param_at(sig, idx);
            let target = StaticType::from_type_id(want);
            casted.push(cast_value(arg, &target, mode)?);
        }
        return candidate.function.invoke(&casted, mode);
    }

    match mode {
        EvalMode::Permissive => Ok(Value::Missing),
        EvalMode::Strict => {
            let name = candidates.first().map(|c| c.function.name).unwrap_or("?");
            let types: Vec<_> = args.iter().map(|a| a.type_id().to_string()).collect();
            Err(BrambleError::new("No function overload matches the runtime values")
                .with_field("function", name)
                .with_field("types", types.join(", ")))
        }
    }
}

fn param_at(sig: &Signature, idx: usize) -> TypeId {
    match sig.positional_args.get(idx) {
        Some(&id) => id,
        None => sig.variadic_arg.unwrap_or(TypeId::Dynamic),
    }
}

fn args_satisfy(args: &[Value], sig: &Signature) -> bool {
    if !sig.accepts_arity(args.len()) {
        return false;
    }
    args.iter().enumerate().all(|(idx, arg)| {
        let want = param_at(sig, idx);
        want == TypeId::Dynamic
            || arg.is_absent()
            || arg.type_id() == want
            || implicit_cast_score(arg.type_id(), want).is_some()
    })
}

fn eval_global(name: &QualifiedName, ctx: &EvalContext) -> Result<Value> {
    let root = ctx.global(&name.root).ok_or_else(|| {
        BrambleError::new("Undefined global").with_field("name", name.to_string())
    })?;
    let steps: Vec<PathStep> = name
        .steps
        .iter()
        .map(|s| PathStep::Key(s.clone()))
        .collect();
    navigate(root, &steps)
}

/// Navigate a value by path steps. Steps that miss produce `Missing`, never
/// errors; a schemaless model defers absence to the consumer.
fn navigate(value: &Value, steps: &[PathStep]) -> Result<Value> {
    let Some((step, rest)) = steps.split_first() else {
        return Ok(value.clone());
    };

    match step {
        PathStep::Key(sym) => {
            let Some(fields) = value.as_struct() else {
                return Ok(Value::Missing);
            };
            match fields.iter().find(|(name, _)| sym.matches(name)) {
                Some((_, field)) => navigate(field, rest),
                None => Ok(Value::Missing),
            }
        }
        PathStep::Index(idx) => {
            let Some(elems) = value.as_collection() else {
                return Ok(Value::Missing);
            };
            let len = elems.len() as i64;
            // Negative indexes count from the end.
            let at = if *idx < 0 { len + *idx } else { *idx };
            if at < 0 || at >= len {
                return Ok(Value::Missing);
            }
            navigate(&elems[at as usize], rest)
        }
        PathStep::Wildcard => {
            let Some(elems) = value.as_collection() else {
                return Ok(Value::Missing);
            };
            let mut out = Vec::with_capacity(elems.len());
            for elem in elems {
                let v = navigate(elem, rest)?;
                if !v.is_missing() {
                    out.push(v);
                }
            }
            Ok(Value::List(out))
        }
        PathStep::Unpivot => {
            let values: Vec<&Value> = match value.as_struct() {
                Some(fields) => fields.iter().map(|(_, v)| v).collect(),
                // A non-struct unpivots as a singleton.
                None => vec![value],
            };
            let mut out = Vec::with_capacity(values.len());
            for v in values {
                let v = navigate(v, rest)?;
                if !v.is_missing() {
                    out.push(v);
                }
            }
            Ok(Value::List(out))
        }
    }
}

/// Append a constructed struct field, dropping it when the key is absent or
/// the value is missing.
fn push_struct_field(
    out: &mut Vec<(String, Value)>,
    key: Value,
    value: Value,
    mode: EvalMode,
) -> Result<()> {
    if key.is_absent() || value.is_missing() {
        return Ok(());
    }
    match key.as_text() {
        Some(text) => {
            out.push((text.to_string(), value));
            Ok(())
        }
        None => match mode {
            EvalMode::Permissive => Ok(()),
            EvalMode::Strict => Err(BrambleError::new("Struct field keys must be text")
                .with_field("actual", key.type_id())),
        },
    }
}

/// Collapse a subquery's bag into scalar position.
fn coerce_subquery(value: Value, coercion: SubqueryCoercion, mode: EvalMode) -> Result<Value> {
    let mut elems = match value {
        Value::Bag(v) | Value::List(v) => v,
        other => return Ok(other),
    };
    if elems.is_empty() {
        return Ok(Value::Null);
    }
    if elems.len() > 1 && mode == EvalMode::Strict {
        return Err(BrambleError::new("Subquery produced more than one row")
            .with_field("rows", elems.len()));
    }
    let first = elems.swap_remove(0);

    match coercion {
        SubqueryCoercion::Row => Ok(first),
        SubqueryCoercion::Scalar => match &first {
            Value::Strct(fields) if fields.len() == 1 => Ok(fields[0].1.clone()),
            Value::Strct(_) => match mode {
                EvalMode::Permissive => Ok(Value::Missing),
                EvalMode::Strict => Err(BrambleError::new(
                    "Scalar subquery must produce a single binding",
                )),
            },
            _ => Ok(first),
        },
    }
}
