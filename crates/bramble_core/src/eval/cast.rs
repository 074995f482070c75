//! Runtime value casts backing `Cast` nodes and dynamic-dispatch coercions.

use bramble_error::{BrambleError, Result};

use super::EvalMode;
use crate::types::{StaticType, TypeId};
use crate::values::{Decimal, Value};

/// Cast a value to the target type.
///
/// Null and missing pass through untouched; propagation is the caller's
/// concern. A cast that cannot represent the value is a typed error in strict
/// mode and missing in permissive mode.
pub fn cast_value(value: &Value, target: &StaticType, mode: EvalMode) -> Result<Value> {
    if value.is_absent() || matches!(target, StaticType::Dynamic | StaticType::AnyOf(_)) {
        return Ok(value.clone());
    }

    let cast = try_cast(value, target.type_id());
    match cast {
        Some(out) => Ok(out),
        None => match mode {
            EvalMode::Permissive => Ok(Value::Missing),
            EvalMode::Strict => Err(BrambleError::new("Cannot cast value")
                .with_field("from", value.type_id())
                .with_field("to", target.type_id())),
        },
    }
}

fn try_cast(value: &Value, target: TypeId) -> Option<Value> {
    if value.type_id() == target {
        return Some(value.clone());
    }

    Some(match (value, target) {
        (v, TypeId::Int8) => Value::Int8(i8::try_from(int_of(v)?).ok()?),
        (v, TypeId::Int16) => Value::Int16(i16::try_from(int_of(v)?).ok()?),
        (v, TypeId::Int32) => Value::Int32(i32::try_from(int_of(v)?).ok()?),
        (v, TypeId::Int64) => Value::Int64(i64::try_from(int_of(v)?).ok()?),
        (v, TypeId::Int) => Value::Int(int_of(v)?),
        (v, TypeId::Decimal) => match v {
            Value::Float32(f) => Value::Decimal(float_to_decimal(*f as f64)?),
            Value::Float64(f) => Value::Decimal(float_to_decimal(*f)?),
            _ => Value::Decimal(Decimal::from_i128(int_of(v)?)),
        },
        (v, TypeId::Float32) => Value::Float32(float_of(v)? as f32),
        (v, TypeId::Float64) => Value::Float64(float_of(v)?),
        (Value::Sym(s), TypeId::Str) => Value::Str(s.clone()),
        (Value::Str(s), TypeId::Sym) => Value::Sym(s.clone()),
        _ => return None,
    })
}

fn int_of(value: &Value) -> Option<i128> {
    match value {
        Value::Int8(i) => Some(*i as i128),
        Value::Int16(i) => Some(*i as i128),
        Value::Int32(i) => Some(*i as i128),
        Value::Int64(i) => Some(*i as i128),
        Value::Int(i) => Some(*i),
        Value::Decimal(d) if d.is_integral() => Some(d.to_i128()),
        _ => None,
    }
}

fn float_of(value: &Value) -> Option<f64> {
    match value {
        Value::Float32(f) => Some(*f as f64),
        Value::Float64(f) => Some(*f),
        Value::Decimal(d) => Some(d.to_f64()),
        _ => Some(int_of(value)? as f64),
    }
}

fn float_to_decimal(f: f64) -> Option<Decimal> {
    if !f.is_finite() {
        return None;
    }
    // Fixed scale of 9 covers the precision implicit casting permits.
    let scaled = f * 1e9;
    if scaled.abs() >= i128::MAX as f64 {
        return None;
    }
    Some(Decimal::new(scaled.round() as i128, 9))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widen_integer() {
        let out = cast_value(&Value::Int16(7), &StaticType::Int64, EvalMode::Strict).unwrap();
        assert_eq!(Value::Int64(7), out);
    }

    #[test]
    fn narrowing_out_of_range() {
        let err = cast_value(
            &Value::Int64(i64::MAX),
            &StaticType::Int8,
            EvalMode::Strict,
        )
        .unwrap_err();
        assert!(err.to_string().contains("Cannot cast"));

        let out = cast_value(
            &Value::Int64(i64::MAX),
            &StaticType::Int8,
            EvalMode::Permissive,
        )
        .unwrap();
        assert_eq!(Value::Missing, out);
    }

    #[test]
    fn absent_passes_through() {
        let out = cast_value(&Value::Null, &StaticType::Int64, EvalMode::Strict).unwrap();
        assert_eq!(Value::Null, out);
    }
}
