//! The runtime value domain: a tagged tree of scalars and nested collections.
//!
//! `missing` ("field absent") is distinct from `null` ("present but unknown");
//! both are first-class values here. Equality and ordering are structural:
//! numerics compare by numeric value across widths, bags compare as multisets,
//! and struct field order does not affect equality.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, NaiveTime, Timelike};

/// Fixed-point decimal backed by an i128 with a base-10 scale.
#[derive(Debug, Clone, Copy)]
pub struct Decimal {
    /// Unscaled value; the represented number is `value * 10^-scale`.
    pub value: i128,
    pub scale: u8,
}

impl Decimal {
    pub fn new(value: i128, scale: u8) -> Self {
        Decimal { value, scale }
    }

    pub fn from_i128(value: i128) -> Self {
        Decimal { value, scale: 0 }
    }

    pub fn to_f64(self) -> f64 {
        self.value as f64 / 10f64.powi(self.scale as i32)
    }

    /// True when the represented number has no fractional part.
    pub fn is_integral(self) -> bool {
        self.value % 10i128.pow(self.scale as u32) == 0
    }

    /// Integer part, valid when `is_integral`.
    pub fn to_i128(self) -> i128 {
        self.value / 10i128.pow(self.scale as u32)
    }

    /// Rescale both operands to a common scale for exact comparison/arith.
    pub fn align(self, other: Decimal) -> Option<(i128, i128, u8)> {
        let scale = self.scale.max(other.scale);
        let a = self
            .value
            .checked_mul(10i128.checked_pow((scale - self.scale) as u32)?)?;
        let b = other
            .value
            .checked_mul(10i128.checked_pow((scale - other.scale) as u32)?)?;
        Some((a, b, scale))
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale == 0 {
            return write!(f, "{}.", self.value);
        }
        let pow = 10i128.pow(self.scale as u32);
        let int = self.value / pow;
        let frac = (self.value % pow).unsigned_abs();
        write!(f, "{}.{:0width$}", int, frac, width = self.scale as usize)
    }
}

/// Calendar interval, kept in separate fields since months are not a fixed
/// number of days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Interval {
    pub months: i32,
    pub days: i32,
    pub nanos: i64,
}

use crate::types::{StaticType, TypeId};

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Missing,
    Bool(bool),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    /// Arbitrary-precision integer (i128-backed).
    Int(i128),
    Decimal(Decimal),
    Float32(f32),
    Float64(f64),
    Str(String),
    Sym(String),
    Clob(Vec<u8>),
    Blob(Vec<u8>),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(DateTime<FixedOffset>),
    Interval(Interval),
    List(Vec<Value>),
    Bag(Vec<Value>),
    Sexp(Vec<Value>),
    Strct(Vec<(String, Value)>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Null or missing.
    pub fn is_absent(&self) -> bool {
        matches!(self, Value::Null | Value::Missing)
    }

    pub fn type_id(&self) -> TypeId {
        match self {
            Value::Null => TypeId::Null,
            Value::Missing => TypeId::Missing,
            Value::Bool(_) => TypeId::Bool,
            Value::Int8(_) => TypeId::Int8,
            Value::Int16(_) => TypeId::Int16,
            Value::Int32(_) => TypeId::Int32,
            Value::Int64(_) => TypeId::Int64,
            Value::Int(_) => TypeId::Int,
            Value::Decimal(_) => TypeId::Decimal,
            Value::Float32(_) => TypeId::Float32,
            Value::Float64(_) => TypeId::Float64,
            Value::Str(_) => TypeId::Str,
            Value::Sym(_) => TypeId::Sym,
            Value::Clob(_) => TypeId::Clob,
            Value::Blob(_) => TypeId::Blob,
            Value::Date(_) => TypeId::Date,
            Value::Time(_) => TypeId::Time,
            Value::Timestamp(_) => TypeId::Timestamp,
            Value::Interval(_) => TypeId::Interval,
            Value::List(_) => TypeId::List,
            Value::Bag(_) => TypeId::Bag,
            Value::Sexp(_) => TypeId::Sexp,
            Value::Strct(_) => TypeId::Strct,
        }
    }

    /// Shallow static type of this value.
    pub fn static_type(&self) -> StaticType {
        StaticType::from_type_id(self.type_id())
    }

    pub fn as_struct(&self) -> Option<&[(String, Value)]> {
        match self {
            Value::Strct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Elements of a list/bag/sexp.
    pub fn as_collection(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) | Value::Bag(v) | Value::Sexp(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Sym(s) => Some(s),
            _ => None,
        }
    }
}

/// Rank separating incomparable classes in the total order.
fn class_rank(v: &Value) -> u8 {
    match v {
        Value::Missing => 0,
        Value::Null => 1,
        Value::Bool(_) => 2,
        Value::Int8(_)
        | Value::Int16(_)
        | Value::Int32(_)
        | Value::Int64(_)
        | Value::Int(_)
        | Value::Decimal(_)
        | Value::Float32(_)
        | Value::Float64(_) => 3,
        Value::Date(_) => 4,
        Value::Time(_) => 5,
        Value::Timestamp(_) => 6,
        Value::Interval(_) => 7,
        Value::Str(_) | Value::Sym(_) => 8,
        Value::Clob(_) => 9,
        Value::Blob(_) => 10,
        Value::List(_) => 11,
        Value::Sexp(_) => 12,
        Value::Bag(_) => 13,
        Value::Strct(_) => 14,
    }
}

/// Canonical numeric key: exact integers stay exact, everything else falls
/// back to f64. Keeps Eq and Hash consistent across numeric widths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum NumKey {
    Int(i128),
    Float(u64),
}

fn num_key(v: &Value) -> Option<NumKey> {
    let float_key = |f: f64| {
        if f.fract() == 0.0 && f.is_finite() && f.abs() < i128::MAX as f64 {
            NumKey::Int(f as i128)
        } else {
            NumKey::Float(f.to_bits())
        }
    };
    Some(match v {
        Value::Int8(i) => NumKey::Int(*i as i128),
        Value::Int16(i) => NumKey::Int(*i as i128),
        Value::Int32(i) => NumKey::Int(*i as i128),
        Value::Int64(i) => NumKey::Int(*i as i128),
        Value::Int(i) => NumKey::Int(*i),
        Value::Decimal(d) => {
            if d.is_integral() {
                NumKey::Int(d.to_i128())
            } else {
                float_key(d.to_f64())
            }
        }
        Value::Float32(f) => float_key(*f as f64),
        Value::Float64(f) => float_key(*f),
        _ => return None,
    })
}

fn num_cmp(a: &Value, b: &Value) -> Ordering {
    match (num_key(a), num_key(b)) {
        (Some(NumKey::Int(x)), Some(NumKey::Int(y))) => x.cmp(&y),
        (Some(x), Some(y)) => {
            let fx = match x {
                NumKey::Int(i) => i as f64,
                NumKey::Float(bits) => f64::from_bits(bits),
            };
            let fy = match y {
                NumKey::Int(i) => i as f64,
                NumKey::Float(bits) => f64::from_bits(bits),
            };
            fx.total_cmp(&fy)
        }
        _ => unreachable!("num_cmp on non-numeric values"),
    }
}

/// Total order over all values, used by Sort and for bag canonicalization.
///
/// Within a class the order is the natural one; across classes the class rank
/// decides. Missing sorts before null, both before everything else.
pub fn total_cmp(a: &Value, b: &Value) -> Ordering {
    let (ra, rb) = (class_rank(a), class_rank(b));
    if ra != rb {
        return ra.cmp(&rb);
    }
    match (a, b) {
        (Value::Missing, Value::Missing) | (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Time(x), Value::Time(y)) => x.cmp(y),
        (Value::Timestamp(x), Value::Timestamp(y)) => x.cmp(y),
        (Value::Interval(x), Value::Interval(y)) => (x.months, x.days, x.nanos)
            .cmp(&(y.months, y.days, y.nanos)),
        (Value::Clob(x), Value::Clob(y)) => x.cmp(y),
        (Value::Blob(x), Value::Blob(y)) => x.cmp(y),
        (Value::List(x), Value::List(y)) | (Value::Sexp(x), Value::Sexp(y)) => seq_cmp(x, y),
        (Value::Bag(x), Value::Bag(y)) => {
            let mut xs: Vec<&Value> = x.iter().collect();
            let mut ys: Vec<&Value> = y.iter().collect();
            xs.sort_by(|l, r| total_cmp(l, r));
            ys.sort_by(|l, r| total_cmp(l, r));
            for (l, r) in xs.iter().zip(ys.iter()) {
                let ord = total_cmp(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        (Value::Strct(x), Value::Strct(y)) => {
            let xs = sorted_fields(x);
            let ys = sorted_fields(y);
            for ((ln, lv), (rn, rv)) in xs.iter().zip(ys.iter()) {
                let ord = ln.cmp(rn).then_with(|| total_cmp(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            xs.len().cmp(&ys.len())
        }
        _ => {
            if ra == 3 {
                num_cmp(a, b)
            } else if ra == 8 {
                // Str and Sym compare by text.
                a.as_text().unwrap().cmp(b.as_text().unwrap())
            } else {
                unreachable!("uncovered class in total_cmp")
            }
        }
    }
}

fn seq_cmp(x: &[Value], y: &[Value]) -> Ordering {
    for (l, r) in x.iter().zip(y.iter()) {
        let ord = total_cmp(l, r);
        if ord != Ordering::Equal {
            return ord;
        }
    }
    x.len().cmp(&y.len())
}

/// Fields sorted by name, stable so duplicate names keep relative order.
fn sorted_fields(fields: &[(String, Value)]) -> Vec<&(String, Value)> {
    let mut out: Vec<_> = fields.iter().collect();
    out.sort_by(|a, b| a.0.cmp(&b.0));
    out
}

/// Comparison for the comparison built-ins: `None` when the operands are not
/// comparable (different classes), letting the caller apply mode semantics.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    if class_rank(a) != class_rank(b) {
        return None;
    }
    match (a, b) {
        // NaN never compares for the operators even though it totals-orders.
        (Value::Float32(f), _) if f.is_nan() => None,
        (Value::Float64(f), _) if f.is_nan() => None,
        (_, Value::Float32(f)) if f.is_nan() => None,
        (_, Value::Float64(f)) if f.is_nan() => None,
        _ => Some(total_cmp(a, b)),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        total_cmp(self, other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        class_rank(self).hash(state);
        match self {
            Value::Null | Value::Missing => {}
            Value::Bool(b) => b.hash(state),
            Value::Int8(_)
            | Value::Int16(_)
            | Value::Int32(_)
            | Value::Int64(_)
            | Value::Int(_)
            | Value::Decimal(_)
            | Value::Float32(_)
            | Value::Float64(_) => num_key(self).hash(state),
            Value::Str(s) | Value::Sym(s) => s.hash(state),
            Value::Clob(b) | Value::Blob(b) => b.hash(state),
            Value::Date(d) => (d.year(), d.ordinal()).hash(state),
            Value::Time(t) => (t.num_seconds_from_midnight(), t.nanosecond()).hash(state),
            Value::Timestamp(ts) => ts.timestamp_nanos_opt().unwrap_or_default().hash(state),
            Value::Interval(i) => (i.months, i.days, i.nanos).hash(state),
            Value::List(v) | Value::Sexp(v) => {
                for e in v {
                    e.hash(state);
                }
            }
            Value::Bag(v) => {
                let mut sorted: Vec<&Value> = v.iter().collect();
                sorted.sort_by(|l, r| total_cmp(l, r));
                for e in sorted {
                    e.hash(state);
                }
            }
            Value::Strct(fields) => {
                for (name, value) in sorted_fields(fields) {
                    name.hash(state);
                    value.hash(state);
                }
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Missing => write!(f, "missing"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int8(i) => write!(f, "{i}"),
            Value::Int16(i) => write!(f, "{i}"),
            Value::Int32(i) => write!(f, "{i}"),
            Value::Int64(i) => write!(f, "{i}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Decimal(d) => write!(f, "{d}"),
            Value::Float32(v) => write!(f, "{v}"),
            Value::Float64(v) => write!(f, "{v}"),
            Value::Str(s) => write!(f, "'{s}'"),
            Value::Sym(s) => write!(f, "`{s}`"),
            Value::Clob(b) => write!(f, "{{{{clob {} bytes}}}}", b.len()),
            Value::Blob(b) => write!(f, "{{{{blob {} bytes}}}}", b.len()),
            Value::Date(d) => write!(f, "DATE '{d}'"),
            Value::Time(t) => write!(f, "TIME '{t}'"),
            Value::Timestamp(ts) => write!(f, "TIMESTAMP '{}'", ts.to_rfc3339()),
            Value::Interval(i) => {
                write!(f, "INTERVAL {}mo {}d {}ns", i.months, i.days, i.nanos)
            }
            Value::List(v) => write_seq(f, "[", v, "]"),
            Value::Bag(v) => write_seq(f, "<<", v, ">>"),
            Value::Sexp(v) => write_seq(f, "(", v, ")"),
            Value::Strct(fields) => {
                write!(f, "{{")?;
                for (idx, (name, value)) in fields.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "'{name}': {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

fn write_seq(f: &mut fmt::Formatter<'_>, open: &str, vals: &[Value], close: &str) -> fmt::Result {
    write!(f, "{open}")?;
    for (idx, v) in vals.iter().enumerate() {
        if idx > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{v}")?;
    }
    write!(f, "{close}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strct(fields: &[(&str, Value)]) -> Value {
        Value::Strct(
            fields
                .iter()
                .map(|(n, v)| (n.to_string(), v.clone()))
                .collect(),
        )
    }

    #[test]
    fn numeric_equality_across_widths() {
        assert_eq!(Value::Int32(1), Value::Int64(1));
        assert_eq!(Value::Int64(2), Value::Float64(2.0));
        assert_eq!(
            Value::Decimal(Decimal::new(15, 1)),
            Value::Float64(1.5)
        );
        assert_ne!(Value::Int64(2), Value::Float64(2.5));
    }

    #[test]
    fn struct_equality_ignores_field_order() {
        let a = strct(&[("a", Value::Int64(1)), ("b", Value::Int64(2))]);
        let b = strct(&[("b", Value::Int64(2)), ("a", Value::Int64(1))]);
        assert_eq!(a, b);

        use std::collections::hash_map::DefaultHasher;
        let mut h1 = DefaultHasher::new();
        let mut h2 = DefaultHasher::new();
        a.hash(&mut h1);
        b.hash(&mut h2);
        assert_eq!(h1.finish(), h2.finish());
    }

    #[test]
    fn bag_equality_is_multiset() {
        let a = Value::Bag(vec![Value::Int64(1), Value::Int64(2), Value::Int64(1)]);
        let b = Value::Bag(vec![Value::Int64(2), Value::Int64(1), Value::Int64(1)]);
        let c = Value::Bag(vec![Value::Int64(1), Value::Int64(2)]);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn list_equality_is_positional() {
        let a = Value::List(vec![Value::Int64(1), Value::Int64(2)]);
        let b = Value::List(vec![Value::Int64(2), Value::Int64(1)]);
        assert_ne!(a, b);
    }

    #[test]
    fn compare_rejects_cross_class() {
        assert!(compare(&Value::Int64(1), &Value::Str("a".into())).is_none());
        assert_eq!(
            Some(Ordering::Less),
            compare(&Value::Int64(1), &Value::Float64(1.5))
        );
    }

    #[test]
    fn missing_sorts_before_null_before_values() {
        let mut vals = vec![Value::Int64(0), Value::Null, Value::Missing];
        vals.sort_by(total_cmp);
        assert_eq!(vec![Value::Missing, Value::Null, Value::Int64(0)], vals);
    }
}
