//! Temporal functions: field difference, field addition, field extraction.
//!
//! Field extraction is validated per source type; asking a DATE for its
//! timezone is a typed invalid-argument error, never a panic.

use bramble_error::{BrambleError, Result};
use chrono::{DateTime, Datelike, Days, FixedOffset, Months, NaiveDate, Offset, Timelike};

use super::invalid_argument;
use crate::eval::EvalMode;
use crate::functions::Signature;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::function_set::ScalarFunctionSet;
use crate::functions::scalar::{RawScalarFunction, ScalarFunction};
use crate::types::TypeId;
use crate::values::Value;

pub const FUNCTION_SET_DATE_DIFF: ScalarFunctionSet = ScalarFunctionSet {
    name: "date_diff",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::DateTime,
        description:
            "Difference between two datetime values in the given field, second minus first.",
        arguments: &["field", "from", "to"],
        example: Some(Example {
            example: "date_diff(`day`, DATE '2017-01-01', DATE '2017-01-02')",
            output: "1",
        }),
    }],
    functions: &[
        RawScalarFunction::new(
            &Signature::new(&[TypeId::Sym, TypeId::Date, TypeId::Date], TypeId::Int64),
            &DateDiff,
        ),
        RawScalarFunction::new(
            &Signature::new(
                &[TypeId::Sym, TypeId::Timestamp, TypeId::Timestamp],
                TypeId::Int64,
            ),
            &DateDiff,
        ),
        RawScalarFunction::new(
            &Signature::new(
                &[TypeId::Sym, TypeId::Dynamic, TypeId::Dynamic],
                TypeId::Int64,
            ),
            &DateDiff,
        ),
    ],
};

pub const FUNCTION_SET_DATE_ADD: ScalarFunctionSet = ScalarFunctionSet {
    name: "date_add",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::DateTime,
        description: "Add a quantity of the given field to a datetime value.",
        arguments: &["field", "quantity", "datetime"],
        example: None,
    }],
    functions: &[
        RawScalarFunction::new(
            &Signature::new(&[TypeId::Sym, TypeId::Int64, TypeId::Date], TypeId::Date),
            &DateAdd,
        ),
        RawScalarFunction::new(
            &Signature::new(
                &[TypeId::Sym, TypeId::Int64, TypeId::Timestamp],
                TypeId::Timestamp,
            ),
            &DateAdd,
        ),
        RawScalarFunction::new(
            &Signature::new(
                &[TypeId::Sym, TypeId::Int64, TypeId::Dynamic],
                TypeId::Dynamic,
            ),
            &DateAdd,
        ),
    ],
};

pub const FUNCTION_SET_EXTRACT: ScalarFunctionSet = ScalarFunctionSet {
    name: "extract",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::DateTime,
        description: "Extract a field from a datetime value.",
        arguments: &["field", "datetime"],
        example: Some(Example {
            example: "extract(`year`, DATE '2017-01-01')",
            output: "2017",
        }),
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new(&[TypeId::Sym, TypeId::Dynamic], TypeId::Int64),
        &Extract,
    )],
};

/// Fields addressable by the temporal functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateTimeField {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    TimezoneHour,
    TimezoneMinute,
}

impl DateTimeField {
    fn parse(func: &'static str, value: &Value) -> Result<Self> {
        let text = value
            .as_text()
            .ok_or_else(|| invalid_argument(func, 0, "datetime field symbol", value))?;
        Ok(match text.to_ascii_lowercase().as_str() {
            "year" => Self::Year,
            "month" => Self::Month,
            "day" => Self::Day,
            "hour" => Self::Hour,
            "minute" => Self::Minute,
            "second" => Self::Second,
            "timezone_hour" => Self::TimezoneHour,
            "timezone_minute" => Self::TimezoneMinute,
            _ => {
                return Err(BrambleError::new("Unknown datetime field")
                    .with_field("function", func)
                    .with_field("field", text.to_string()));
            }
        })
    }
}

fn field_error(func: &'static str, field: DateTimeField, value: &Value) -> BrambleError {
    BrambleError::new("Field not valid for this datetime type")
        .with_field("function", func)
        .with_field("field", format!("{field:?}"))
        .with_field("actual", value.type_id())
}

fn months_between(a: NaiveDate, b: NaiveDate) -> i64 {
    (b.year() as i64 - a.year() as i64) * 12 + (b.month() as i64 - a.month() as i64)
}

#[derive(Debug, Clone, Copy)]
pub struct DateDiff;

impl ScalarFunction for DateDiff {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        let field = DateTimeField::parse("date_diff", &args[0])?;

        let diff = match (&args[1], &args[2]) {
            (Value::Date(a), Value::Date(b)) => match field {
                DateTimeField::Year => months_between(*a, *b) / 12,
                DateTimeField::Month => months_between(*a, *b),
                DateTimeField::Day => (*b - *a).num_days(),
                _ => return Err(field_error("date_diff", field, &args[1])),
            },
            (Value::Timestamp(a), Value::Timestamp(b)) => {
                let delta = *b - *a;
                match field {
                    DateTimeField::Year => months_between(a.date_naive(), b.date_naive()) / 12,
                    DateTimeField::Month => months_between(a.date_naive(), b.date_naive()),
                    DateTimeField::Day => delta.num_days(),
                    DateTimeField::Hour => delta.num_hours(),
                    DateTimeField::Minute => delta.num_minutes(),
                    DateTimeField::Second => delta.num_seconds(),
                    _ => return Err(field_error("date_diff", field, &args[1])),
                }
            }
            (Value::Date(_), other) | (other, _) => {
                return Err(invalid_argument(
                    "date_diff",
                    if matches!(args[1], Value::Date(_)) { 2 } else { 1 },
                    "matching datetime values",
                    other,
                ));
            }
        };

        Ok(Value::Int64(diff))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DateAdd;

impl ScalarFunction for DateAdd {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        let field = DateTimeField::parse("date_add", &args[0])?;
        let quantity = match &args[1] {
            Value::Int64(n) => *n,
            other => return Err(invalid_argument("date_add", 1, "integer quantity", other)),
        };

        let out_of_range =
            || BrambleError::new("Datetime out of range").with_field("function", "date_add");

        match &args[2] {
            Value::Date(d) => {
                let out = match field {
                    DateTimeField::Year => shift_months(*d, quantity * 12),
                    DateTimeField::Month => shift_months(*d, quantity),
                    DateTimeField::Day => shift_days(*d, quantity),
                    _ => return Err(field_error("date_add", field, &args[2])),
                };
                Ok(Value::Date(out.ok_or_else(out_of_range)?))
            }
            Value::Timestamp(ts) => {
                let out: Option<DateTime<FixedOffset>> = match field {
                    DateTimeField::Year => shift_ts_months(*ts, quantity * 12),
                    DateTimeField::Month => shift_ts_months(*ts, quantity),
                    DateTimeField::Day => ts.checked_add_signed(chrono::Duration::days(quantity)),
                    DateTimeField::Hour => ts.checked_add_signed(chrono::Duration::hours(quantity)),
                    DateTimeField::Minute => {
                        ts.checked_add_signed(chrono::Duration::minutes(quantity))
                    }
                    DateTimeField::Second => {
                        ts.checked_add_signed(chrono::Duration::seconds(quantity))
                    }
                    _ => return Err(field_error("date_add", field, &args[2])),
                };
                Ok(Value::Timestamp(out.ok_or_else(out_of_range)?))
            }
            other => Err(invalid_argument("date_add", 2, "datetime", other)),
        }
    }
}

fn shift_months(d: NaiveDate, months: i64) -> Option<NaiveDate> {
    let n = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        d.checked_add_months(n)
    } else {
        d.checked_sub_months(n)
    }
}

fn shift_days(d: NaiveDate, days: i64) -> Option<NaiveDate> {
    let n = Days::new(days.unsigned_abs());
    if days >= 0 {
        d.checked_add_days(n)
    } else {
        d.checked_sub_days(n)
    }
}

fn shift_ts_months(
    ts: DateTime<FixedOffset>,
    months: i64,
) -> Option<DateTime<FixedOffset>> {
    let n = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        ts.checked_add_months(n)
    } else {
        ts.checked_sub_months(n)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Extract;

impl ScalarFunction for Extract {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        let field = DateTimeField::parse("extract", &args[0])?;

        let out = match &args[1] {
            Value::Date(d) => match field {
                DateTimeField::Year => d.year() as i64,
                DateTimeField::Month => d.month() as i64,
                DateTimeField::Day => d.day() as i64,
                _ => return Err(field_error("extract", field, &args[1])),
            },
            Value::Time(t) => match field {
                DateTimeField::Hour => t.hour() as i64,
                DateTimeField::Minute => t.minute() as i64,
                DateTimeField::Second => t.second() as i64,
                _ => return Err(field_error("extract", field, &args[1])),
            },
            Value::Timestamp(ts) => match field {
                DateTimeField::Year => ts.year() as i64,
                DateTimeField::Month => ts.month() as i64,
                DateTimeField::Day => ts.day() as i64,
                DateTimeField::Hour => ts.hour() as i64,
                DateTimeField::Minute => ts.minute() as i64,
                DateTimeField::Second => ts.second() as i64,
                DateTimeField::TimezoneHour => {
                    (ts.offset().fix().local_minus_utc() / 3600) as i64
                }
                DateTimeField::TimezoneMinute => {
                    (ts.offset().fix().local_minus_utc() % 3600 / 60) as i64
                }
            },
            other => return Err(invalid_argument("extract", 1, "datetime", other)),
        };

        Ok(Value::Int64(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Value {
        Value::Date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    fn field(name: &str) -> Value {
        Value::Sym(name.to_string())
    }

    #[test]
    fn date_diff_day_sign_follows_direction() {
        let out = DateDiff
            .invoke(
                &[field("day"), date(2017, 1, 1), date(2017, 1, 2)],
                EvalMode::Strict,
            )
            .unwrap();
        assert_eq!(Value::Int64(1), out);

        let out = DateDiff
            .invoke(
                &[field("day"), date(2017, 1, 2), date(2017, 1, 1)],
                EvalMode::Strict,
            )
            .unwrap();
        assert_eq!(Value::Int64(-1), out);
    }

    #[test]
    fn date_diff_month_crosses_year() {
        let out = DateDiff
            .invoke(
                &[field("month"), date(2016, 11, 15), date(2017, 2, 1)],
                EvalMode::Strict,
            )
            .unwrap();
        assert_eq!(Value::Int64(3), out);
    }

    #[test]
    fn hour_field_invalid_for_date() {
        let err = DateDiff
            .invoke(
                &[field("hour"), date(2017, 1, 1), date(2017, 1, 2)],
                EvalMode::Strict,
            )
            .unwrap_err();
        assert!(err.to_string().contains("Field not valid"));
    }

    #[test]
    fn timezone_hour_invalid_for_date() {
        let err = Extract
            .invoke(&[field("timezone_hour"), date(2017, 1, 1)], EvalMode::Strict)
            .unwrap_err();
        assert!(err.to_string().contains("Field not valid"));
    }

    #[test]
    fn extract_year_from_date() {
        let out = Extract
            .invoke(&[field("year"), date(2017, 6, 30)], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Int64(2017), out);
    }

    #[test]
    fn date_add_days() {
        let out = DateAdd
            .invoke(
                &[field("day"), Value::Int64(31), date(2016, 12, 31)],
                EvalMode::Strict,
            )
            .unwrap();
        assert_eq!(date(2017, 1, 31), out);
    }
}
