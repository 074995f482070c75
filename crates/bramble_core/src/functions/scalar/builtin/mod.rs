pub mod boolean;
pub mod collection;
pub mod comparison;
pub mod datetime;
pub mod dynamic_lookup;
pub mod nullability;
pub mod numeric;
pub mod string;

use bramble_error::BrambleError;

use crate::functions::function_set::ScalarFunctionSet;
use crate::values::Value;

/// Every built-in scalar function set; the catalog registers these.
pub const ALL_SCALAR_FUNCTION_SETS: &[&ScalarFunctionSet] = &[
    // String
    &string::FUNCTION_SET_CHAR_LENGTH,
    &string::FUNCTION_SET_BYTE_LENGTH,
    &string::FUNCTION_SET_LOWER,
    &string::FUNCTION_SET_UPPER,
    &string::FUNCTION_SET_TRIM,
    &string::FUNCTION_SET_CONCAT,
    // Numeric operators
    &numeric::FUNCTION_SET_ADD,
    &numeric::FUNCTION_SET_SUB,
    &numeric::FUNCTION_SET_MUL,
    &numeric::FUNCTION_SET_DIV,
    &numeric::FUNCTION_SET_MOD,
    &numeric::FUNCTION_SET_NEGATE,
    // Comparison operators
    &comparison::FUNCTION_SET_EQ,
    &comparison::FUNCTION_SET_NEQ,
    &comparison::FUNCTION_SET_LT,
    &comparison::FUNCTION_SET_LT_EQ,
    &comparison::FUNCTION_SET_GT,
    &comparison::FUNCTION_SET_GT_EQ,
    &comparison::FUNCTION_SET_BETWEEN,
    // Logical operators
    &boolean::FUNCTION_SET_AND,
    &boolean::FUNCTION_SET_OR,
    &boolean::FUNCTION_SET_NOT,
    // Null handling
    &nullability::FUNCTION_SET_COALESCE,
    &nullability::FUNCTION_SET_NULLIF,
    &nullability::FUNCTION_SET_EXISTS,
    &nullability::FUNCTION_SET_IS_NULL,
    &nullability::FUNCTION_SET_IS_MISSING,
    // Datetime
    &datetime::FUNCTION_SET_DATE_DIFF,
    &datetime::FUNCTION_SET_DATE_ADD,
    &datetime::FUNCTION_SET_EXTRACT,
    // Collections
    &collection::FUNCTION_SET_COLL_COUNT,
    &collection::FUNCTION_SET_COLL_SUM,
    &collection::FUNCTION_SET_COLL_AVG,
    &collection::FUNCTION_SET_COLL_MIN,
    &collection::FUNCTION_SET_COLL_MAX,
    // System
    &dynamic_lookup::FUNCTION_SET_DYNAMIC_LOOKUP,
];

/// Typed error for a value a function cannot handle.
pub(crate) fn invalid_argument(
    func: &'static str,
    position: usize,
    expected: &str,
    actual: &Value,
) -> BrambleError {
    BrambleError::new(format!("Invalid argument for '{func}'"))
        .with_field("argument_position", position)
        .with_field("expected", expected.to_string())
        .with_field("actual", actual.type_id())
}
