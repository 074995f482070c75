use bramble_error::Result;

use super::invalid_argument;
use crate::eval::EvalMode;
use crate::functions::Signature;
use crate::functions::documentation::{Category, Documentation, Example};
use crate::functions::function_set::ScalarFunctionSet;
use crate::functions::scalar::{RawScalarFunction, ScalarFunction};
use crate::types::TypeId;
use crate::values::Value;

pub const FUNCTION_SET_CHAR_LENGTH: ScalarFunctionSet = ScalarFunctionSet {
    name: "char_length",
    aliases: &["character_length"],
    doc: &[&Documentation {
        category: Category::String,
        description: "Number of characters (not bytes) in a string.",
        arguments: &["string"],
        example: Some(Example {
            example: "char_length('tweet')",
            output: "5",
        }),
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new(&[TypeId::Str], TypeId::Int64),
        &CharLength,
    )],
};

pub const FUNCTION_SET_BYTE_LENGTH: ScalarFunctionSet = ScalarFunctionSet {
    name: "byte_length",
    aliases: &["octet_length"],
    doc: &[&Documentation {
        category: Category::String,
        description: "Number of bytes in a string's UTF-8 encoding.",
        arguments: &["string"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new(&[TypeId::Str], TypeId::Int64),
        &ByteLength,
    )],
};

pub const FUNCTION_SET_LOWER: ScalarFunctionSet = ScalarFunctionSet {
    name: "lower",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::String,
        description: "Convert a string to lowercase.",
        arguments: &["string"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new(&[TypeId::Str], TypeId::Str),
        &Lower,
    )],
};

pub const FUNCTION_SET_UPPER: ScalarFunctionSet = ScalarFunctionSet {
    name: "upper",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::String,
        description: "Convert a string to uppercase.",
        arguments: &["string"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new(&[TypeId::Str], TypeId::Str),
        &Upper,
    )],
};

pub const FUNCTION_SET_TRIM: ScalarFunctionSet = ScalarFunctionSet {
    name: "trim",
    aliases: &[],
    doc: &[&Documentation {
        category: Category::String,
        description: "Remove leading and trailing whitespace.",
        arguments: &["string"],
        example: None,
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new(&[TypeId::Str], TypeId::Str),
        &Trim,
    )],
};

pub const FUNCTION_SET_CONCAT: ScalarFunctionSet = ScalarFunctionSet {
    name: "concat",
    aliases: &["||"],
    doc: &[&Documentation {
        category: Category::String,
        description: "Concatenate strings.",
        arguments: &["strings"],
        example: Some(Example {
            example: "concat('a', 'b', 'c')",
            output: "abc",
        }),
    }],
    functions: &[RawScalarFunction::new(
        &Signature::new_variadic(&[TypeId::Str, TypeId::Str], TypeId::Str, TypeId::Str),
        &Concat,
    )],
};

fn text_arg<'a>(func: &'static str, args: &'a [Value], idx: usize) -> Result<&'a str> {
    args[idx]
        .as_text()
        .ok_or_else(|| invalid_argument(func, idx, "text", &args[idx]))
}

#[derive(Debug, Clone, Copy)]
pub struct CharLength;

impl ScalarFunction for CharLength {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        let s = text_arg("char_length", args, 0)?;
        Ok(Value::Int64(s.chars().count() as i64))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ByteLength;

impl ScalarFunction for ByteLength {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        let s = text_arg("byte_length", args, 0)?;
        Ok(Value::Int64(s.len() as i64))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Lower;

impl ScalarFunction for Lower {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        let s = text_arg("lower", args, 0)?;
        Ok(Value::Str(s.to_lowercase()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Upper;

impl ScalarFunction for Upper {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        let s = text_arg("upper", args, 0)?;
        Ok(Value::Str(s.to_uppercase()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Trim;

impl ScalarFunction for Trim {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        let s = text_arg("trim", args, 0)?;
        Ok(Value::Str(s.trim().to_string()))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Concat;

impl ScalarFunction for Concat {
    fn invoke(&self, args: &[Value], _mode: EvalMode) -> Result<Value> {
        let mut out = String::new();
        for idx in 0..args.len() {
            out.push_str(text_arg("concat", args, idx)?);
        }
        Ok(Value::Str(out))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_length_empty_string() {
        let out = CharLength
            .invoke(&[Value::Str(String::new())], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Int64(0), out);
    }

    #[test]
    fn char_length_counts_chars_not_bytes() {
        let out = CharLength
            .invoke(&[Value::Str("héllo".into())], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Int64(5), out);

        let out = ByteLength
            .invoke(&[Value::Str("héllo".into())], EvalMode::Strict)
            .unwrap();
        assert_eq!(Value::Int64(6), out);
    }

    #[test]
    fn concat_variadic() {
        let args = [
            Value::Str("a".into()),
            Value::Str("b".into()),
            Value::Str("c".into()),
        ];
        let out = Concat.invoke(&args, EvalMode::Strict).unwrap();
        assert_eq!(Value::Str("abc".into()), out);
    }

    #[test]
    fn non_text_is_typed_error() {
        let err = Lower
            .invoke(&[Value::Int64(1)], EvalMode::Strict)
            .unwrap_err();
        assert!(err.to_string().contains("lower"));
    }
}
