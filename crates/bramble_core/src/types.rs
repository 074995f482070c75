//! The static type lattice.
//!
//! [`StaticType`] is the full, possibly-parameterized compile-time type;
//! [`TypeId`] is the flat discriminant function signatures are written
//! against. Static types are advisory in a schemaless model: `Dynamic` is the
//! top type and is what inference falls back to when it cannot narrow.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ident::Symbol;

/// Flat type discriminant used by function signatures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeId {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    /// Arbitrary-precision integer.
    Int,
    Decimal,
    Float32,
    Float64,
    Char,
    Str,
    Sym,
    Clob,
    Blob,
    Date,
    Time,
    Timestamp,
    Interval,
    List,
    Bag,
    Sexp,
    Strct,
    Null,
    Missing,
    /// The top type; also the id `AnyOf` unions collapse to.
    Dynamic,
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Bool => "BOOL",
            Self::Int8 => "INT8",
            Self::Int16 => "INT16",
            Self::Int32 => "INT32",
            Self::Int64 => "INT64",
            Self::Int => "INT",
            Self::Decimal => "DECIMAL",
            Self::Float32 => "FLOAT32",
            Self::Float64 => "FLOAT64",
            Self::Char => "CHAR",
            Self::Str => "STRING",
            Self::Sym => "SYMBOL",
            Self::Clob => "CLOB",
            Self::Blob => "BLOB",
            Self::Date => "DATE",
            Self::Time => "TIME",
            Self::Timestamp => "TIMESTAMP",
            Self::Interval => "INTERVAL",
            Self::List => "LIST",
            Self::Bag => "BAG",
            Self::Sexp => "SEXP",
            Self::Strct => "STRUCT",
            Self::Null => "NULL",
            Self::Missing => "MISSING",
            Self::Dynamic => "ANY",
        };
        write!(f, "{s}")
    }
}

/// A named, typed struct field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StructField {
    pub name: Symbol,
    pub ty: StaticType,
}

/// Compile-time type of an expression.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaticType {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Int,
    /// Arbitrary-precision decimal.
    Decimal,
    /// Fixed precision/scale decimal.
    DecimalP { precision: u8, scale: i8 },
    Float32,
    Float64,
    Char,
    Str,
    Sym,
    Clob,
    Blob,
    Date,
    Time,
    Timestamp,
    Interval,
    List(Option<Box<StaticType>>),
    Bag(Option<Box<StaticType>>),
    Sexp(Option<Box<StaticType>>),
    Strct(Option<Vec<StructField>>),
    Null,
    Missing,
    /// One of several alternatives, e.g. the branches of a CASE.
    AnyOf(Vec<StaticType>),
    /// The top type.
    Dynamic,
}

impl StaticType {
    pub fn type_id(&self) -> TypeId {
        match self {
            Self::Bool => TypeId::Bool,
            Self::Int8 => TypeId::Int8,
            Self::Int16 => TypeId::Int16,
            Self::Int32 => TypeId::Int32,
            Self::Int64 => TypeId::Int64,
            Self::Int => TypeId::Int,
            Self::Decimal | Self::DecimalP { .. } => TypeId::Decimal,
            Self::Float32 => TypeId::Float32,
            Self::Float64 => TypeId::Float64,
            Self::Char => TypeId::Char,
            Self::Str => TypeId::Str,
            Self::Sym => TypeId::Sym,
            Self::Clob => TypeId::Clob,
            Self::Blob => TypeId::Blob,
            Self::Date => TypeId::Date,
            Self::Time => TypeId::Time,
            Self::Timestamp => TypeId::Timestamp,
            Self::Interval => TypeId::Interval,
            Self::List(_) => TypeId::List,
            Self::Bag(_) => TypeId::Bag,
            Self::Sexp(_) => TypeId::Sexp,
            Self::Strct(_) => TypeId::Strct,
            Self::Null => TypeId::Null,
            Self::Missing => TypeId::Missing,
            // A union is not statically narrowed; signatures see it as
            // runtime-unknown.
            Self::AnyOf(_) => TypeId::Dynamic,
            Self::Dynamic => TypeId::Dynamic,
        }
    }

    /// The default static type for a flat signature id.
    pub fn from_type_id(id: TypeId) -> StaticType {
        match id {
            TypeId::Bool => Self::Bool,
            TypeId::Int8 => Self::Int8,
            TypeId::Int16 => Self::Int16,
            TypeId::Int32 => Self::Int32,
            TypeId::Int64 => Self::Int64,
            TypeId::Int => Self::Int,
            TypeId::Decimal => Self::Decimal,
            TypeId::Float32 => Self::Float32,
            TypeId::Float64 => Self::Float64,
            TypeId::Char => Self::Char,
            TypeId::Str => Self::Str,
            TypeId::Sym => Self::Sym,
            TypeId::Clob => Self::Clob,
            TypeId::Blob => Self::Blob,
            TypeId::Date => Self::Date,
            TypeId::Time => Self::Time,
            TypeId::Timestamp => Self::Timestamp,
            TypeId::Interval => Self::Interval,
            TypeId::List => Self::List(None),
            TypeId::Bag => Self::Bag(None),
            TypeId::Sexp => Self::Sexp(None),
            TypeId::Strct => Self::Strct(None),
            TypeId::Null => Self::Null,
            TypeId::Missing => Self::Missing,
            TypeId::Dynamic => Self::Dynamic,
        }
    }

    /// True for `Dynamic` and unions: the runtime type is not pinned down.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic | Self::AnyOf(_))
    }

    pub fn is_collection(&self) -> bool {
        matches!(self, Self::List(_) | Self::Bag(_) | Self::Sexp(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self, Self::Strct(_))
    }

    /// Declared element type of a collection, if known.
    pub fn element(&self) -> Option<&StaticType> {
        match self {
            Self::List(e) | Self::Bag(e) | Self::Sexp(e) => e.as_deref(),
            _ => None,
        }
    }

    /// The join of a set of types: flattens nested unions, de-duplicates, and
    /// collapses singletons. `Dynamic` absorbs everything.
    pub fn union_of<I>(types: I) -> StaticType
    where
        I: IntoIterator<Item = StaticType>,
    {
        let mut alts: Vec<StaticType> = Vec::new();
        for ty in types {
            match ty {
                StaticType::Dynamic => return StaticType::Dynamic,
                StaticType::AnyOf(inner) => {
                    for t in inner {
                        if t == StaticType::Dynamic {
                            return StaticType::Dynamic;
                        }
                        if !alts.contains(&t) {
                            alts.push(t);
                        }
                    }
                }
                other => {
                    if !alts.contains(&other) {
                        alts.push(other);
                    }
                }
            }
        }
        match alts.len() {
            0 => StaticType::Dynamic,
            1 => alts.pop().unwrap(),
            _ => StaticType::AnyOf(alts),
        }
    }
}

impl fmt::Display for StaticType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StaticType::AnyOf(alts) => {
                write!(f, "ANYOF(")?;
                for (idx, alt) in alts.iter().enumerate() {
                    if idx > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{alt}")?;
                }
                write!(f, ")")
            }
            other => write!(f, "{}", other.type_id()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn union_collapses_singletons() {
        assert_eq!(
            StaticType::Int64,
            StaticType::union_of([StaticType::Int64, StaticType::Int64])
        );
    }

    #[test]
    fn union_flattens_nested() {
        let t = StaticType::union_of([
            StaticType::AnyOf(vec![StaticType::Int64, StaticType::Str]),
            StaticType::Bool,
        ]);
        assert_eq!(
            StaticType::AnyOf(vec![StaticType::Int64, StaticType::Str, StaticType::Bool]),
            t
        );
    }

    #[test]
    fn union_dynamic_absorbs() {
        assert_eq!(
            StaticType::Dynamic,
            StaticType::union_of([StaticType::Int64, StaticType::Dynamic])
        );
    }

    #[test]
    fn anyof_is_dynamic_to_signatures() {
        let t = StaticType::AnyOf(vec![StaticType::Int64, StaticType::Str]);
        assert_eq!(TypeId::Dynamic, t.type_id());
        assert!(t.is_dynamic());
    }
}
