use crate::types::TypeId;

/// Score that should be used if no cast is needed.
pub const NO_CAST_SCORE: u32 = 800;

/// Score for matching a parameter declared as the top type.
///
/// Lower than any concrete match so concrete overloads win when both apply.
pub const DYNAMIC_PARAM_SCORE: u32 = 100;

/// Score for an argument whose static type is unknown until runtime.
///
/// Such an argument is plausible for any parameter; the actual check happens
/// during dynamic dispatch.
pub const UNKNOWN_ARG_SCORE: u32 = 150;

/// Score for normalizing char/symbol text to string.
const TEXT_NORMALIZE_SCORE: u32 = 201;

/// Return the score for implicitly casting from `have` to `want`.
///
/// Returns None if there's no valid implicit cast. A higher score indicates a
/// more preferred cast. Only lossless widening, text normalization, and casts
/// out of null/missing are allowed here; everything else requires an explicit
/// cast.
pub const fn implicit_cast_score(have: TypeId, want: TypeId) -> Option<u32> {
    match have {
        // Null and missing cast to anything.
        TypeId::Null | TypeId::Missing => Some(target_score(want)),

        TypeId::Int8 => int8_cast_score(want),
        TypeId::Int16 => int16_cast_score(want),
        TypeId::Int32 => int32_cast_score(want),
        TypeId::Int64 => int64_cast_score(want),
        TypeId::Int => int_cast_score(want),
        TypeId::Decimal => decimal_cast_score(want),
        TypeId::Float32 => float32_cast_score(want),

        // Text normalization for functions declared over strings.
        TypeId::Char | TypeId::Sym => match want {
            TypeId::Str => Some(TEXT_NORMALIZE_SCORE),
            _ => None,
        },

        _ => None,
    }
}

/// Determine the score for the target type we can cast to.
///
/// More "specific" types score higher.
const fn target_score(target: TypeId) -> u32 {
    match target {
        TypeId::Int8 => 191,
        TypeId::Int16 => 181,
        TypeId::Int32 => 171,
        TypeId::Int64 => 161,
        TypeId::Int => 151,
        TypeId::Decimal => 141,
        TypeId::Float32 => 131,
        TypeId::Float64 => 121,
        TypeId::Str => 1,
        _ => 100,
    }
}

const fn int8_cast_score(want: TypeId) -> Option<u32> {
    Some(match want {
        TypeId::Int8
        | TypeId::Int16
        | TypeId::Int32
        | TypeId::Int64
        | TypeId::Int
        | TypeId::Decimal
        | TypeId::Float32
        | TypeId::Float64 => target_score(want),
        _ => return None,
    })
}

const fn int16_cast_score(want: TypeId) -> Option<u32> {
    Some(match want {
        TypeId::Int16
        | TypeId::Int32
        | TypeId::Int64
        | TypeId::Int
        | TypeId::Decimal
        | TypeId::Float32
        | TypeId::Float64 => target_score(want),
        _ => return None,
    })
}

const fn int32_cast_score(want: TypeId) -> Option<u32> {
    Some(match want {
        TypeId::Int32
        | TypeId::Int64
        | TypeId::Int
        | TypeId::Decimal
        | TypeId::Float64 => target_score(want),
        _ => return None,
    })
}

const fn int64_cast_score(want: TypeId) -> Option<u32> {
    Some(match want {
        TypeId::Int64 | TypeId::Int | TypeId::Decimal | TypeId::Float64 => target_score(want),
        _ => return None,
    })
}

const fn int_cast_score(want: TypeId) -> Option<u32> {
    Some(match want {
        TypeId::Int | TypeId::Decimal | TypeId::Float64 => target_score(want),
        _ => return None,
    })
}

const fn decimal_cast_score(want: TypeId) -> Option<u32> {
    Some(match want {
        TypeId::Decimal | TypeId::Float64 => target_score(want),
        _ => return None,
    })
}

const fn float32_cast_score(want: TypeId) -> Option<u32> {
    Some(match want {
        TypeId::Float32 | TypeId::Float64 => target_score(want),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_widening() {
        assert!(implicit_cast_score(TypeId::Int16, TypeId::Int64).is_some());
        assert!(implicit_cast_score(TypeId::Int16, TypeId::Float32).is_some());

        // Narrowing is never implicit.
        assert!(implicit_cast_score(TypeId::Int64, TypeId::Int32).is_none());
        // Large integers lose precision in f32.
        assert!(implicit_cast_score(TypeId::Int64, TypeId::Float32).is_none());
    }

    #[test]
    fn float_never_narrows_to_integer() {
        assert!(implicit_cast_score(TypeId::Float64, TypeId::Int64).is_none());
        assert!(implicit_cast_score(TypeId::Float32, TypeId::Float64).is_some());
    }

    #[test]
    fn prefer_cast_int32_to_int64_over_float64() {
        let to_int64 = implicit_cast_score(TypeId::Int32, TypeId::Int64).unwrap();
        let to_float64 = implicit_cast_score(TypeId::Int32, TypeId::Float64).unwrap();
        assert!(to_int64 > to_float64);
    }

    #[test]
    fn text_normalization() {
        assert!(implicit_cast_score(TypeId::Sym, TypeId::Str).is_some());
        assert!(implicit_cast_score(TypeId::Char, TypeId::Str).is_some());
        assert!(implicit_cast_score(TypeId::Str, TypeId::Sym).is_none());
    }

    #[test]
    fn null_and_missing_cast_anywhere() {
        assert!(implicit_cast_score(TypeId::Null, TypeId::Timestamp).is_some());
        assert!(implicit_cast_score(TypeId::Missing, TypeId::Bool).is_some());
    }
}
