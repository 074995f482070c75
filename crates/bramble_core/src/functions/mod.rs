// Allow `new` constructors for functions without an associated Default
// implementation. Function structs are only ever created in a const context.
#![allow(clippy::new_without_default)]

pub mod aggregate;
pub mod candidate;
pub mod documentation;
pub mod function_set;
pub mod implicit;
pub mod registry;
pub mod scalar;

use crate::types::{StaticType, TypeId};

/// Function signature.
#[derive(Debug, Clone, Copy)]
pub struct Signature {
    /// Expected positional input argument types for this signature.
    pub positional_args: &'static [TypeId],

    /// Type of the variadic args if this function is variadic.
    ///
    /// If None, the function is not considered variadic.
    ///
    /// If the variadic type is `TypeId::Dynamic` and the caller provides one
    /// or more variadic arguments, the signature is never an exact match; a
    /// candidate search runs instead so all variadic args get a single common
    /// type.
    pub variadic_arg: Option<TypeId>,

    /// The expected return type.
    ///
    /// Informational; the concrete type is determined when the function is
    /// planned.
    pub return_type: TypeId,
}

impl Signature {
    pub const fn new(inputs: &'static [TypeId], return_type: TypeId) -> Self {
        Signature {
            positional_args: inputs,
            variadic_arg: None,
            return_type,
        }
    }

    pub const fn new_variadic(
        inputs: &'static [TypeId],
        variadic: TypeId,
        return_type: TypeId,
    ) -> Self {
        Signature {
            positional_args: inputs,
            variadic_arg: Some(variadic),
            return_type,
        }
    }

    /// Check if this signature is a variadic signature.
    pub const fn is_variadic(&self) -> bool {
        self.variadic_arg.is_some()
    }

    /// Number of arguments this signature accepts for the given call arity,
    /// None if the arity is out of range.
    pub fn accepts_arity(&self, argc: usize) -> bool {
        if self.is_variadic() {
            argc >= self.positional_args.len()
        } else {
            argc == self.positional_args.len()
        }
    }

    /// Return if the given input types exactly satisfy the signature.
    pub(crate) fn exact_match(&self, inputs: &[StaticType]) -> bool {
        if !self.accepts_arity(inputs.len()) {
            return false;
        }

        for (&expected, have) in self.positional_args.iter().zip(inputs.iter()) {
            if expected == TypeId::Dynamic {
                // Matching against the top type is never exact; a candidate
                // search keeps the concrete overloads in play.
                return false;
            }
            if have.type_id() != expected {
                return false;
            }
        }

        if let Some(expected) = self.variadic_arg {
            let remaining = &inputs[self.positional_args.len()..];
            for have in remaining {
                if expected == TypeId::Dynamic {
                    // Matching against the top type is never exact.
                    return false;
                }
                if have.type_id() != expected {
                    return false;
                }
            }
        }

        true
    }
}

impl std::fmt::Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (idx, arg) in self.positional_args.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{arg}")?;
        }
        if let Some(variadic) = self.variadic_arg {
            if !self.positional_args.is_empty() {
                write!(f, ", ")?;
            }
            write!(f, "{variadic}...")?;
        }
        write!(f, ") -> {}", self.return_type)
    }
}

impl PartialEq for Signature {
    fn eq(&self, other: &Self) -> bool {
        self.positional_args == other.positional_args
            && self.variadic_arg == other.variadic_arg
            && self.return_type == other.return_type
    }
}

impl Eq for Signature {}

#[cfg(test)]
mod tests {
    use super::*;

    const CONCRETE: Signature = Signature::new(&[TypeId::Int64, TypeId::Int64], TypeId::Int64);
    const TOP: Signature = Signature::new(&[TypeId::Dynamic, TypeId::Dynamic], TypeId::Dynamic);

    #[test]
    fn top_typed_positional_params_are_never_exact() {
        let args = [StaticType::Int64, StaticType::Int64];
        assert!(CONCRETE.exact_match(&args));
        // A concrete argument pair must not short-circuit onto a catch-all
        // overload; the ranked candidate search decides.
        assert!(!TOP.exact_match(&args));
    }

    #[test]
    fn dynamic_arguments_are_never_exact() {
        assert!(!CONCRETE.exact_match(&[StaticType::Dynamic, StaticType::Int64]));
        assert!(!TOP.exact_match(&[StaticType::Dynamic, StaticType::Dynamic]));
    }
}
