use std::fmt;

use serde::Serialize;

use crate::functions::Signature;
use crate::ident::Symbol;
use crate::types::StaticType;

/// A problem found during resolution.
///
/// Resolution never fails outright. Problems are recorded as diagnostics and
/// the offending node is replaced with an error node, letting a single pass
/// report every issue in the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
        }
    }

    pub fn unknown_function(name: &Symbol, suggestion: Option<&str>) -> Self {
        let mut message = format!("Unknown function '{name}'");
        if let Some(suggestion) = suggestion {
            message.push_str(&format!(", did you mean '{suggestion}'?"));
        }
        Diagnostic { message }
    }

    pub fn invalid_arity(name: &Symbol, got: usize) -> Self {
        Diagnostic {
            message: format!("No signature of '{name}' accepts {got} argument(s)"),
        }
    }

    pub fn no_matching_overload(name: &Symbol, args: &[StaticType], sigs: &[&Signature]) -> Self {
        let mut message = format!(
            "No function overload of '{name}' matches argument types ({})",
            fmt_types(args)
        );
        if !sigs.is_empty() {
            message.push_str("\nCandidates:");
            for sig in sigs {
                message.push_str(&format!("\n  {name}{sig}"));
            }
        }
        Diagnostic { message }
    }

    pub fn ambiguous_overload(name: &Symbol, args: &[StaticType]) -> Self {
        Diagnostic {
            message: format!(
                "Ambiguous call to '{name}' with argument types ({})",
                fmt_types(args)
            ),
        }
    }

    pub fn unknown_variable(name: &Symbol, suggestion: Option<&str>) -> Self {
        let mut message = format!("Unknown variable '{name}'");
        if let Some(suggestion) = suggestion {
            message.push_str(&format!(", did you mean '{suggestion}'?"));
        }
        Diagnostic { message }
    }

    pub fn unknown_exclude_root(name: &Symbol) -> Self {
        Diagnostic {
            message: format!("Unknown binding '{name}' in EXCLUDE"),
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn fmt_types(types: &[StaticType]) -> String {
    types
        .iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}
