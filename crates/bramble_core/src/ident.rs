//! Names as they appear in queries: simple symbols with a case rule, and
//! dotted qualified names.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

/// A single name plus the rule for comparing it.
///
/// Case-insensitive symbols compare after a lowercase fold; case-sensitive
/// symbols compare byte-for-byte. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Symbol {
    text: String,
    case: CaseSensitivity,
}

impl Symbol {
    pub fn sensitive(text: impl Into<String>) -> Self {
        Symbol {
            text: text.into(),
            case: CaseSensitivity::Sensitive,
        }
    }

    pub fn insensitive(text: impl Into<String>) -> Self {
        Symbol {
            text: text.into(),
            case: CaseSensitivity::Insensitive,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn case(&self) -> CaseSensitivity {
        self.case
    }

    pub fn is_sensitive(&self) -> bool {
        self.case == CaseSensitivity::Sensitive
    }

    /// Does this symbol name the given string under its own case rule?
    pub fn matches(&self, candidate: &str) -> bool {
        match self.case {
            CaseSensitivity::Sensitive => self.text == candidate,
            CaseSensitivity::Insensitive => self.text.eq_ignore_ascii_case(candidate),
        }
    }

    /// The canonical fold used for registry keys and hashing.
    pub fn folded(&self) -> String {
        match self.case {
            CaseSensitivity::Sensitive => self.text.clone(),
            CaseSensitivity::Insensitive => self.text.to_ascii_lowercase(),
        }
    }
}

impl PartialEq for Symbol {
    fn eq(&self, other: &Self) -> bool {
        match (self.case, other.case) {
            (CaseSensitivity::Sensitive, CaseSensitivity::Sensitive) => self.text == other.text,
            // An insensitive side relaxes the comparison.
            _ => self.text.eq_ignore_ascii_case(&other.text),
        }
    }
}

impl Eq for Symbol {}

impl Hash for Symbol {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Hash the fold unconditionally so mixed-case-rule equals collide.
        for b in self.text.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.case {
            CaseSensitivity::Sensitive => write!(f, "\"{}\"", self.text),
            CaseSensitivity::Insensitive => write!(f, "{}", self.text),
        }
    }
}

/// A rooted, dotted name, e.g. `catalog.schema.value`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    pub root: Symbol,
    pub steps: Vec<Symbol>,
}

impl QualifiedName {
    pub fn bare(root: Symbol) -> Self {
        QualifiedName {
            root,
            steps: Vec::new(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        for step in &self.steps {
            write!(f, ".{step}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insensitive_compare_folds() {
        assert_eq!(Symbol::insensitive("Foo"), Symbol::insensitive("fOO"));
        assert!(Symbol::insensitive("Foo").matches("foo"));
    }

    #[test]
    fn sensitive_compare_is_exact() {
        assert_ne!(Symbol::sensitive("Foo"), Symbol::sensitive("foo"));
        assert!(!Symbol::sensitive("Foo").matches("foo"));
        assert!(Symbol::sensitive("Foo").matches("Foo"));
    }

    #[test]
    fn mixed_rule_compare_relaxes() {
        assert_eq!(Symbol::sensitive("Foo"), Symbol::insensitive("foo"));
    }
}
