//! Evaluation contract and the row-at-a-time reference executor.
//!
//! Resolution produces fully typed trees; this module gives them their
//! runtime semantics: null/missing propagation, three-valued predicate
//! collapse, the aggregate accumulator protocol, and per-operator tuple
//! streams.

pub mod cast;
pub mod evaluator;
pub mod executor;

use crate::ident::Symbol;
use crate::values::Value;

/// Typing mode the query runs under.
///
/// The modes differ in how missing data surfaces: strict mode turns missing
/// into null at propagation points, permissive mode keeps missing flowing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvalMode {
    Strict,
    #[default]
    Permissive,
}

/// A row of slot values. Variable slots index into this.
pub type Row = Vec<Value>;

/// Runtime context for expression evaluation.
#[derive(Debug)]
pub struct EvalContext {
    pub mode: EvalMode,
    /// Catalog-global bindings, matched by symbol.
    pub globals: Vec<(Symbol, Value)>,
}

impl EvalContext {
    pub fn new(mode: EvalMode) -> Self {
        EvalContext {
            mode,
            globals: Vec::new(),
        }
    }

    pub fn with_global(mut self, name: Symbol, value: Value) -> Self {
        self.globals.push((name, value));
        self
    }

    pub fn global(&self, name: &Symbol) -> Option<&Value> {
        self.globals
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}
