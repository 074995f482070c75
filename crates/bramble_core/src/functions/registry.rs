//! The function/variable catalog.
//!
//! A catalog is an immutable snapshot built before resolution starts and only
//! ever read afterwards; resolution takes it by shared reference and there is
//! no process-global registry.

use std::collections::HashMap;

use ahash::RandomState;

use super::function_set::{AggregateFunctionSet, ScalarFunctionSet};
use super::scalar::builtin::ALL_SCALAR_FUNCTION_SETS;
use crate::functions::aggregate::builtin::ALL_AGGREGATE_FUNCTION_SETS;
use crate::ident::Symbol;
use crate::types::StaticType;

#[derive(Debug)]
pub struct Catalog {
    /// Keyed by case-folded name and alias.
    scalars: HashMap<String, &'static ScalarFunctionSet, RandomState>,
    aggregates: HashMap<String, &'static AggregateFunctionSet, RandomState>,
    /// Catalog-global value bindings.
    globals: Vec<(Symbol, StaticType)>,
}

impl Catalog {
    pub fn empty() -> Self {
        Catalog {
            scalars: HashMap::default(),
            aggregates: HashMap::default(),
            globals: Vec::new(),
        }
    }

    /// Catalog preloaded with every built-in function.
    pub fn with_builtins() -> Self {
        let mut catalog = Self::empty();
        for set in ALL_SCALAR_FUNCTION_SETS {
            catalog.register_scalar(set);
        }
        for set in ALL_AGGREGATE_FUNCTION_SETS {
            catalog.register_aggregate(set);
        }
        catalog
    }

    pub fn register_scalar(&mut self, set: &'static ScalarFunctionSet) {
        self.scalars.insert(set.name.to_ascii_lowercase(), set);
        for alias in set.aliases {
            self.scalars.insert(alias.to_ascii_lowercase(), set);
        }
    }

    pub fn register_aggregate(&mut self, set: &'static AggregateFunctionSet) {
        self.aggregates.insert(set.name.to_ascii_lowercase(), set);
        for alias in set.aliases {
            self.aggregates.insert(alias.to_ascii_lowercase(), set);
        }
    }

    pub fn register_global(&mut self, name: Symbol, ty: StaticType) {
        self.globals.push((name, ty));
    }

    /// Look up a scalar function set by name under the symbol's case rule.
    pub fn scalar(&self, name: &Symbol) -> Option<&'static ScalarFunctionSet> {
        let set = *self.scalars.get(&name.folded())?;
        if name.is_sensitive() && !named_exactly(set.name, set.aliases, name.text()) {
            return None;
        }
        Some(set)
    }

    /// Look up an aggregate function set by name under the symbol's case rule.
    pub fn aggregate(&self, name: &Symbol) -> Option<&'static AggregateFunctionSet> {
        let set = *self.aggregates.get(&name.folded())?;
        if name.is_sensitive() && !named_exactly(set.name, set.aliases, name.text()) {
            return None;
        }
        Some(set)
    }

    /// Globals matching the symbol under its case rule.
    pub fn matching_globals(&self, name: &Symbol) -> Vec<(usize, &Symbol, &StaticType)> {
        self.globals
            .iter()
            .enumerate()
            .filter(|(_, (global, _))| global.matches(name.text()) || name.matches(global.text()))
            .map(|(idx, (global, ty))| (idx, global, ty))
            .collect()
    }

    pub fn globals(&self) -> &[(Symbol, StaticType)] {
        &self.globals
    }

    /// Best "did you mean" suggestion for an unknown function name.
    pub fn suggest_function(&self, name: &str) -> Option<&'static str> {
        let folded = name.to_ascii_lowercase();
        self.scalars
            .values()
            .map(|set| set.name)
            .chain(self.aggregates.values().map(|set| set.name))
            .map(|candidate| (candidate, strsim::jaro_winkler(&folded, candidate)))
            .filter(|(_, score)| *score > 0.8)
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(candidate, _)| candidate)
    }
}

fn named_exactly(name: &str, aliases: &[&str], want: &str) -> bool {
    name == want || aliases.contains(&want)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_is_case_insensitive_by_default() {
        let catalog = Catalog::with_builtins();
        let name = Symbol::insensitive("Char_Length");
        assert!(catalog.scalar(&name).is_some());
    }

    #[test]
    fn sensitive_lookup_requires_exact_name() {
        let catalog = Catalog::with_builtins();
        assert!(catalog.scalar(&Symbol::sensitive("char_length")).is_some());
        assert!(catalog.scalar(&Symbol::sensitive("Char_Length")).is_none());
    }

    #[test]
    fn alias_lookup() {
        let catalog = Catalog::with_builtins();
        assert!(catalog.scalar(&Symbol::insensitive("<>")).is_some());
        assert!(catalog.aggregate(&Symbol::insensitive("some")).is_some());
    }

    #[test]
    fn suggestion_for_misspelled_name() {
        let catalog = Catalog::with_builtins();
        assert_eq!(Some("char_length"), catalog.suggest_function("char_lenght"));
        assert_eq!(None, catalog.suggest_function("zzzzzz"));
    }

    #[test]
    fn matching_globals_respects_case_rule() {
        let mut catalog = Catalog::empty();
        catalog.register_global(Symbol::sensitive("Orders"), StaticType::Bag(None));
        catalog.register_global(Symbol::sensitive("orders"), StaticType::Bag(None));

        assert_eq!(
            2,
            catalog.matching_globals(&Symbol::insensitive("ORDERS")).len()
        );
        assert_eq!(
            1,
            catalog.matching_globals(&Symbol::sensitive("orders")).len()
        );
    }
}
