use super::Signature;
use super::aggregate::RawAggregateFunction;
use super::candidate::CandidateSignature;
use super::documentation::Documentation;
use super::scalar::RawScalarFunction;
use crate::types::StaticType;

pub type ScalarFunctionSet = FunctionSet<RawScalarFunction>;
pub type AggregateFunctionSet = FunctionSet<RawAggregateFunction>;

/// A named set of overloads sharing documentation.
///
/// The catalog registers the set under its name and every alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FunctionSet<T: 'static> {
    /// Name of the function.
    pub name: &'static str,

    /// Optional aliases for this function.
    pub aliases: &'static [&'static str],

    /// Documentation for the function.
    ///
    /// May be shorter than `functions`; overloads without dedicated docs fall
    /// back to the first entry.
    pub doc: &'static [&'static Documentation],

    /// The overloads, in declaration order. Declaration order breaks
    /// candidate-ranking ties, so more specific overloads should come first.
    pub functions: &'static [T],
}

/// Access to an overload's signature, for candidate search over a set.
pub trait FunctionInfo {
    fn signature(&self) -> &Signature;
}

impl<T: FunctionInfo> FunctionSet<T> {
    /// Find the first overload whose signature exactly matches the inputs.
    pub fn find_exact(&self, inputs: &[StaticType]) -> Option<(usize, &T)> {
        self.functions
            .iter()
            .enumerate()
            .find(|(_, func)| func.signature().exact_match(inputs))
    }

    /// Rank-sorted candidates for the inputs, best first.
    pub fn candidates(&self, inputs: &[StaticType]) -> Vec<CandidateSignature> {
        let sigs: Vec<_> = self.functions.iter().map(|f| f.signature()).collect();
        CandidateSignature::find_candidates(inputs, &sigs)
    }

    pub fn get(&self, idx: usize) -> Option<&T> {
        self.functions.get(idx)
    }

    /// True when any overload accepts this argument count.
    pub fn accepts_arity(&self, argc: usize) -> bool {
        self.functions
            .iter()
            .any(|f| f.signature().accepts_arity(argc))
    }
}
