//! Candidate signature search used by overload resolution, both at plan time
//! and by dynamic dispatch at runtime.

use super::Signature;
use super::implicit::{
    DYNAMIC_PARAM_SCORE,
    NO_CAST_SCORE,
    UNKNOWN_ARG_SCORE,
    implicit_cast_score,
};
use crate::types::{StaticType, TypeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastType {
    /// Need to cast the argument to this type.
    Cast { to: TypeId, score: u32 },

    /// Casting isn't needed, the original type works.
    NoCastNeeded,
}

impl CastType {
    pub const fn score(&self) -> u32 {
        match self {
            CastType::Cast { score, .. } => *score,
            CastType::NoCastNeeded => NO_CAST_SCORE,
        }
    }
}

/// A signature that can satisfy a call after applying the listed casts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSignature {
    /// Index of the function (and its signature) within the function set.
    pub function_idx: usize,

    /// Casts to apply per argument to satisfy the signature.
    pub casts: Vec<CastType>,

    /// Total score; higher is preferred.
    pub score: u32,

    /// Whether the matched signature is variadic, kept for tie-breaking.
    pub variadic: bool,
}

impl CandidateSignature {
    /// Find candidate signatures for the given input types.
    ///
    /// Candidates are sorted best-first: by score descending, then
    /// non-variadic before variadic, then declaration order. The sort is
    /// fully determined, so repeated runs over the same catalog produce the
    /// same ranking.
    pub fn find_candidates(inputs: &[StaticType], sigs: &[&Signature]) -> Vec<Self> {
        let mut candidates = Vec::new();

        let mut buf = Vec::new();
        for (idx, sig) in sigs.iter().enumerate() {
            if !sig.accepts_arity(inputs.len()) {
                continue;
            }
            if !Self::compare_and_fill_types(inputs, sig, &mut buf) {
                continue;
            }

            let casts = std::mem::take(&mut buf);
            let score = casts.iter().map(|c| c.score()).sum();
            candidates.push(CandidateSignature {
                function_idx: idx,
                casts,
                score,
                variadic: sig.is_variadic(),
            })
        }

        candidates.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.variadic.cmp(&b.variadic))
                .then_with(|| a.function_idx.cmp(&b.function_idx))
        });

        candidates
    }

    /// Compare the types we have against the types the signature wants,
    /// filling the buffer with the cast needed per argument.
    ///
    /// Returns true if every argument can be implicitly cast.
    fn compare_and_fill_types(
        have: &[StaticType],
        sig: &Signature,
        buf: &mut Vec<CastType>,
    ) -> bool {
        buf.clear();

        for (idx, have) in have.iter().enumerate() {
            let want = match sig.positional_args.get(idx) {
                Some(&want) => want,
                None => match sig.variadic_arg {
                    Some(want) => want,
                    None => return false,
                },
            };

            let cast = match arg_cast(have, want) {
                Some(cast) => cast,
                None => return false,
            };
            buf.push(cast);
        }

        true
    }
}

fn arg_cast(have: &StaticType, want: TypeId) -> Option<CastType> {
    // The top-type parameter takes anything unchanged, at a low score.
    if want == TypeId::Dynamic {
        return Some(CastType::Cast {
            to: TypeId::Dynamic,
            score: DYNAMIC_PARAM_SCORE,
        });
    }

    // Unknown static type: plausible for any parameter, checked at runtime.
    if have.is_dynamic() {
        return Some(CastType::Cast {
            to: want,
            score: UNKNOWN_ARG_SCORE,
        });
    }

    if have.type_id() == want {
        return Some(CastType::NoCastNeeded);
    }

    let score = implicit_cast_score(have.type_id(), want)?;
    Some(CastType::Cast { to: want, score })
}
