use super::Rex;

/// One WHEN/THEN pair of a searched case expression.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseBranch {
    /// Taken when this evaluates to boolean true.
    pub condition: Rex,
    pub result: Rex,
}
