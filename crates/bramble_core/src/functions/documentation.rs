/// Function categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Functions implementing language operators.
    Operator(OperatorCategory),
    Aggregate,
    Numeric,
    DateTime,
    String,
    Collection,
    Nullability,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperatorCategory {
    Numeric,
    Comparison,
    Logical,
}

impl Category {
    pub const NUMERIC_OPERATOR: Self = Category::Operator(OperatorCategory::Numeric);
    pub const COMPARISON_OPERATOR: Self = Category::Operator(OperatorCategory::Comparison);
    pub const LOGICAL_OPERATOR: Self = Category::Operator(OperatorCategory::Logical);

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Operator(OperatorCategory::Numeric) => "numeric_operator",
            Self::Operator(OperatorCategory::Comparison) => "comparison_operator",
            Self::Operator(OperatorCategory::Logical) => "logical_operator",
            Self::Aggregate => "aggregate",
            Self::Numeric => "numeric",
            Self::DateTime => "datetime",
            Self::String => "string",
            Self::Collection => "collection",
            Self::Nullability => "nullability",
            Self::System => "system",
        }
    }
}

/// Documentation for a single function variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Documentation {
    /// Category this function belongs in.
    pub category: Category,
    /// Description of the function.
    pub description: &'static str,
    /// Argument names for this variant.
    pub arguments: &'static [&'static str],
    /// An optional example for the function.
    pub example: Option<Example>,
}

/// A simple example.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Example {
    /// Example usage; just the function call, not a whole query.
    pub example: &'static str,
    /// The output for the above example.
    pub output: &'static str,
}
