pub mod builtin;

use std::fmt;

use bramble_error::Result;

use super::Signature;
use super::function_set::FunctionInfo;
use crate::eval::EvalMode;
use crate::types::StaticType;
use crate::values::Value;

/// How a function treats null/missing arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NullPropagation {
    /// Any null argument yields null; any missing argument yields null in
    /// strict mode or missing in permissive mode. The function body never
    /// sees a null/missing input.
    Propagate,

    /// The function receives null/missing arguments as-is.
    Observe,
}

/// A scalar function overload.
///
/// Implementations hold no state; one static instance backs every call site.
pub trait ScalarFunction: fmt::Debug + Sync + Send {
    fn propagation(&self) -> NullPropagation {
        NullPropagation::Propagate
    }

    /// Invoke with arguments matching the planned signature.
    ///
    /// Arity was settled at resolution; implementations may index `args`
    /// positionally up to their signature's arity.
    fn invoke(&self, args: &[Value], mode: EvalMode) -> Result<Value>;
}

/// A scalar function paired with the signature it implements.
#[derive(Debug, Clone, Copy)]
pub struct RawScalarFunction {
    signature: &'static Signature,
    function: &'static dyn ScalarFunction,
}

impl RawScalarFunction {
    pub const fn new(
        signature: &'static Signature,
        function: &'static dyn ScalarFunction,
    ) -> Self {
        RawScalarFunction {
            signature,
            function,
        }
    }

    pub fn function(&self) -> &'static dyn ScalarFunction {
        self.function
    }
}

impl FunctionInfo for RawScalarFunction {
    fn signature(&self) -> &Signature {
        self.signature
    }
}

impl PartialEq for RawScalarFunction {
    fn eq(&self, other: &Self) -> bool {
        self.signature == other.signature
            && std::ptr::addr_eq(self.function as *const _, other.function as *const _)
    }
}

impl Eq for RawScalarFunction {}

/// A scalar function as placed into a call node by resolution: a concrete
/// overload plus its computed return type.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedScalarFunction {
    /// Catalog name the call resolved through.
    pub name: &'static str,
    pub function: RawScalarFunction,
    pub return_type: StaticType,
}

impl PlannedScalarFunction {
    pub fn propagation(&self) -> NullPropagation {
        self.function.function().propagation()
    }

    pub fn invoke(&self, args: &[Value], mode: EvalMode) -> Result<Value> {
        self.function.function().invoke(args, mode)
    }
}

impl fmt::Display for PlannedScalarFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
