//! Typed plan IR, overload resolution, and evaluation semantics for queries
//! over schemaless nested data.
//!
//! The pipeline: an external parser lowers surface syntax into an unresolved
//! [`expr::Rex`]/[`rel::Rel`] tree; [`resolver`] turns that into a fully typed
//! tree against an immutable [`functions::registry::Catalog`] snapshot,
//! accumulating diagnostics instead of failing fast; [`eval`] is the reference
//! row-at-a-time executor implementing the evaluation contract built-ins must
//! honor.

pub mod eval;
pub mod explain;
pub mod expr;
pub mod functions;
pub mod ident;
pub mod rel;
pub mod resolver;
pub mod types;
pub mod values;
