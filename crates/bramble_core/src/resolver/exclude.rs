//! Exclude-path resolution: binds each item's root name to a slot in the
//! operator's input schema.

use super::ResolveContext;
use super::diagnostics::Diagnostic;
use crate::rel::Binding;
use crate::rel::exclude::{ExcludeItem, ExcludeRoot};

/// Resolve item roots against the schema.
///
/// An item whose root matches no binding, or more than one, is dropped from
/// the operator with a diagnostic; exclusion of an unknown path has nothing
/// to act on.
pub(super) fn resolve_items(
    ctx: &mut ResolveContext,
    schema: &[Binding],
    items: &[ExcludeItem],
) -> Vec<ExcludeItem> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let name = match &item.root {
            ExcludeRoot::Resolved(_) => {
                out.push(item.clone());
                continue;
            }
            ExcludeRoot::Unresolved(name) => name,
        };

        let matches: Vec<usize> = schema
            .iter()
            .enumerate()
            .filter(|(_, b)| b.name == *name)
            .map(|(idx, _)| idx)
            .collect();

        match matches.as_slice() {
            [slot] => out.push(ExcludeItem {
                root: ExcludeRoot::Resolved(*slot),
                steps: item.steps.clone(),
            }),
            [] => ctx.diag(Diagnostic::unknown_exclude_root(name)),
            _ => ctx.diag(Diagnostic::new(format!(
                "Binding '{name}' in EXCLUDE matches more than one schema binding"
            ))),
        }
    }
    out
}
