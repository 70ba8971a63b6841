//! Type resolution
//!
//! The decoder calls [`resolve`] once per type reference in the stream.
//! Resolution never fails for a well-formed name pair: whatever the host
//! cannot supply degrades to a placeholder so decoding always makes
//! forward progress.

use crate::namespace::{validate_name, Binding, NamespaceRegistry};
use crate::overrides::OverrideTable;
use crate::synth::synthesize;
use crate::types::TypeHandle;
use crate::Result;

/// Resolve `namespace_name.type_name` to a real type or a placeholder
///
/// 1. Resolve the namespace (real if the host has it, fake otherwise).
/// 2. If the name is bound to a type there, return it. This covers real
///    types and placeholders synthesized earlier.
/// 3. Otherwise (nothing bound, or a namespace bound under the name),
///    synthesize a placeholder and bind it.
pub fn resolve(
    registry: &mut NamespaceRegistry,
    overrides: &OverrideTable,
    namespace_name: &str,
    type_name: &str,
) -> Result<TypeHandle> {
    validate_name(type_name)?;
    let ns = registry.resolve_namespace(namespace_name)?;

    if let Some(Binding::Type(ty)) = registry.lookup(ns.name(), type_name) {
        return Ok(ty.clone());
    }

    Ok(synthesize(registry, overrides, type_name, &ns))
}
