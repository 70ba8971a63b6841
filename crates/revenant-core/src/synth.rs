//! Placeholder type synthesis

use crate::namespace::{Binding, NamespaceHandle, NamespaceRegistry};
use crate::overrides::OverrideTable;
use crate::types::{qualify, PlaceholderType, Recipe, TypeHandle};

/// Synthesize a placeholder for `owner.type_name` and bind it in `owner`
///
/// The recipe comes from the override table when it has an entry for the
/// qualified name, otherwise the default recipe is used. Binding the result
/// makes later lookups of the same name return this exact handle.
pub fn synthesize(
    registry: &mut NamespaceRegistry,
    overrides: &OverrideTable,
    type_name: &str,
    owner: &NamespaceHandle,
) -> TypeHandle {
    let ty = placeholder_for(overrides, owner.name(), type_name);
    log::debug!("Synthesized {}", ty);
    registry.bind(owner.name(), type_name, Binding::Type(ty.clone()));
    ty
}

/// Build the placeholder for `namespace.type_name` without binding it
pub fn placeholder_for(overrides: &OverrideTable, namespace: &str, type_name: &str) -> TypeHandle {
    let qualified = qualify(namespace, type_name);
    let (recipe, overridden) = match overrides.lookup(&qualified) {
        Some(entry) => (entry.recipe, true),
        None => (Recipe::DEFAULT, false),
    };
    TypeHandle::placeholder(PlaceholderType::new(namespace, type_name, recipe, overridden))
}
