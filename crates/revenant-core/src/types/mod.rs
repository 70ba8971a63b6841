//! Type handles and reconstruction recipes
//!
//! Every type the resolver hands out is a [`TypeHandle`]: either a real
//! type supplied by the host, or a placeholder synthesized for a name that
//! could not be resolved. Both carry a [`Recipe`] describing how instances
//! are constructed and how decoded state is applied to them.

pub mod handle;
pub mod recipe;

pub use handle::{PlaceholderType, RealType, Reconstruct, TypeHandle};
pub use recipe::{ApplyStateFn, BaseRepr, ConstructFn, Constructor, Recipe, StateApplier};

/// Join a namespace name and a local name into a qualified name
pub fn qualify(namespace: &str, name: &str) -> String {
    let mut qualified = String::with_capacity(namespace.len() + name.len() + 1);
    qualified.push_str(namespace);
    qualified.push('.');
    qualified.push_str(name);
    qualified
}

/// Split a qualified name into `(namespace, local name)`
///
/// Returns `None` for names without a dot.
pub fn split_qualified(qualified: &str) -> Option<(&str, &str)> {
    qualified.rsplit_once('.')
}
