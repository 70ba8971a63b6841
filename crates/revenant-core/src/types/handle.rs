//! Type handles with name-based identity
//!
//! A placeholder synthesized for `pkg.mod.Name` compares and hashes equal
//! to the real `pkg.mod.Name` once that becomes available, so data built
//! against either can be matched against the other.

use super::qualify;
use super::recipe::Recipe;
use crate::namespace::NamespaceHandle;
use crate::object::Instance;
use crate::restore::{self, RestoreContext};
use crate::value::Value;
use crate::Result;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Capabilities shared by real and placeholder types
pub trait Reconstruct {
    /// Dot-separated name of the owning namespace
    fn module(&self) -> &str;

    /// Local name within the owning namespace
    fn name(&self) -> &str;

    /// Fully qualified name, `module.name`
    fn qualified_name(&self) -> &str;

    /// Recipe used to construct instances and apply state
    fn recipe(&self) -> &Recipe;
}

/// A real type supplied by the host environment
#[derive(Debug, Clone)]
pub struct RealType {
    module: String,
    name: String,
    qualified: String,
    recipe: Recipe,
}

impl RealType {
    /// Create a real type with the default recipe
    pub fn new(module: impl Into<String>, name: impl Into<String>) -> Self {
        Self::with_recipe(module, name, Recipe::DEFAULT)
    }

    /// Create a real type with a specific recipe
    pub fn with_recipe(module: impl Into<String>, name: impl Into<String>, recipe: Recipe) -> Self {
        let module = module.into();
        let name = name.into();
        let qualified = qualify(&module, &name);
        Self {
            module,
            name,
            qualified,
            recipe,
        }
    }
}

impl Reconstruct for RealType {
    fn module(&self) -> &str {
        &self.module
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn qualified_name(&self) -> &str {
        &self.qualified
    }

    fn recipe(&self) -> &Recipe {
        &self.recipe
    }
}

/// A synthesized stand-in for a type that could not be resolved
#[derive(Debug, Clone)]
pub struct PlaceholderType {
    module: String,
    name: String,
    qualified: String,
    recipe: Recipe,
    overridden: bool,
}

impl PlaceholderType {
    /// Create a placeholder owned by the namespace `module`
    ///
    /// `overridden` records whether the recipe came from the override table.
    pub fn new(
        module: impl Into<String>,
        name: impl Into<String>,
        recipe: Recipe,
        overridden: bool,
    ) -> Self {
        let module = module.into();
        let name = name.into();
        let qualified = qualify(&module, &name);
        Self {
            module,
            name,
            qualified,
            recipe,
            overridden,
        }
    }

    /// Whether the recipe came from a special-case override
    pub fn is_overridden(&self) -> bool {
        self.overridden
    }
}

impl Reconstruct for PlaceholderType {
    fn module(&self) -> &str {
        &self.module
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn qualified_name(&self) -> &str {
        &self.qualified
    }

    fn recipe(&self) -> &Recipe {
        &self.recipe
    }
}

/// Handle to a resolved type
///
/// Equality and hashing use the qualified name only.
#[derive(Clone)]
pub enum TypeHandle {
    /// Real type from the host environment
    Resolved(Arc<RealType>),
    /// Synthesized placeholder
    Placeholder(Arc<PlaceholderType>),
}

impl TypeHandle {
    /// Wrap a real type
    pub fn resolved(ty: RealType) -> Self {
        TypeHandle::Resolved(Arc::new(ty))
    }

    /// Wrap a placeholder type
    pub fn placeholder(ty: PlaceholderType) -> Self {
        TypeHandle::Placeholder(Arc::new(ty))
    }

    /// Check if this handle is a placeholder
    pub fn is_placeholder(&self) -> bool {
        matches!(self, TypeHandle::Placeholder(_))
    }

    /// Check if both handles share the same underlying allocation
    pub fn same_instance(&self, other: &TypeHandle) -> bool {
        match (self, other) {
            (TypeHandle::Resolved(a), TypeHandle::Resolved(b)) => Arc::ptr_eq(a, b),
            (TypeHandle::Placeholder(a), TypeHandle::Placeholder(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    fn inner(&self) -> &dyn Reconstruct {
        match self {
            TypeHandle::Resolved(ty) => ty.as_ref(),
            TypeHandle::Placeholder(ty) => ty.as_ref(),
        }
    }

    /// Construct a new instance from decoder-supplied arguments
    pub fn construct(&self, args: Vec<Value>, ctx: &mut RestoreContext<'_>) -> Result<Instance> {
        restore::construct(self, args, ctx)
    }

    /// Apply a decoded state payload to an instance of this type
    pub fn apply_state(
        &self,
        instance: &mut Instance,
        state: Value,
        ctx: &mut RestoreContext<'_>,
    ) -> Result<()> {
        restore::apply_state_with(self.recipe(), instance, state, ctx)
    }
}

impl Reconstruct for TypeHandle {
    fn module(&self) -> &str {
        self.inner().module()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn qualified_name(&self) -> &str {
        self.inner().qualified_name()
    }

    fn recipe(&self) -> &Recipe {
        self.inner().recipe()
    }
}

impl PartialEq for TypeHandle {
    fn eq(&self, other: &Self) -> bool {
        self.qualified_name() == other.qualified_name()
    }
}

impl Eq for TypeHandle {}

impl Hash for TypeHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.qualified_name().hash(state);
    }
}

impl PartialEq<str> for TypeHandle {
    fn eq(&self, other: &str) -> bool {
        self.qualified_name() == other
    }
}

impl PartialEq<&str> for TypeHandle {
    fn eq(&self, other: &&str) -> bool {
        self.qualified_name() == *other
    }
}

impl PartialEq<NamespaceHandle> for TypeHandle {
    fn eq(&self, other: &NamespaceHandle) -> bool {
        self.qualified_name() == other.name()
    }
}

impl fmt::Debug for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            TypeHandle::Resolved(_) => "Resolved",
            TypeHandle::Placeholder(_) => "Placeholder",
        };
        f.debug_struct(kind)
            .field("name", &self.qualified_name())
            .field("recipe", self.recipe())
            .finish()
    }
}

impl fmt::Display for TypeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeHandle::Resolved(ty) => write!(f, "<class '{}'>", ty.qualified_name()),
            TypeHandle::Placeholder(ty) => {
                write!(f, "<class '{}' (placeholder)>", ty.qualified_name())
            }
        }
    }
}
