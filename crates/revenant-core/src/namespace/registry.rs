//! Namespace registry
//!
//! A tree of real and fake modules keyed by qualified name. Exactly one
//! [`Namespace`] exists per name while it is registered. Fake namespaces
//! are created on demand when the host cannot supply a real one, and are
//! released child-first so no binding ever points at a released namespace.

use super::host::{HostModule, ModuleLoader};
use crate::types::{qualify, split_qualified, Reconstruct, TypeHandle};
use crate::{Error, Result};
use rustc_hash::FxHashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Whether a namespace came from the host or was synthesized
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamespaceKind {
    /// Loaded from the host environment
    Real,
    /// Synthesized because the host could not supply it
    Fake,
}

/// Lightweight reference to a registered namespace
///
/// Equality and hashing use the qualified name only.
#[derive(Clone)]
pub struct NamespaceHandle {
    name: Arc<str>,
    kind: NamespaceKind,
}

impl NamespaceHandle {
    fn new(name: &str, kind: NamespaceKind) -> Self {
        Self {
            name: Arc::from(name),
            kind,
        }
    }

    /// Qualified name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Real or fake
    pub fn kind(&self) -> NamespaceKind {
        self.kind
    }

    /// Check if this namespace is fake
    pub fn is_fake(&self) -> bool {
        self.kind == NamespaceKind::Fake
    }
}

impl PartialEq for NamespaceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for NamespaceHandle {}

impl Hash for NamespaceHandle {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl PartialEq<TypeHandle> for NamespaceHandle {
    fn eq(&self, other: &TypeHandle) -> bool {
        self.name() == other.qualified_name()
    }
}

impl fmt::Debug for NamespaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamespaceHandle({}, {:?})", self.name, self.kind)
    }
}

impl fmt::Display for NamespaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            NamespaceKind::Real => write!(f, "<module '{}'>", self.name),
            NamespaceKind::Fake => write!(f, "<module '{}' (fake)>", self.name),
        }
    }
}

/// A value bound to a local name inside a namespace
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    /// A real or placeholder type
    Type(TypeHandle),
    /// A namespace (usually the child `parent.local`)
    Namespace(NamespaceHandle),
}

/// A registered module
#[derive(Debug)]
pub struct Namespace {
    handle: NamespaceHandle,
    mounted: bool,
    bindings: FxHashMap<String, Binding>,
}

impl Namespace {
    /// Handle for this namespace
    pub fn handle(&self) -> &NamespaceHandle {
        &self.handle
    }

    /// Qualified name
    pub fn name(&self) -> &str {
        self.handle.name()
    }

    /// Check if this namespace is fake
    pub fn is_fake(&self) -> bool {
        self.handle.is_fake()
    }

    /// Check if this namespace was mounted explicitly as a fake package
    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Look up a binding by local name
    pub fn get(&self, local: &str) -> Option<&Binding> {
        self.bindings.get(local)
    }

    /// Iterate all bindings
    pub fn bindings(&self) -> impl Iterator<Item = (&str, &Binding)> {
        self.bindings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Number of bindings
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Check if nothing is bound
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn is_child_of(child: &str, parent: &str, local: &str) -> bool {
    split_qualified(child) == Some((parent, local))
}

/// Validate a dotted qualified name
pub fn validate_name(name: &str) -> Result<()> {
    if name.is_empty() || name.split('.').any(str::is_empty) {
        return Err(Error::InvalidName(name.to_string()));
    }
    Ok(())
}

fn validate_local(local: &str) -> Result<()> {
    if local.is_empty() || local.contains('.') {
        return Err(Error::InvalidName(local.to_string()));
    }
    Ok(())
}

/// Registry of real and fake namespaces for one decode session
pub struct NamespaceRegistry {
    namespaces: FxHashMap<String, Namespace>,
    host: Arc<dyn ModuleLoader>,
}

impl NamespaceRegistry {
    /// Create an empty registry that loads real modules from `host`
    pub fn new(host: Arc<dyn ModuleLoader>) -> Self {
        Self {
            namespaces: FxHashMap::default(),
            host,
        }
    }

    /// Get or create the namespace with the given qualified name
    ///
    /// Dotted names are resolved parent-first, so `a.b.c` registers `a`,
    /// `a.b` and `a.b.c`, each bound in its parent. Only an invalid name
    /// can fail; anything the host cannot load becomes a fake namespace.
    pub fn resolve_namespace(&mut self, name: &str) -> Result<NamespaceHandle> {
        validate_name(name)?;

        if let Some(ns) = self.namespaces.get(name) {
            return Ok(ns.handle.clone());
        }

        match split_qualified(name) {
            Some((parent, local)) => {
                let parent = self.resolve_namespace(parent)?;
                self.get_or_create_child(&parent, local)
            }
            None => Ok(self.load_or_fake(name)),
        }
    }

    /// Get or create the child `parent.local`
    ///
    /// An existing namespace binding is returned as is. Otherwise the host
    /// is asked for the real child first, and a fake child is created only
    /// if that fails. The child is bound in the parent unless the local
    /// name is already bound to a type.
    pub fn get_or_create_child(
        &mut self,
        parent: &NamespaceHandle,
        local: &str,
    ) -> Result<NamespaceHandle> {
        validate_local(local)?;

        // The handle may outlive a release; re-resolving restores the parent.
        if !self.namespaces.contains_key(parent.name()) {
            self.resolve_namespace(parent.name())?;
        }

        let qualified = qualify(parent.name(), local);
        if let Some(Binding::Namespace(existing)) = self
            .namespaces
            .get(parent.name())
            .and_then(|ns| ns.get(local))
        {
            if self.namespaces.contains_key(existing.name()) {
                return Ok(existing.clone());
            }
        }

        let child = match self.namespaces.get(&qualified) {
            Some(ns) => ns.handle.clone(),
            None => self.load_or_fake(&qualified),
        };

        let type_bound = matches!(
            self.lookup(parent.name(), local),
            Some(Binding::Type(_))
        );
        if !type_bound {
            self.bind(parent.name(), local, Binding::Namespace(child.clone()));
        }
        Ok(child)
    }

    /// Mount a fake package, shadowing any real module of the same name
    ///
    /// Every namespace under a mounted package is fake: the host is never
    /// asked for `name` or any `name.*` module while the mount is
    /// registered. Namespaces already registered under `name` are released
    /// first, real ones included.
    pub fn mount_fake_package(&mut self, name: &str) -> Result<NamespaceHandle> {
        validate_name(name)?;

        if let Some(ns) = self.namespaces.get(name) {
            if ns.mounted {
                return Ok(ns.handle.clone());
            }
        }
        for descendant in self.descendants(name, |_| true) {
            self.remove(&descendant);
        }
        self.release(name);

        let handle = self.register(name, NamespaceKind::Fake, true, FxHashMap::default());
        if let Some((parent, local)) = split_qualified(name) {
            let parent = self.resolve_namespace(parent)?;
            self.bind(parent.name(), local, Binding::Namespace(handle.clone()));
        }
        log::debug!("Mounted fake package {}", handle);
        Ok(handle)
    }

    /// Check if `name` lies inside a registered fake package mount
    pub fn is_under_mount(&self, name: &str) -> bool {
        name.match_indices('.').any(|(i, _)| {
            self.namespaces
                .get(&name[..i])
                .map_or(false, |ns| ns.mounted)
        })
    }

    /// Bind `local` inside namespace `ns`, returning the previous binding
    ///
    /// Replacing a fake child namespace with anything other than itself
    /// releases that child and its fake descendants first. Returns `None`
    /// without binding if `ns` is not registered.
    pub fn bind(&mut self, ns: &str, local: &str, binding: Binding) -> Option<Binding> {
        let previous = self
            .namespaces
            .get_mut(ns)?
            .bindings
            .insert(local.to_string(), binding.clone());

        if let Some(Binding::Namespace(old)) = &previous {
            let replaced_by_self = matches!(&binding, Binding::Namespace(new) if new == old);
            if old.is_fake() && !replaced_by_self && is_child_of(old.name(), ns, local) {
                self.release(old.name());
            }
        }
        previous
    }

    /// Remove the binding `local` from namespace `ns`
    ///
    /// A removed fake child namespace is released with its fake descendants.
    pub fn unbind(&mut self, ns: &str, local: &str) -> Option<Binding> {
        let previous = self.namespaces.get_mut(ns)?.bindings.remove(local);
        if let Some(Binding::Namespace(old)) = &previous {
            if old.is_fake() && is_child_of(old.name(), ns, local) {
                self.release(old.name());
            }
        }
        previous
    }

    /// Release a namespace
    ///
    /// Every registered fake namespace below `name` is released first,
    /// deepest first, whether or not it is bound in its parent. Then the
    /// namespace itself is unregistered and detached from its parent.
    /// Returns `false` if nothing was registered under `name`.
    pub fn release(&mut self, name: &str) -> bool {
        if !self.namespaces.contains_key(name) {
            return false;
        }
        for descendant in self.descendants(name, Namespace::is_fake) {
            self.remove(&descendant);
        }
        self.remove(name);
        true
    }

    /// Registered namespaces strictly below `name` matching `filter`,
    /// deepest first
    fn descendants(&self, name: &str, keep: impl Fn(&Namespace) -> bool) -> Vec<String> {
        let prefix = format!("{}.", name);
        let mut found: Vec<String> = self
            .namespaces
            .values()
            .filter(|ns| ns.name().starts_with(&prefix) && keep(*ns))
            .map(|ns| ns.name().to_string())
            .collect();
        found.sort_unstable_by(|a, b| {
            let depth = |n: &str| n.matches('.').count();
            depth(b).cmp(&depth(a)).then_with(|| a.cmp(b))
        });
        found
    }

    // Unregister one namespace and drop its parent's binding to it
    fn remove(&mut self, name: &str) {
        let released = self.namespaces.remove(name);

        if let Some((parent, local)) = split_qualified(name) {
            if let Some(parent) = self.namespaces.get_mut(parent) {
                let points_here =
                    matches!(parent.bindings.get(local), Some(Binding::Namespace(h)) if h.name() == name);
                if points_here {
                    parent.bindings.remove(local);
                }
            }
        }

        if let Some(ns) = released {
            log::debug!("Released {}", ns.handle);
        }
    }

    /// Look up a registered namespace
    pub fn get(&self, name: &str) -> Option<&Namespace> {
        self.namespaces.get(name)
    }

    /// Look up the binding `local` inside namespace `ns`
    pub fn lookup(&self, ns: &str, local: &str) -> Option<&Binding> {
        self.namespaces.get(ns)?.get(local)
    }

    /// Check if a namespace is registered
    pub fn contains(&self, name: &str) -> bool {
        self.namespaces.contains_key(name)
    }

    /// Number of registered namespaces
    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    /// Check if no namespace is registered
    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    /// Names of all registered namespaces, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.namespaces.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Names of the registered fake namespaces, sorted
    pub fn fake_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .namespaces
            .values()
            .filter(|ns| ns.is_fake())
            .map(Namespace::name)
            .collect();
        names.sort_unstable();
        names
    }

    fn load_or_fake(&mut self, name: &str) -> NamespaceHandle {
        if self.is_under_mount(name) {
            let handle = self.register(name, NamespaceKind::Fake, false, FxHashMap::default());
            log::debug!("Created module {} inside a mounted package", handle);
            return handle;
        }
        match self.host.load(name) {
            Ok(module) => self.register_real(name, &module),
            Err(err) => {
                log::debug!("{}; synthesizing fake module", err);
                let handle = self.register(name, NamespaceKind::Fake, false, FxHashMap::default());
                log::debug!("Created module {}", handle);
                handle
            }
        }
    }

    fn register_real(&mut self, name: &str, module: &HostModule) -> NamespaceHandle {
        let bindings = module
            .types()
            .map(|(local, ty)| (local.to_string(), Binding::Type(ty.clone())))
            .collect();
        self.register(name, NamespaceKind::Real, false, bindings)
    }

    fn register(
        &mut self,
        name: &str,
        kind: NamespaceKind,
        mounted: bool,
        bindings: FxHashMap<String, Binding>,
    ) -> NamespaceHandle {
        let handle = NamespaceHandle::new(name, kind);
        self.namespaces.insert(
            name.to_string(),
            Namespace {
                handle: handle.clone(),
                mounted,
                bindings,
            },
        );
        handle
    }
}

impl fmt::Debug for NamespaceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceRegistry")
            .field("namespaces", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::namespace::host::{NoHost, StaticLoader};

    fn fake_registry() -> NamespaceRegistry {
        NamespaceRegistry::new(Arc::new(NoHost))
    }

    #[test]
    fn test_resolve_creates_fake_chain() {
        let mut registry = fake_registry();
        let ns = registry.resolve_namespace("pkgA.sub").unwrap();

        assert!(ns.is_fake());
        assert_eq!(registry.names(), vec!["pkgA", "pkgA.sub"]);
        assert_eq!(
            registry.lookup("pkgA", "sub"),
            Some(&Binding::Namespace(ns.clone()))
        );
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let mut registry = fake_registry();
        let a = registry.resolve_namespace("x.y").unwrap();
        let b = registry.resolve_namespace("x.y").unwrap();
        assert_eq!(a, b);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_real_child_preferred_under_fake_parent() {
        let host = StaticLoader::builder()
            .module(HostModule::new("outer.inner").with_type("Thing"))
            .build();
        let mut registry = NamespaceRegistry::new(Arc::new(host));

        let inner = registry.resolve_namespace("outer.inner").unwrap();
        assert!(!inner.is_fake());
        assert!(registry.get("outer").unwrap().is_fake());
        assert!(matches!(
            registry.lookup("outer.inner", "Thing"),
            Some(Binding::Type(_))
        ));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let mut registry = fake_registry();
        assert!(registry.resolve_namespace("").is_err());
        assert!(registry.resolve_namespace("a..b").is_err());
        assert!(registry.resolve_namespace(".a").is_err());

        let parent = registry.resolve_namespace("a").unwrap();
        assert!(registry.get_or_create_child(&parent, "b.c").is_err());
        assert!(registry.get_or_create_child(&parent, "").is_err());
    }

    #[test]
    fn test_release_is_child_first() {
        let mut registry = fake_registry();
        registry.resolve_namespace("p.c.g").unwrap();
        assert_eq!(registry.len(), 3);

        assert!(registry.release("p"));
        assert!(registry.is_empty());
        assert!(!registry.release("p"));
    }

    #[test]
    fn test_release_detaches_from_parent() {
        let mut registry = fake_registry();
        registry.resolve_namespace("p.c").unwrap();

        registry.release("p.c");
        assert!(registry.contains("p"));
        assert!(registry.lookup("p", "c").is_none());
    }

    #[test]
    fn test_rebinding_fake_child_releases_it() {
        let mut registry = fake_registry();
        registry.resolve_namespace("p.c.g").unwrap();

        let ty = TypeHandle::placeholder(crate::types::PlaceholderType::new(
            "p",
            "c",
            crate::types::Recipe::DEFAULT,
            false,
        ));
        let previous = registry.bind("p", "c", Binding::Type(ty));

        assert!(matches!(previous, Some(Binding::Namespace(_))));
        assert!(!registry.contains("p.c"));
        assert!(!registry.contains("p.c.g"));
        assert!(registry.contains("p"));
    }

    #[test]
    fn test_mount_shadows_real_module() {
        let host = StaticLoader::builder()
            .module(HostModule::new("renpy").with_type("Real"))
            .build();
        let mut registry = NamespaceRegistry::new(Arc::new(host));

        assert!(!registry.resolve_namespace("renpy").unwrap().is_fake());

        let mounted = registry.mount_fake_package("renpy").unwrap();
        assert!(mounted.is_fake());
        assert!(registry.get("renpy").unwrap().is_mounted());
        assert!(registry.lookup("renpy", "Real").is_none());
    }

    #[test]
    fn test_release_reaches_child_shadowed_by_type() {
        let mut registry = fake_registry();
        registry.resolve_namespace("a").unwrap();
        let ty = TypeHandle::placeholder(crate::types::PlaceholderType::new(
            "a",
            "B",
            crate::types::Recipe::DEFAULT,
            false,
        ));
        registry.bind("a", "B", Binding::Type(ty));

        // `a.B` is registered but not bound: the type holds the name
        registry.resolve_namespace("a.B.c").unwrap();
        assert!(matches!(registry.lookup("a", "B"), Some(Binding::Type(_))));
        assert_eq!(registry.names(), vec!["a", "a.B", "a.B.c"]);

        assert!(registry.release("a"));
        assert!(registry.is_empty());
    }

    #[test]
    fn test_mount_serves_fake_submodules() {
        let host = StaticLoader::builder()
            .module(HostModule::new("renpy.ast").with_type("Node"))
            .build();
        let mut registry = NamespaceRegistry::new(Arc::new(host));
        registry.mount_fake_package("renpy").unwrap();

        let ast = registry.resolve_namespace("renpy.ast").unwrap();
        assert!(ast.is_fake());
        assert!(registry.lookup("renpy.ast", "Node").is_none());
        assert!(registry.is_under_mount("renpy.ast.deep"));
        assert!(!registry.is_under_mount("renpy"));
    }

    #[test]
    fn test_mount_replaces_registered_real_submodules() {
        let host = StaticLoader::builder()
            .module(HostModule::new("renpy.ast").with_type("Node"))
            .build();
        let mut registry = NamespaceRegistry::new(Arc::new(host));
        assert!(!registry.resolve_namespace("renpy.ast").unwrap().is_fake());

        registry.mount_fake_package("renpy").unwrap();
        assert_eq!(registry.names(), vec!["renpy"]);
        assert!(registry.resolve_namespace("renpy.ast").unwrap().is_fake());
    }

    #[test]
    fn test_released_mount_uses_host_again() {
        let host = StaticLoader::builder()
            .module(HostModule::new("renpy.ast").with_type("Node"))
            .build();
        let mut registry = NamespaceRegistry::new(Arc::new(host));
        registry.mount_fake_package("renpy").unwrap();
        registry.release("renpy");

        assert!(!registry.resolve_namespace("renpy.ast").unwrap().is_fake());
    }

    #[test]
    fn test_namespace_display() {
        let mut registry = fake_registry();
        let ns = registry.resolve_namespace("a.b").unwrap();
        assert_eq!(ns.to_string(), "<module 'a.b' (fake)>");
    }
}
