//! Decode sessions
//!
//! A [`Session`] is the context object a decoder talks to. It owns the
//! namespace registry for one decode, so independent decodes never share
//! or corrupt each other's fake module trees.

use crate::config::SessionOptions;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::namespace::{ModuleLoader, NamespaceHandle, NamespaceRegistry, NoHost};
use crate::object::Instance;
use crate::overrides::OverrideTable;
use crate::restore::{self, RestoreContext};
use crate::types::{Reconstruct, TypeHandle};
use crate::value::{ObjectRef, Value};
use crate::{resolver, Result};
use std::sync::Arc;

/// Extension points a stack-machine decoder calls into
pub trait DecodeHooks {
    /// Resolve a type reference found in the stream
    fn find_class(&mut self, module: &str, name: &str) -> Result<TypeHandle>;

    /// Construct an instance of a resolved type
    fn construct(&mut self, ty: &TypeHandle, args: Vec<Value>) -> Result<ObjectRef>;

    /// Apply a decoded state payload to a constructed instance
    fn apply_state(&mut self, obj: &ObjectRef, state: Value) -> Result<()>;
}

/// A stack-machine decoder driven against a set of hooks
pub trait Decoder {
    /// Decode one top-level value
    fn decode(&mut self, hooks: &mut dyn DecodeHooks) -> Result<Value>;
}

/// Per-decode resolution context
pub struct Session {
    registry: NamespaceRegistry,
    overrides: Arc<OverrideTable>,
    options: SessionOptions,
    diagnostics: Diagnostics,
}

impl Session {
    /// Create a session with default options and the built-in overrides
    pub fn new(host: Arc<dyn ModuleLoader>) -> Self {
        Self {
            registry: NamespaceRegistry::new(host),
            overrides: OverrideTable::builtin(),
            options: SessionOptions::default(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Create a session with no host modules: every namespace is fake
    pub fn offline() -> Self {
        Self::new(Arc::new(NoHost))
    }

    /// Create a session from options, mounting the configured fake packages
    pub fn with_options(host: Arc<dyn ModuleLoader>, options: SessionOptions) -> Result<Self> {
        options.validate()?;

        let overrides = if options.builtin_overrides {
            OverrideTable::builtin()
        } else {
            Arc::new(OverrideTable::new())
        };
        let mut session = Self {
            registry: NamespaceRegistry::new(host),
            overrides,
            options,
            diagnostics: Diagnostics::new(),
        };

        let packages = session.options.fake_packages.clone();
        for package in &packages {
            session.registry.mount_fake_package(package)?;
        }
        Ok(session)
    }

    /// Replace the override table
    pub fn with_overrides(mut self, overrides: Arc<OverrideTable>) -> Self {
        self.overrides = overrides;
        self
    }

    /// Resolve `namespace_name.type_name` to a real type or a placeholder
    pub fn resolve(&mut self, namespace_name: &str, type_name: &str) -> Result<TypeHandle> {
        resolver::resolve(&mut self.registry, &self.overrides, namespace_name, type_name)
    }

    /// Construct an instance of `ty` from decoder-supplied arguments
    pub fn construct(&mut self, ty: &TypeHandle, args: Vec<Value>) -> Result<ObjectRef> {
        let mut ctx = RestoreContext::new(&self.options, &mut self.diagnostics);
        let instance: Instance = ty.construct(args, &mut ctx)?;
        Ok(ObjectRef::new(instance))
    }

    /// Apply a decoded state payload to `obj`
    ///
    /// The instance's type decides the applier; custom appliers receive
    /// `state` unmodified.
    pub fn apply_state(&mut self, obj: &ObjectRef, state: Value) -> Result<()> {
        let mut ctx = RestoreContext::new(&self.options, &mut self.diagnostics);
        let mut instance = obj.write();
        let recipe = *instance.type_handle().recipe();
        restore::apply_state_with(&recipe, &mut instance, state, &mut ctx)
    }

    /// Run a decoder against this session
    pub fn load<D: Decoder + ?Sized>(&mut self, decoder: &mut D) -> Result<Value> {
        decoder.decode(self)
    }

    /// Mount a fake package for the rest of the session
    pub fn mount_fake_package(&mut self, name: &str) -> Result<NamespaceHandle> {
        self.registry.mount_fake_package(name)
    }

    /// Namespace registry
    pub fn registry(&self) -> &NamespaceRegistry {
        &self.registry
    }

    /// Mutable namespace registry
    pub fn registry_mut(&mut self) -> &mut NamespaceRegistry {
        &mut self.registry
    }

    /// Override table in use
    pub fn overrides(&self) -> &OverrideTable {
        &self.overrides
    }

    /// Session options
    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Diagnostics recorded so far
    pub fn diagnostics(&self) -> &[Diagnostic] {
        self.diagnostics.records()
    }

    /// Take the recorded diagnostics
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        self.diagnostics.drain()
    }
}

impl DecodeHooks for Session {
    fn find_class(&mut self, module: &str, name: &str) -> Result<TypeHandle> {
        self.resolve(module, name)
    }

    fn construct(&mut self, ty: &TypeHandle, args: Vec<Value>) -> Result<ObjectRef> {
        Session::construct(self, ty, args)
    }

    fn apply_state(&mut self, obj: &ObjectRef, state: Value) -> Result<()> {
        Session::apply_state(self, obj, state)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("registry", &self.registry)
            .field("overrides", &self.overrides.len())
            .field("options", &self.options)
            .field("diagnostics", &self.diagnostics.len())
            .finish()
    }
}
