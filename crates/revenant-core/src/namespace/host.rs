//! Host environment module loading
//!
//! The registry asks a [`ModuleLoader`] for the real module behind a name
//! before it falls back to a fake one. A failed load is ordinary control
//! flow, never an abort.

use crate::types::{RealType, Recipe, Reconstruct, TypeHandle};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use thiserror::Error;

/// Errors reported by a module loader
#[derive(Debug, Error)]
pub enum LoadError {
    /// No module with this name exists in the host environment
    #[error("No module named '{0}'")]
    NotFound(String),

    /// The module exists but could not be loaded
    #[error("Failed to load module '{module}': {reason}")]
    Failed {
        /// Module name
        module: String,
        /// Loader-specific reason
        reason: String,
    },
}

/// A real module supplied by the host environment
#[derive(Debug, Clone)]
pub struct HostModule {
    name: String,
    types: FxHashMap<String, TypeHandle>,
}

impl HostModule {
    /// Create an empty module
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            types: FxHashMap::default(),
        }
    }

    /// Add a type with the default recipe
    pub fn with_type(self, name: &str) -> Self {
        self.with_recipe(name, Recipe::DEFAULT)
    }

    /// Add a type with a specific recipe
    pub fn with_recipe(mut self, name: &str, recipe: Recipe) -> Self {
        let ty = RealType::with_recipe(self.name.clone(), name, recipe);
        self.types
            .insert(ty.name().to_string(), TypeHandle::resolved(ty));
        self
    }

    /// Module name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up an exported type
    pub fn get(&self, name: &str) -> Option<&TypeHandle> {
        self.types.get(name)
    }

    /// Iterate exported types
    pub fn types(&self) -> impl Iterator<Item = (&str, &TypeHandle)> {
        self.types.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// Source of real modules
pub trait ModuleLoader: Send + Sync {
    /// Load the module with the given qualified name
    fn load(&self, qualified_name: &str) -> Result<Arc<HostModule>, LoadError>;
}

/// Loader that resolves nothing: every namespace becomes fake
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHost;

impl ModuleLoader for NoHost {
    fn load(&self, qualified_name: &str) -> Result<Arc<HostModule>, LoadError> {
        Err(LoadError::NotFound(qualified_name.to_string()))
    }
}

/// Loader backed by modules registered up front
///
/// Built with [`StaticLoader::builder`].
#[derive(Debug, Clone, Default)]
pub struct StaticLoader {
    modules: FxHashMap<String, Arc<HostModule>>,
}

impl StaticLoader {
    /// Create a loader builder
    pub fn builder() -> StaticLoaderBuilder {
        StaticLoaderBuilder {
            modules: FxHashMap::default(),
        }
    }

    /// Number of registered modules
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if no modules are registered
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleLoader for StaticLoader {
    fn load(&self, qualified_name: &str) -> Result<Arc<HostModule>, LoadError> {
        self.modules
            .get(qualified_name)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(qualified_name.to_string()))
    }
}

/// Builder for StaticLoader
pub struct StaticLoaderBuilder {
    modules: FxHashMap<String, Arc<HostModule>>,
}

impl StaticLoaderBuilder {
    /// Register a module
    pub fn module(mut self, module: HostModule) -> Self {
        self.modules
            .insert(module.name().to_string(), Arc::new(module));
        self
    }

    /// Build the loader
    pub fn build(self) -> StaticLoader {
        StaticLoader {
            modules: self.modules,
        }
    }
}
