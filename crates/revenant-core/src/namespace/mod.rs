//! Namespace registry and host module loading

pub mod host;
pub mod registry;

pub use host::{HostModule, LoadError, ModuleLoader, NoHost, StaticLoader, StaticLoaderBuilder};
pub use registry::{validate_name, Binding, Namespace, NamespaceHandle, NamespaceKind, NamespaceRegistry};
