//! Revenant Core
//!
//! Restores object graphs from stack-machine serialized data when the type
//! definitions referenced by the stream are not available. This crate
//! provides:
//! - A per-session namespace registry that grows fake modules on demand
//! - A table of special-case reconstruction recipes
//! - Placeholder type synthesis with name-based identity
//! - The type resolver and state restorer a decoder calls into

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod diagnostics;
pub mod dump;
pub mod namespace;
pub mod object;
pub mod overrides;
pub mod resolver;
pub mod restore;
pub mod session;
pub mod synth;
pub mod types;
pub mod value;

pub use config::SessionOptions;
pub use diagnostics::{Diagnostic, Diagnostics};
pub use namespace::{
    Binding, HostModule, LoadError, ModuleLoader, Namespace, NamespaceHandle, NamespaceKind,
    NamespaceRegistry, NoHost, StaticLoader,
};
pub use object::Instance;
pub use overrides::{OverrideTable, SpecialCase};
pub use session::{DecodeHooks, Decoder, Session};
pub use types::{
    BaseRepr, Constructor, PlaceholderType, RealType, Recipe, Reconstruct, StateApplier,
    TypeHandle,
};
pub use value::{break_cycles, ObjectRef, Value};

/// Errors surfaced by the core
///
/// Unresolvable names and unrecognized payload shapes are not errors; they
/// degrade to placeholders and fallback attributes instead.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A namespace or type name is empty or has an empty dotted segment
    #[error("Invalid name: {0:?}")]
    InvalidName(String),

    /// A recipe constructor received the wrong number of arguments
    #[error("{type_name} takes {expected} constructor arguments, got {got}")]
    ConstructorArity {
        /// Qualified name of the type being constructed
        type_name: String,
        /// Number of arguments the recipe expects
        expected: usize,
        /// Number of arguments supplied
        got: usize,
    },

    /// A recipe constructor received an argument of the wrong shape
    #[error("Bad constructor argument for {type_name}: {reason}")]
    ConstructorArgument {
        /// Qualified name of the type being constructed
        type_name: String,
        /// What was wrong with the argument
        reason: String,
    },

    /// Invalid session configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O failure while reading configuration
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failure reported by an external decoder
    #[error("Decode error: {0}")]
    Decode(String),
}

/// Result type used throughout the core
pub type Result<T> = std::result::Result<T, Error>;
