//! Reconstruction recipes
//!
//! Instead of minting a runtime type per name, every type carries one of a
//! small closed set of recipes. Special cases pick a different recipe from
//! the override table; everything else gets [`Recipe::DEFAULT`].

use crate::object::Instance;
use crate::restore::RestoreContext;
use crate::types::TypeHandle;
use crate::value::Value;
use crate::Result;
use std::fmt;

/// Custom constructor: builds an instance of the given type from the
/// decoder-supplied arguments
pub type ConstructFn = fn(&TypeHandle, Vec<Value>, &mut RestoreContext<'_>) -> Result<Instance>;

/// Custom state applier: receives the raw decoded state, unmodified
pub type ApplyStateFn = fn(&mut Instance, Value, &mut RestoreContext<'_>) -> Result<()>;

/// Base representation of instances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BaseRepr {
    /// Opaque object with an attribute set
    Object,
    /// Immutable text value with an attribute set
    Text,
}

/// How instances are constructed
#[derive(Clone, Copy)]
pub enum Constructor {
    /// Zero construction of the base representation. Unexpected arguments
    /// are kept under the fallback attribute.
    Default,

    /// Text value followed by named fields: arguments are
    /// `(text, field_0, field_1, ...)`
    TextWithFields(&'static [&'static str]),

    /// Named custom constructor
    Custom {
        /// Recipe name, for diagnostics
        name: &'static str,
        /// Constructor implementation
        func: ConstructFn,
    },
}

/// How decoded state is applied to instances
#[derive(Clone, Copy)]
pub enum StateApplier {
    /// Attribute-mapping merge, accepting `(state, slotstate)` pairs
    Mapping,

    /// Fixed-size ordered sequence whose elements map to named fields
    OrderedSlots {
        /// Field name per position; `None` discards the element
        slots: &'static [Option<&'static str>],
        /// Fields reset to `Value::None` on every application
        reset: &'static [&'static str],
    },

    /// Named custom applier
    Custom {
        /// Recipe name, for diagnostics
        name: &'static str,
        /// Applier implementation
        func: ApplyStateFn,
    },
}

/// Complete reconstruction recipe for a type
#[derive(Debug, Clone, Copy)]
pub struct Recipe {
    /// Base representation
    pub base: BaseRepr,
    /// Construction behaviour
    pub constructor: Constructor,
    /// State application behaviour
    pub state: StateApplier,
}

impl Recipe {
    /// Generic object with default construction and mapping state
    pub const DEFAULT: Recipe = Recipe {
        base: BaseRepr::Object,
        constructor: Constructor::Default,
        state: StateApplier::Mapping,
    };

    /// Default recipe on a different base representation
    pub const fn with_base(base: BaseRepr) -> Self {
        Recipe {
            base,
            constructor: Constructor::Default,
            state: StateApplier::Mapping,
        }
    }

    /// Replace the constructor
    pub const fn constructor(mut self, constructor: Constructor) -> Self {
        self.constructor = constructor;
        self
    }

    /// Replace the state applier
    pub const fn state(mut self, state: StateApplier) -> Self {
        self.state = state;
        self
    }

    /// Check whether both constructor and state applier are the defaults
    pub fn is_default(&self) -> bool {
        matches!(self.constructor, Constructor::Default)
            && matches!(self.state, StateApplier::Mapping)
    }
}

impl Default for Recipe {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl Constructor {
    /// Short name used in logs and debug output
    pub fn name(&self) -> &'static str {
        match self {
            Constructor::Default => "default",
            Constructor::TextWithFields(_) => "text-with-fields",
            Constructor::Custom { name, .. } => *name,
        }
    }
}

impl StateApplier {
    /// Short name used in logs and debug output
    pub fn name(&self) -> &'static str {
        match self {
            StateApplier::Mapping => "mapping",
            StateApplier::OrderedSlots { .. } => "ordered-slots",
            StateApplier::Custom { name, .. } => *name,
        }
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constructor::TextWithFields(fields) => {
                f.debug_tuple("TextWithFields").field(fields).finish()
            }
            other => write!(f, "Constructor({})", other.name()),
        }
    }
}

impl fmt::Debug for StateApplier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateApplier::OrderedSlots { slots, reset } => f
                .debug_struct("OrderedSlots")
                .field("slots", slots)
                .field("reset", reset)
                .finish(),
            other => write!(f, "StateApplier({})", other.name()),
        }
    }
}
