//! Special-case override table
//!
//! Maps qualified type names to reconstruction recipes for types whose
//! default handling is known to be wrong. The table is immutable once built.

use crate::types::{BaseRepr, Constructor, Recipe, StateApplier};
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Qualified name of the text-valued expression type
pub const PY_EXPR: &str = "renpy.ast.PyExpr";

/// Qualified name of the compiled-code holder type
pub const PY_CODE: &str = "renpy.ast.PyCode";

const PY_EXPR_FIELDS: &[&str] = &["filename", "linenumber"];

// (version, source, location, mode); the version is not kept
const PY_CODE_SLOTS: &[Option<&str>] = &[None, Some("source"), Some("location"), Some("mode")];

const PY_CODE_RESET: &[&str] = &["bytecode"];

static BUILTIN: Lazy<Arc<OverrideTable>> = Lazy::new(|| {
    Arc::new(
        OverrideTable::builder()
            // Behaves as immutable text carrying where it came from
            .register(
                PY_EXPR,
                Recipe::with_base(BaseRepr::Text)
                    .constructor(Constructor::TextWithFields(PY_EXPR_FIELDS)),
            )
            // Serialized as an ordered tuple instead of an attribute mapping
            .register(
                PY_CODE,
                Recipe::DEFAULT.state(StateApplier::OrderedSlots {
                    slots: PY_CODE_SLOTS,
                    reset: PY_CODE_RESET,
                }),
            )
            .build(),
    )
});

/// One override entry
#[derive(Debug, Clone)]
pub struct SpecialCase {
    /// Qualified type name the entry applies to
    pub qualified_name: String,
    /// Recipe replacing the default one
    pub recipe: Recipe,
}

/// Immutable table of special cases keyed by qualified name
#[derive(Debug, Clone, Default)]
pub struct OverrideTable {
    entries: FxHashMap<String, SpecialCase>,
}

impl OverrideTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table builder
    pub fn builder() -> OverrideTableBuilder {
        OverrideTableBuilder {
            entries: FxHashMap::default(),
        }
    }

    /// Create a builder pre-populated with this table's entries
    pub fn extend(&self) -> OverrideTableBuilder {
        OverrideTableBuilder {
            entries: self.entries.clone(),
        }
    }

    /// The built-in table, shared process-wide
    pub fn builtin() -> Arc<OverrideTable> {
        Arc::clone(&BUILTIN)
    }

    /// Look up the entry for a qualified name
    pub fn lookup(&self, qualified_name: &str) -> Option<&SpecialCase> {
        self.entries.get(qualified_name)
    }

    /// Check if a qualified name has an entry
    pub fn contains(&self, qualified_name: &str) -> bool {
        self.entries.contains_key(qualified_name)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Builder for OverrideTable
pub struct OverrideTableBuilder {
    entries: FxHashMap<String, SpecialCase>,
}

impl OverrideTableBuilder {
    /// Register a recipe for a qualified name, replacing any earlier entry
    pub fn register(mut self, qualified_name: &str, recipe: Recipe) -> Self {
        self.entries.insert(
            qualified_name.to_string(),
            SpecialCase {
                qualified_name: qualified_name.to_string(),
                recipe,
            },
        );
        self
    }

    /// Register a recipe on a different base representation with default behaviour
    pub fn register_base(self, qualified_name: &str, base: BaseRepr) -> Self {
        self.register(qualified_name, Recipe::with_base(base))
    }

    /// Build the table
    pub fn build(self) -> OverrideTable {
        OverrideTable {
            entries: self.entries,
        }
    }
}
