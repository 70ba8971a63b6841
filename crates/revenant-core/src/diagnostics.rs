//! Non-fatal diagnostics
//!
//! Payloads the default recipes cannot interpret are kept on the instance
//! under a fallback attribute. Each such event is logged through the `log`
//! facade and recorded so callers can inspect it after a decode.

use std::fmt;

/// A recoverable problem encountered while reconstructing an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// The default constructor received arguments it cannot honour
    UnrecognizedConstructorArguments {
        /// Qualified name of the type
        type_name: String,
        /// Number of arguments received
        count: usize,
        /// Attribute the arguments were stored under
        attribute: String,
    },

    /// A state payload did not have a recognized shape
    UnrecognizedStateShape {
        /// Qualified name of the type
        type_name: String,
        /// Kind of the payload (`"list"`, `"int"`, ...)
        shape: &'static str,
        /// Attribute the payload was stored under
        attribute: String,
    },
}

impl Diagnostic {
    /// Qualified name of the type the diagnostic concerns
    pub fn type_name(&self) -> &str {
        match self {
            Diagnostic::UnrecognizedConstructorArguments { type_name, .. }
            | Diagnostic::UnrecognizedStateShape { type_name, .. } => type_name,
        }
    }

    /// Fallback attribute the payload was stored under
    pub fn attribute(&self) -> &str {
        match self {
            Diagnostic::UnrecognizedConstructorArguments { attribute, .. }
            | Diagnostic::UnrecognizedStateShape { attribute, .. } => attribute,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::UnrecognizedConstructorArguments {
                type_name,
                count,
                attribute,
            } => write!(
                f,
                "{} got {} constructor argument(s) but does not know how to handle them (kept in `{}`)",
                type_name, count, attribute
            ),
            Diagnostic::UnrecognizedStateShape {
                type_name,
                shape,
                attribute,
            } => write!(
                f,
                "{} instance got {} state but does not know how to handle it (kept in `{}`)",
                type_name, shape, attribute
            ),
        }
    }
}

/// Collected diagnostics for one session
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection
    pub fn new() -> Self {
        Self::default()
    }

    /// Log and record a diagnostic
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        log::warn!("{}", diagnostic);
        self.records.push(diagnostic);
    }

    /// Recorded diagnostics, in emission order
    pub fn records(&self) -> &[Diagnostic] {
        &self.records
    }

    /// Number of recorded diagnostics
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Take all recorded diagnostics, leaving the collection empty
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.records)
    }
}
