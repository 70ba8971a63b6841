//! Reconstructed object instances

use crate::types::{BaseRepr, Reconstruct, TypeHandle};
use crate::value::Value;
use rustc_hash::FxHashMap;

/// An instance of a real or placeholder type
///
/// Text-based types (see [`BaseRepr::Text`]) carry their text value next to
/// the attribute set.
#[derive(Debug, Clone)]
pub struct Instance {
    ty: TypeHandle,
    text: Option<String>,
    attrs: FxHashMap<String, Value>,
}

impl Instance {
    /// Create an empty instance using the base representation of `ty`
    pub fn new(ty: TypeHandle) -> Self {
        let text = match ty.recipe().base {
            BaseRepr::Object => None,
            BaseRepr::Text => Some(String::new()),
        };
        Self {
            ty,
            text,
            attrs: FxHashMap::default(),
        }
    }

    /// Create a text-based instance holding `text`
    pub fn with_text(ty: TypeHandle, text: impl Into<String>) -> Self {
        Self {
            ty,
            text: Some(text.into()),
            attrs: FxHashMap::default(),
        }
    }

    /// Type this instance was constructed from
    pub fn type_handle(&self) -> &TypeHandle {
        &self.ty
    }

    /// Qualified name of the instance's type
    pub fn type_name(&self) -> &str {
        self.ty.qualified_name()
    }

    /// Text value, for text-based instances
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    /// Get an attribute
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attrs.get(name)
    }

    /// Set an attribute, returning the previous value
    pub fn set(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.attrs.insert(name.into(), value)
    }

    /// Remove an attribute
    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.attrs.remove(name)
    }

    /// Check whether an attribute is set
    pub fn has(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }

    /// Merge `(name, value)` pairs into the attribute set, overwriting on collision
    pub fn merge<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.attrs.extend(entries);
    }

    /// All attributes
    pub fn attrs(&self) -> &FxHashMap<String, Value> {
        &self.attrs
    }

    /// Remove and return all attributes
    pub fn take_attrs(&mut self) -> FxHashMap<String, Value> {
        std::mem::take(&mut self.attrs)
    }

    /// Number of attributes
    pub fn attr_count(&self) -> usize {
        self.attrs.len()
    }
}
