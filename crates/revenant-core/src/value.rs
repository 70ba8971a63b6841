//! Decoded value model
//!
//! `Value` is the vocabulary a decoder uses when it hands constructor
//! arguments and state payloads to the core. Object instances are shared
//! through [`ObjectRef`] so memoised references and cycles survive decoding.

use crate::object::Instance;
use crate::types::{Reconstruct, TypeHandle};
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::Arc;

/// A decoded value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The absent value
    None,

    /// Boolean
    Bool(bool),

    /// Integer
    Int(i64),

    /// Floating point number
    Float(f64),

    /// Text
    Str(String),

    /// Raw bytes
    Bytes(Vec<u8>),

    /// Immutable ordered sequence
    Tuple(Vec<Value>),

    /// Mutable ordered sequence
    List(Vec<Value>),

    /// Mapping, in decode order. Keys are not restricted to text.
    Dict(Vec<(Value, Value)>),

    /// Unordered collection
    Set(Vec<Value>),

    /// A type reference (real or placeholder)
    Type(TypeHandle),

    /// A reconstructed object instance
    Object(ObjectRef),
}

impl Value {
    /// Create a text value
    pub fn str(s: impl Into<String>) -> Self {
        Value::Str(s.into())
    }

    /// Create an attribute-mapping from `(name, value)` pairs
    pub fn attrs<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Dict(
            entries
                .into_iter()
                .map(|(k, v)| (Value::Str(k.into()), v))
                .collect(),
        )
    }

    /// Check if this is the absent value
    pub fn is_none(&self) -> bool {
        matches!(self, Value::None)
    }

    /// Check if this is a mapping whose keys are all text
    pub fn is_attribute_mapping(&self) -> bool {
        match self {
            Value::Dict(entries) => entries.iter().all(|(k, _)| matches!(k, Value::Str(_))),
            _ => false,
        }
    }

    /// Iterate an attribute-mapping as `(name, value)` pairs
    ///
    /// Returns `None` if this value is not an attribute-mapping.
    pub fn into_attribute_entries(self) -> Option<Vec<(String, Value)>> {
        if !self.is_attribute_mapping() {
            return None;
        }
        match self {
            Value::Dict(entries) => Some(
                entries
                    .into_iter()
                    .filter_map(|(k, v)| match k {
                        Value::Str(name) => Some((name, v)),
                        _ => None,
                    })
                    .collect(),
            ),
            _ => None,
        }
    }

    /// Borrow the text of a `Str` value
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Borrow the object handle of an `Object` value
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Value::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Get the value kind as a string
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "none",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::Tuple(_) => "tuple",
            Value::List(_) => "list",
            Value::Dict(_) => "dict",
            Value::Set(_) => "set",
            Value::Type(_) => "type",
            Value::Object(_) => "object",
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<ObjectRef> for Value {
    fn from(obj: ObjectRef) -> Self {
        Value::Object(obj)
    }
}

impl From<TypeHandle> for Value {
    fn from(ty: TypeHandle) -> Self {
        Value::Type(ty)
    }
}

/// Shared handle to a reconstructed instance
///
/// Equality is identity: two handles are equal only if they point at the
/// same instance.
///
/// Handles are reference counted, so a cyclic graph keeps itself alive
/// after the last outside handle is dropped. Call [`break_cycles`] on the
/// root of a decoded graph once it is no longer needed.
#[derive(Clone)]
pub struct ObjectRef(Arc<RwLock<Instance>>);

impl ObjectRef {
    /// Wrap a freshly constructed instance
    pub fn new(instance: Instance) -> Self {
        ObjectRef(Arc::new(RwLock::new(instance)))
    }

    /// Lock the instance for reading
    pub fn read(&self) -> RwLockReadGuard<'_, Instance> {
        self.0.read()
    }

    /// Lock the instance for writing
    pub fn write(&self) -> RwLockWriteGuard<'_, Instance> {
        self.0.write()
    }

    /// Type of the referenced instance
    pub fn type_handle(&self) -> TypeHandle {
        self.0.read().type_handle().clone()
    }

    /// Check whether two handles refer to the same instance
    pub fn ptr_eq(&self, other: &ObjectRef) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Stable address of the instance, usable as an identity key
    pub fn addr(&self) -> usize {
        Arc::as_ptr(&self.0) as *const () as usize
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

// Attributes may point back at this object, so never recurse into them.
impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0.try_read() {
            Some(instance) => write!(
                f,
                "ObjectRef({} @ {:#x})",
                instance.type_handle().qualified_name(),
                self.addr()
            ),
            None => write!(f, "ObjectRef(<locked> @ {:#x})", self.addr()),
        }
    }
}

/// Clear the attributes of every object reachable from `root`
///
/// Drops the references that form cycles so the graph can be freed. The
/// objects themselves stay valid but lose their attributes; text values
/// are kept.
pub fn break_cycles(root: &Value) {
    let mut seen: FxHashSet<usize> = FxHashSet::default();
    let mut pending: Vec<Value> = vec![root.clone()];

    while let Some(value) = pending.pop() {
        match value {
            Value::Tuple(items) | Value::List(items) | Value::Set(items) => pending.extend(items),
            Value::Dict(entries) => {
                for (key, value) in entries {
                    pending.push(key);
                    pending.push(value);
                }
            }
            Value::Object(obj) => {
                if seen.insert(obj.addr()) {
                    let attrs = obj.write().take_attrs();
                    pending.extend(attrs.into_values());
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_mapping_detection() {
        assert!(Value::attrs([("a", Value::Int(1))]).is_attribute_mapping());
        assert!(Value::Dict(vec![]).is_attribute_mapping());

        let mixed = Value::Dict(vec![
            (Value::str("a"), Value::Int(1)),
            (Value::Int(2), Value::Int(3)),
        ]);
        assert!(!mixed.is_attribute_mapping());
        assert!(mixed.into_attribute_entries().is_none());

        assert!(!Value::Tuple(vec![]).is_attribute_mapping());
    }

    #[test]
    fn test_into_attribute_entries() {
        let entries = Value::attrs([("x", Value::Int(5)), ("y", Value::str("z"))])
            .into_attribute_entries()
            .unwrap();
        assert_eq!(
            entries,
            vec![
                ("x".to_string(), Value::Int(5)),
                ("y".to_string(), Value::str("z"))
            ]
        );
    }

    #[test]
    fn test_value_conversions() {
        assert_eq!(Value::from(3i64), Value::Int(3));
        assert_eq!(Value::from("hi"), Value::str("hi"));
        assert_eq!(Value::from(true).type_name(), "bool");
        assert!(Value::None.is_none());
    }

    #[test]
    fn test_break_cycles_frees_graph() {
        use crate::types::{PlaceholderType, Recipe};

        let ty =
            TypeHandle::placeholder(PlaceholderType::new("graph", "Node", Recipe::DEFAULT, false));
        let a = ObjectRef::new(Instance::new(ty.clone()));
        let b = ObjectRef::new(Instance::new(ty));
        a.write().set("next", Value::Object(b.clone()));
        b.write().set("next", Value::Object(a.clone()));
        let all = Value::List(vec![Value::Object(a.clone()), Value::Object(b.clone())]);
        a.write().set("all", all);
        assert_eq!(Arc::strong_count(&a.0), 3);

        break_cycles(&Value::Object(a.clone()));

        assert_eq!(Arc::strong_count(&a.0), 1);
        assert_eq!(Arc::strong_count(&b.0), 1);
        assert_eq!(a.read().attr_count(), 0);
        assert_eq!(b.read().attr_count(), 0);
    }
}
