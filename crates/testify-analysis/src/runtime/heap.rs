//! Arena heap: objects addressed by `ObjectId`, field slots keyed by
//! (declaring class, field name).

use std::fmt;
use std::sync::Arc;

use testify_core::constants::STRING_CLASS;
use testify_core::types::collections::FxHashMap;

use crate::classfile::types::{PrimitiveType, TypeRef};

/// Handle to an object in a `Heap`. Handles are only meaningful for the heap
/// that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(u32);

impl ObjectId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How an object came to exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectOrigin {
    /// Constructed normally.
    Real,
    /// A mock with no behaviour beyond stubs.
    Fake,
    /// A spy that forwards unstubbed calls to `delegate`.
    Virtual { delegate: ObjectId },
}

/// A runtime value as stored in a field slot or passed as an argument.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Char(char),
    /// Every integral primitive (byte through long).
    Int(i64),
    /// `float` and `double`.
    Float(f64),
    Str(Arc<str>),
    Ref(ObjectId),
}

impl Value {
    pub fn str(s: &str) -> Self {
        Self::Str(Arc::from(s))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_object(&self) -> Option<ObjectId> {
        match self {
            Self::Ref(id) => Some(*id),
            _ => None,
        }
    }

    /// The zero value a fresh field of type `ty` holds.
    pub fn default_for(ty: &TypeRef) -> Self {
        match ty {
            TypeRef::Primitive(PrimitiveType::Boolean) => Self::Bool(false),
            TypeRef::Primitive(PrimitiveType::Char) => Self::Char('\0'),
            TypeRef::Primitive(PrimitiveType::Float | PrimitiveType::Double) => Self::Float(0.0),
            TypeRef::Primitive(PrimitiveType::Void) => Self::Null,
            TypeRef::Primitive(_) => Self::Int(0),
            TypeRef::Class(_) | TypeRef::Array(_) => Self::Null,
        }
    }

    /// Type label used in error messages.
    pub fn type_label(&self, heap: &Heap) -> String {
        match self {
            Self::Null => "null".to_string(),
            Self::Bool(_) => "boolean".to_string(),
            Self::Char(_) => "char".to_string(),
            Self::Int(_) => "long".to_string(),
            Self::Float(_) => "double".to_string(),
            Self::Str(_) => STRING_CLASS.to_string(),
            Self::Ref(id) => heap.object(*id).class_name().to_string(),
        }
    }
}

/// One heap object.
#[derive(Debug, Clone)]
pub struct Object {
    class_name: String,
    origin: ObjectOrigin,
    slots: FxHashMap<String, FxHashMap<String, Value>>,
}

impl Object {
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn origin(&self) -> ObjectOrigin {
        self.origin
    }

    pub fn is_mock(&self) -> bool {
        !matches!(self.origin, ObjectOrigin::Real)
    }

    /// The stored value, or `None` if the slot was never written.
    pub fn slot(&self, declaring_class: &str, name: &str) -> Option<&Value> {
        self.slots.get(declaring_class)?.get(name)
    }

    pub fn set_slot(&mut self, declaring_class: &str, name: &str, value: Value) {
        self.slots
            .entry(declaring_class.to_string())
            .or_default()
            .insert(name.to_string(), value);
    }

    /// Every written slot as `(declaring class, field name, value)`.
    pub fn slots(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.slots.iter().flat_map(|(class, fields)| {
            fields
                .iter()
                .map(move |(name, value)| (class.as_str(), name.as_str(), value))
        })
    }
}

/// Object arena. Objects are never freed; a heap lives as long as one test.
#[derive(Debug, Clone, Default)]
pub struct Heap {
    objects: Vec<Object>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, class_name: impl Into<String>, origin: ObjectOrigin) -> ObjectId {
        let id = ObjectId(self.objects.len() as u32);
        self.objects.push(Object {
            class_name: class_name.into(),
            origin,
            slots: FxHashMap::default(),
        });
        id
    }

    /// Copy every slot of `from` into `to`.
    pub fn copy_slots(&mut self, from: ObjectId, to: ObjectId) {
        let slots = self.object(from).slots.clone();
        self.object_mut(to).slots = slots;
    }

    /// # Panics
    /// Panics if `id` was not issued by this heap.
    pub fn object(&self, id: ObjectId) -> &Object {
        match self.objects.get(id.index()) {
            Some(obj) => obj,
            None => panic!("object handle {id} does not belong to this heap"),
        }
    }

    /// # Panics
    /// Panics if `id` was not issued by this heap.
    pub fn object_mut(&mut self, id: ObjectId) -> &mut Object {
        match self.objects.get_mut(id.index()) {
            Some(obj) => obj,
            None => panic!("object handle {id} does not belong to this heap"),
        }
    }

    pub fn try_object(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(id.index())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}
