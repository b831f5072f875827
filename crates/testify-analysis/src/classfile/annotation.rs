//! Annotation values decoded from `Runtime*Annotations` attributes.

use super::types::TypeRef;

/// One annotation instance: its type and its explicitly written elements.
///
/// Default element values live on the annotation type's class file and are
/// not merged in.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Binary name of the annotation type.
    pub type_name: String,
    pub elements: Vec<(String, ElementValue)>,
    /// `RuntimeVisibleAnnotations` vs `RuntimeInvisibleAnnotations`.
    pub visible: bool,
}

/// An annotation element value (JVMS §4.7.16.1).
#[derive(Debug, Clone, PartialEq)]
pub enum ElementValue {
    Byte(i8),
    Char(char),
    Double(f64),
    Float(f32),
    Int(i32),
    Long(i64),
    Short(i16),
    Boolean(bool),
    String(String),
    Enum { type_name: String, constant: String },
    Class(TypeRef),
    Annotation(Box<Annotation>),
    Array(Vec<ElementValue>),
}

impl Annotation {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            elements: Vec::new(),
            visible: true,
        }
    }

    /// Builder: add an element.
    pub fn with(mut self, name: impl Into<String>, value: ElementValue) -> Self {
        self.elements.push((name.into(), value));
        self
    }

    /// Builder: mark as class-retention (invisible at run time).
    pub fn invisible(mut self) -> Self {
        self.visible = false;
        self
    }

    pub fn get(&self, name: &str) -> Option<&ElementValue> {
        self.elements
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// The conventional `value` element.
    pub fn value(&self) -> Option<&ElementValue> {
        self.get("value")
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            ElementValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            ElementValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Class names held by a `Class` element or an array of them.
    pub fn class_names(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            Some(ElementValue::Class(TypeRef::Class(c))) => vec![c.clone()],
            Some(ElementValue::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    ElementValue::Class(TypeRef::Class(c)) => Some(c.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Strings held by a `String` element or an array of them.
    pub fn strings(&self, name: &str) -> Vec<String> {
        match self.get(name) {
            Some(ElementValue::String(s)) => vec![s.clone()],
            Some(ElementValue::Array(items)) => items
                .iter()
                .filter_map(|v| match v {
                    ElementValue::String(s) => Some(s.clone()),
                    _ => None,
                })
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn is(&self, type_name: &str) -> bool {
        self.type_name == type_name
    }
}

impl ElementValue {
    /// Tag byte used in the class-file encoding.
    pub fn tag(&self) -> u8 {
        match self {
            Self::Byte(_) => b'B',
            Self::Char(_) => b'C',
            Self::Double(_) => b'D',
            Self::Float(_) => b'F',
            Self::Int(_) => b'I',
            Self::Long(_) => b'J',
            Self::Short(_) => b'S',
            Self::Boolean(_) => b'Z',
            Self::String(_) => b's',
            Self::Enum { .. } => b'e',
            Self::Class(_) => b'c',
            Self::Annotation(_) => b'@',
            Self::Array(_) => b'[',
        }
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(TypeRef::Class(name.into()))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }
}

/// Find the first annotation of the given type.
pub fn find<'a>(annotations: &'a [Annotation], type_name: &str) -> Option<&'a Annotation> {
    annotations.iter().find(|a| a.type_name == type_name)
}
