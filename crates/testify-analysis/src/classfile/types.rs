//! JVM type model: erased types from descriptors, generic types from signatures.

use std::fmt;

use testify_core::constants::OBJECT_CLASS;

/// A JVM primitive type, including `void` for method returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Boolean,
    Byte,
    Char,
    Short,
    Int,
    Long,
    Float,
    Double,
    Void,
}

impl PrimitiveType {
    /// Map a descriptor character (`I`, `Z`, ...) to a primitive.
    pub fn from_descriptor_char(c: u8) -> Option<Self> {
        match c {
            b'Z' => Some(Self::Boolean),
            b'B' => Some(Self::Byte),
            b'C' => Some(Self::Char),
            b'S' => Some(Self::Short),
            b'I' => Some(Self::Int),
            b'J' => Some(Self::Long),
            b'F' => Some(Self::Float),
            b'D' => Some(Self::Double),
            b'V' => Some(Self::Void),
            _ => None,
        }
    }

    pub fn descriptor_char(self) -> char {
        match self {
            Self::Boolean => 'Z',
            Self::Byte => 'B',
            Self::Char => 'C',
            Self::Short => 'S',
            Self::Int => 'I',
            Self::Long => 'J',
            Self::Float => 'F',
            Self::Double => 'D',
            Self::Void => 'V',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Byte => "byte",
            Self::Char => "char",
            Self::Short => "short",
            Self::Int => "int",
            Self::Long => "long",
            Self::Float => "float",
            Self::Double => "double",
            Self::Void => "void",
        }
    }

    /// Name of the wrapper class used when the primitive is boxed.
    pub fn boxed_class(self) -> Option<&'static str> {
        match self {
            Self::Boolean => Some("java.lang.Boolean"),
            Self::Byte => Some("java.lang.Byte"),
            Self::Char => Some("java.lang.Character"),
            Self::Short => Some("java.lang.Short"),
            Self::Int => Some("java.lang.Integer"),
            Self::Long => Some("java.lang.Long"),
            Self::Float => Some("java.lang.Float"),
            Self::Double => Some("java.lang.Double"),
            Self::Void => None,
        }
    }
}

/// An erased JVM type as written in a field or method descriptor.
///
/// Class names are binary names with dots (`com.acme.Outer$Inner`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    Primitive(PrimitiveType),
    Class(String),
    Array(Box<TypeRef>),
}

impl TypeRef {
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    pub fn object() -> Self {
        Self::Class(OBJECT_CLASS.to_string())
    }

    pub fn array_of(component: TypeRef) -> Self {
        Self::Array(Box::new(component))
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Self::Primitive(PrimitiveType::Void))
    }

    /// True for non-void primitives.
    pub fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(p) if *p != PrimitiveType::Void)
    }

    /// True for class and array types.
    pub fn is_reference(&self) -> bool {
        !matches!(self, Self::Primitive(_))
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            Self::Class(name) => Some(name),
            _ => None,
        }
    }

    /// The JVM descriptor form (`I`, `Ljava/lang/String;`, `[J`).
    pub fn descriptor(&self) -> String {
        let mut out = String::new();
        self.write_descriptor(&mut out);
        out
    }

    pub(crate) fn write_descriptor(&self, out: &mut String) {
        match self {
            Self::Primitive(p) => out.push(p.descriptor_char()),
            Self::Class(name) => {
                out.push('L');
                out.push_str(&binary_to_internal(name));
                out.push(';');
            }
            Self::Array(component) => {
                out.push('[');
                component.write_descriptor(out);
            }
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.name()),
            Self::Class(name) => f.write_str(name),
            Self::Array(component) => write!(f, "{component}[]"),
        }
    }
}

/// A type argument inside a parameterized type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeArgument {
    Exact(GenericType),
    Extends(GenericType),
    Super(GenericType),
    /// The unbounded wildcard `?`.
    Any,
}

impl fmt::Display for TypeArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(t) => write!(f, "{t}"),
            Self::Extends(t) => write!(f, "? extends {t}"),
            Self::Super(t) => write!(f, "? super {t}"),
            Self::Any => f.write_str("?"),
        }
    }
}

/// A possibly parameterized type recovered from a `Signature` attribute.
///
/// Members without a signature get the generic form of their erased type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GenericType {
    Primitive(PrimitiveType),
    Class {
        name: String,
        arguments: Vec<TypeArgument>,
    },
    Array(Box<GenericType>),
    /// A type variable such as `T`.
    Variable(String),
}

impl GenericType {
    /// A raw (non-parameterized) class type.
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class {
            name: name.into(),
            arguments: Vec::new(),
        }
    }

    /// A class type with exact type arguments.
    pub fn parameterized(name: impl Into<String>, arguments: Vec<GenericType>) -> Self {
        Self::Class {
            name: name.into(),
            arguments: arguments.into_iter().map(TypeArgument::Exact).collect(),
        }
    }

    /// Erase to the descriptor type. Type variables erase to `java.lang.Object`.
    pub fn erasure(&self) -> TypeRef {
        match self {
            Self::Primitive(p) => TypeRef::Primitive(*p),
            Self::Class { name, .. } => TypeRef::Class(name.clone()),
            Self::Array(component) => TypeRef::Array(Box::new(component.erasure())),
            Self::Variable(_) => TypeRef::object(),
        }
    }

    pub fn raw_class_name(&self) -> Option<&str> {
        match self {
            Self::Class { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn arguments(&self) -> &[TypeArgument] {
        match self {
            Self::Class { arguments, .. } => arguments,
            _ => &[],
        }
    }

    pub fn is_parameterized(&self) -> bool {
        !self.arguments().is_empty()
    }
}

impl From<TypeRef> for GenericType {
    fn from(ty: TypeRef) -> Self {
        match ty {
            TypeRef::Primitive(p) => Self::Primitive(p),
            TypeRef::Class(name) => Self::class(name),
            TypeRef::Array(component) => Self::Array(Box::new(GenericType::from(*component))),
        }
    }
}

impl From<&TypeRef> for GenericType {
    fn from(ty: &TypeRef) -> Self {
        GenericType::from(ty.clone())
    }
}

impl fmt::Display for GenericType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => f.write_str(p.name()),
            Self::Class { name, arguments } => {
                f.write_str(name)?;
                if !arguments.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in arguments.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
            Self::Array(component) => write!(f, "{component}[]"),
            Self::Variable(name) => f.write_str(name),
        }
    }
}

/// `com/acme/Foo` -> `com.acme.Foo`.
pub fn internal_to_binary(internal: &str) -> String {
    internal.replace('/', ".")
}

/// `com.acme.Foo` -> `com/acme/Foo`.
pub fn binary_to_internal(binary: &str) -> String {
    binary.replace('.', "/")
}

/// The simple (unqualified) part of a binary class name.
pub fn simple_name(binary: &str) -> &str {
    let start = binary
        .rfind(['.', '$'])
        .map(|i| i + 1)
        .unwrap_or(0);
    &binary[start..]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn erasure_drops_arguments_and_variables() {
        let list = GenericType::parameterized("java.util.List", vec![GenericType::class("com.acme.Foo")]);
        assert_eq!(list.erasure(), TypeRef::class("java.util.List"));
        assert_eq!(GenericType::Variable("T".into()).erasure(), TypeRef::object());
    }

    #[test]
    fn display_uses_source_syntax() {
        let map = GenericType::Class {
            name: "java.util.Map".into(),
            arguments: vec![
                TypeArgument::Exact(GenericType::class("java.lang.String")),
                TypeArgument::Extends(GenericType::class("java.lang.Number")),
            ],
        };
        assert_eq!(map.to_string(), "java.util.Map<java.lang.String, ? extends java.lang.Number>");
        assert_eq!(TypeRef::array_of(TypeRef::Primitive(PrimitiveType::Int)).to_string(), "int[]");
    }

    #[test]
    fn descriptor_round_trips_through_type_ref() {
        let ty = TypeRef::array_of(TypeRef::class("com.acme.Outer$Inner"));
        assert_eq!(ty.descriptor(), "[Lcom/acme/Outer$Inner;");
    }

    #[test]
    fn simple_name_handles_nested_classes() {
        assert_eq!(simple_name("com.acme.Outer$Inner"), "Inner");
        assert_eq!(simple_name("Plain"), "Plain");
    }
}
