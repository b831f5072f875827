//! Class-file layer: type model, descriptor/signature parsing, reading, writing.

pub mod annotation;
pub mod constants;
pub mod descriptor;
pub mod reader;
pub mod types;
pub mod visitor;
pub mod writer;

pub use annotation::{Annotation, ElementValue};
pub use descriptor::{
    parse_class_signature, parse_field_descriptor, parse_field_signature,
    parse_method_descriptor, parse_method_signature, MethodSignature, MethodType,
};
pub use reader::{ClassFile, ClassReader, FieldInfo, MethodInfo, MethodParameter};
pub use types::{GenericType, PrimitiveType, TypeArgument, TypeRef};
pub use visitor::{ClassHeader, ClassVisitor};
pub use writer::ClassWriter;
