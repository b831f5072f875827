//! Class-file decoding.
//!
//! Decodes the constant pool, class header, fields, methods and the handful of
//! attributes analysis needs (`Signature`, annotations, `MethodParameters`).
//! `Code` and every debug attribute are skipped by length, so method bodies and
//! line tables never reach the visitors.

use std::io::Cursor;
use std::sync::Arc;

use byteorder::{BigEndian, ReadBytesExt};
use testify_core::errors::ClassFileError;

use super::annotation::{Annotation, ElementValue};
use super::constants::*;
use super::descriptor::parse_field_descriptor;
use super::types::{internal_to_binary, PrimitiveType, TypeRef};
use super::visitor::{ClassHeader, ClassVisitor};

/// A decoded constant-pool entry. Only the variants analysis reads keep data.
#[derive(Debug, Clone, PartialEq)]
enum Constant {
    Utf8(String),
    Integer(i32),
    Float(f32),
    Long(i64),
    Double(f64),
    Class(u16),
    /// Any other entry, or the unusable slot after a long/double.
    Other,
}

/// One `MethodParameters` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodParameter {
    pub name: Option<String>,
    pub access_flags: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    pub access_flags: u16,
    pub name: String,
    pub descriptor: String,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
    pub parameters: Vec<MethodParameter>,
    /// One list per parameter slot that the compiler recorded.
    pub parameter_annotations: Vec<Vec<Annotation>>,
}

/// A fully decoded class file.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassFile {
    pub minor_version: u16,
    pub major_version: u16,
    pub access_flags: u16,
    /// Binary name with dots.
    pub name: String,
    pub super_name: Option<String>,
    pub interfaces: Vec<String>,
    pub signature: Option<String>,
    pub annotations: Vec<Annotation>,
    pub fields: Vec<FieldInfo>,
    pub methods: Vec<MethodInfo>,
}

impl FieldInfo {
    pub fn new(access_flags: u16, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            access_flags,
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            annotations: Vec::new(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }

    pub fn is_synthetic(&self) -> bool {
        self.access_flags & ACC_SYNTHETIC != 0
    }
}

impl MethodInfo {
    pub fn new(access_flags: u16, name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            access_flags,
            name: name.into(),
            descriptor: descriptor.into(),
            signature: None,
            annotations: Vec::new(),
            parameters: Vec::new(),
            parameter_annotations: Vec::new(),
        }
    }

    pub fn with_signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn with_annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Record `MethodParameters` names.
    pub fn with_parameter_names<S: AsRef<str>>(mut self, names: &[S]) -> Self {
        self.parameters = names
            .iter()
            .map(|n| MethodParameter {
                name: Some(n.as_ref().to_string()),
                access_flags: 0,
            })
            .collect();
        self
    }

    /// Attach an annotation to parameter `index`, growing the table as needed.
    pub fn with_parameter_annotation(mut self, index: usize, annotation: Annotation) -> Self {
        if self.parameter_annotations.len() <= index {
            self.parameter_annotations.resize_with(index + 1, Vec::new);
        }
        self.parameter_annotations[index].push(annotation);
        self
    }

    pub fn is_constructor(&self) -> bool {
        self.name == CONSTRUCTOR_NAME
    }

    pub fn is_static(&self) -> bool {
        self.access_flags & ACC_STATIC != 0
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags & ACC_ABSTRACT != 0
    }

    /// Synthetic or bridge methods are compiler-generated.
    pub fn is_generated(&self) -> bool {
        self.access_flags & (ACC_SYNTHETIC | ACC_BRIDGE) != 0
    }
}

impl ClassFile {
    pub fn is_interface(&self) -> bool {
        self.access_flags & ACC_INTERFACE != 0
    }

    pub fn is_abstract(&self) -> bool {
        self.access_flags & ACC_ABSTRACT != 0
    }

    pub fn is_final(&self) -> bool {
        self.access_flags & ACC_FINAL != 0
    }

    pub fn is_annotation(&self) -> bool {
        self.access_flags & ACC_ANNOTATION != 0
    }

    pub fn field(&self, name: &str) -> Option<&FieldInfo> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodInfo> + 'a {
        self.methods.iter().filter(move |m| m.name == name)
    }

    pub fn constructors(&self) -> impl Iterator<Item = &MethodInfo> {
        self.methods.iter().filter(|m| m.is_constructor())
    }
}

/// Streams a decoded class file to a `ClassVisitor`.
#[derive(Debug, Clone)]
pub struct ClassReader {
    class: Arc<ClassFile>,
}

impl ClassReader {
    /// Decode class-file bytes.
    pub fn new(bytes: &[u8]) -> Result<Self, ClassFileError> {
        Ok(Self {
            class: Arc::new(parse(bytes)?),
        })
    }

    /// Wrap an already decoded (typically cached) class file.
    pub fn from_class_file(class: Arc<ClassFile>) -> Self {
        Self { class }
    }

    pub fn class_name(&self) -> &str {
        &self.class.name
    }

    pub fn class_file(&self) -> &Arc<ClassFile> {
        &self.class
    }

    /// Single pass: header, class annotations, fields, methods, end.
    /// Stops at the first visitor error.
    pub fn accept<V: ClassVisitor + ?Sized>(&self, visitor: &mut V) -> Result<(), V::Error> {
        let class = &self.class;
        visitor.visit_header(&ClassHeader {
            major_version: class.major_version,
            access_flags: class.access_flags,
            name: &class.name,
            super_name: class.super_name.as_deref(),
            interfaces: &class.interfaces,
            signature: class.signature.as_deref(),
        })?;
        for annotation in &class.annotations {
            visitor.visit_annotation(annotation)?;
        }
        for field in &class.fields {
            visitor.visit_field(field)?;
        }
        for method in &class.methods {
            visitor.visit_method(method)?;
        }
        visitor.visit_end()
    }
}

/// Decode a class file into its owned form.
pub fn parse(bytes: &[u8]) -> Result<ClassFile, ClassFileError> {
    let mut r = ByteReader::new(bytes);

    let magic = r.u32()?;
    if magic != MAGIC {
        return Err(ClassFileError::BadMagic { magic });
    }
    let minor_version = r.u16()?;
    let major_version = r.u16()?;
    let pool = ConstantPool::read(&mut r)?;

    let access_flags = r.u16()?;
    let name = pool.class_name(r.u16()?)?;
    let super_index = r.u16()?;
    let super_name = if super_index == 0 {
        None
    } else {
        Some(pool.class_name(super_index)?)
    };
    let interface_count = r.u16()?;
    let mut interfaces = Vec::with_capacity(interface_count as usize);
    for _ in 0..interface_count {
        interfaces.push(pool.class_name(r.u16()?)?);
    }

    let field_count = r.u16()?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        fields.push(read_field(&mut r, &pool)?);
    }

    let method_count = r.u16()?;
    let mut methods = Vec::with_capacity(method_count as usize);
    for _ in 0..method_count {
        methods.push(read_method(&mut r, &pool)?);
    }

    let mut attrs = MemberAttributes::default();
    read_attributes(&mut r, &pool, &mut attrs)?;

    Ok(ClassFile {
        minor_version,
        major_version,
        access_flags,
        name,
        super_name,
        interfaces,
        signature: attrs.signature,
        annotations: attrs.annotations,
        fields,
        methods,
    })
}

fn read_field(r: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<FieldInfo, ClassFileError> {
    let access_flags = r.u16()?;
    let name = pool.utf8(r.u16()?)?.to_string();
    let descriptor = pool.utf8(r.u16()?)?.to_string();
    let mut attrs = MemberAttributes::default();
    read_attributes(r, pool, &mut attrs)?;
    Ok(FieldInfo {
        access_flags,
        name,
        descriptor,
        signature: attrs.signature,
        annotations: attrs.annotations,
    })
}

fn read_method(r: &mut ByteReader<'_>, pool: &ConstantPool) -> Result<MethodInfo, ClassFileError> {
    let access_flags = r.u16()?;
    let name = pool.utf8(r.u16()?)?.to_string();
    let descriptor = pool.utf8(r.u16()?)?.to_string();
    let mut attrs = MemberAttributes::default();
    read_attributes(r, pool, &mut attrs)?;
    Ok(MethodInfo {
        access_flags,
        name,
        descriptor,
        signature: attrs.signature,
        annotations: attrs.annotations,
        parameters: attrs.parameters,
        parameter_annotations: attrs.parameter_annotations,
    })
}

#[derive(Default)]
struct MemberAttributes {
    signature: Option<String>,
    annotations: Vec<Annotation>,
    parameters: Vec<MethodParameter>,
    parameter_annotations: Vec<Vec<Annotation>>,
}

fn read_attributes(
    r: &mut ByteReader<'_>,
    pool: &ConstantPool,
    out: &mut MemberAttributes,
) -> Result<(), ClassFileError> {
    let count = r.u16()?;
    for _ in 0..count {
        let name = pool.utf8(r.u16()?)?;
        let length = r.u32()? as usize;
        let body = r.bytes(length)?;
        let mut a = ByteReader::new(body);
        match name {
            ATTR_SIGNATURE => {
                out.signature = Some(pool.utf8(a.u16()?)?.to_string());
            }
            ATTR_RUNTIME_VISIBLE_ANNOTATIONS | ATTR_RUNTIME_INVISIBLE_ANNOTATIONS => {
                let visible = name == ATTR_RUNTIME_VISIBLE_ANNOTATIONS;
                let n = a.u16()?;
                for _ in 0..n {
                    out.annotations.push(read_annotation(&mut a, pool, visible)?);
                }
            }
            ATTR_RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS
            | ATTR_RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS => {
                let visible = name == ATTR_RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS;
                let slots = a.u8()? as usize;
                if out.parameter_annotations.len() < slots {
                    out.parameter_annotations.resize_with(slots, Vec::new);
                }
                for slot in 0..slots {
                    let n = a.u16()?;
                    for _ in 0..n {
                        let annotation = read_annotation(&mut a, pool, visible)?;
                        out.parameter_annotations[slot].push(annotation);
                    }
                }
            }
            ATTR_METHOD_PARAMETERS => {
                let n = a.u8()?;
                for _ in 0..n {
                    let name_index = a.u16()?;
                    let access_flags = a.u16()?;
                    let name = if name_index == 0 {
                        None
                    } else {
                        Some(pool.utf8(name_index)?.to_string())
                    };
                    out.parameters.push(MethodParameter { name, access_flags });
                }
            }
            // Code, SourceFile, LineNumberTable, LocalVariableTable, Exceptions, ...
            _ => {}
        }
    }
    Ok(())
}

fn read_annotation(
    r: &mut ByteReader<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<Annotation, ClassFileError> {
    let type_name = annotation_type_name(pool.utf8(r.u16()?)?)?;
    let pairs = r.u16()?;
    let mut elements = Vec::with_capacity(pairs as usize);
    for _ in 0..pairs {
        let name = pool.utf8(r.u16()?)?.to_string();
        let value = read_element_value(r, pool, visible)?;
        elements.push((name, value));
    }
    Ok(Annotation {
        type_name,
        elements,
        visible,
    })
}

fn annotation_type_name(descriptor: &str) -> Result<String, ClassFileError> {
    match parse_field_descriptor(descriptor)? {
        TypeRef::Class(name) => Ok(name),
        other => Err(ClassFileError::InvalidDescriptor {
            descriptor: descriptor.to_string(),
            message: format!("annotation type must be a class, found {other}"),
        }),
    }
}

fn read_element_value(
    r: &mut ByteReader<'_>,
    pool: &ConstantPool,
    visible: bool,
) -> Result<ElementValue, ClassFileError> {
    let tag = r.u8()?;
    let value = match tag {
        b'B' => ElementValue::Byte(pool.integer(r.u16()?)? as i8),
        b'C' => {
            let index = r.u16()?;
            let code = pool.integer(index)? as u32;
            ElementValue::Char(char::from_u32(code).ok_or(ClassFileError::UnexpectedConstant {
                index,
                expected: "char code point",
            })?)
        }
        b'S' => ElementValue::Short(pool.integer(r.u16()?)? as i16),
        b'Z' => ElementValue::Boolean(pool.integer(r.u16()?)? != 0),
        b'I' => ElementValue::Int(pool.integer(r.u16()?)?),
        b'J' => ElementValue::Long(pool.long(r.u16()?)?),
        b'F' => ElementValue::Float(pool.float(r.u16()?)?),
        b'D' => ElementValue::Double(pool.double(r.u16()?)?),
        b's' => ElementValue::String(pool.utf8(r.u16()?)?.to_string()),
        b'e' => {
            let type_name = annotation_type_name(pool.utf8(r.u16()?)?)?;
            let constant = pool.utf8(r.u16()?)?.to_string();
            ElementValue::Enum {
                type_name,
                constant,
            }
        }
        b'c' => {
            let descriptor = pool.utf8(r.u16()?)?;
            if descriptor == "V" {
                ElementValue::Class(TypeRef::Primitive(PrimitiveType::Void))
            } else {
                ElementValue::Class(parse_field_descriptor(descriptor)?)
            }
        }
        b'@' => ElementValue::Annotation(Box::new(read_annotation(r, pool, visible)?)),
        b'[' => {
            let n = r.u16()?;
            let mut items = Vec::with_capacity(n as usize);
            for _ in 0..n {
                items.push(read_element_value(r, pool, visible)?);
            }
            ElementValue::Array(items)
        }
        other => return Err(ClassFileError::UnknownElementTag { tag: other as char }),
    };
    Ok(value)
}

struct ConstantPool {
    entries: Vec<Constant>,
}

impl ConstantPool {
    fn read(r: &mut ByteReader<'_>) -> Result<Self, ClassFileError> {
        let count = r.u16()?;
        // Index 0 is unused.
        let mut entries = vec![Constant::Other];
        let mut index: u16 = 1;
        while index < count {
            let offset = r.offset();
            let tag = r.u8()?;
            let constant = match tag {
                CONSTANT_UTF8 => {
                    let len = r.u16()? as usize;
                    let raw = r.bytes(len)?;
                    Constant::Utf8(
                        decode_modified_utf8(raw).ok_or(ClassFileError::InvalidUtf8 { index })?,
                    )
                }
                CONSTANT_INTEGER => Constant::Integer(r.i32()?),
                CONSTANT_FLOAT => Constant::Float(r.f32()?),
                CONSTANT_LONG => Constant::Long(r.i64()?),
                CONSTANT_DOUBLE => Constant::Double(r.f64()?),
                CONSTANT_CLASS => Constant::Class(r.u16()?),
                CONSTANT_STRING | CONSTANT_METHOD_TYPE | CONSTANT_MODULE | CONSTANT_PACKAGE => {
                    r.u16()?;
                    Constant::Other
                }
                CONSTANT_FIELDREF
                | CONSTANT_METHODREF
                | CONSTANT_INTERFACE_METHODREF
                | CONSTANT_NAME_AND_TYPE
                | CONSTANT_DYNAMIC
                | CONSTANT_INVOKE_DYNAMIC => {
                    r.u32()?;
                    Constant::Other
                }
                CONSTANT_METHOD_HANDLE => {
                    r.u8()?;
                    r.u16()?;
                    Constant::Other
                }
                other => return Err(ClassFileError::UnknownConstantTag { tag: other, offset }),
            };
            let wide = matches!(constant, Constant::Long(_) | Constant::Double(_));
            // A wide entry also claims the next slot, which must exist.
            if wide && count - index < 2 {
                return Err(ClassFileError::InvalidConstantIndex { index });
            }
            entries.push(constant);
            index += 1;
            if wide {
                entries.push(Constant::Other);
                index += 1;
            }
        }
        Ok(Self { entries })
    }

    fn get(&self, index: u16) -> Result<&Constant, ClassFileError> {
        if index == 0 {
            return Err(ClassFileError::InvalidConstantIndex { index });
        }
        self.entries
            .get(index as usize)
            .ok_or(ClassFileError::InvalidConstantIndex { index })
    }

    fn utf8(&self, index: u16) -> Result<&str, ClassFileError> {
        match self.get(index)? {
            Constant::Utf8(s) => Ok(s),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Utf8",
            }),
        }
    }

    fn class_name(&self, index: u16) -> Result<String, ClassFileError> {
        match self.get(index)? {
            Constant::Class(name_index) => Ok(internal_to_binary(self.utf8(*name_index)?)),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Class",
            }),
        }
    }

    fn integer(&self, index: u16) -> Result<i32, ClassFileError> {
        match self.get(index)? {
            Constant::Integer(v) => Ok(*v),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Integer",
            }),
        }
    }

    fn long(&self, index: u16) -> Result<i64, ClassFileError> {
        match self.get(index)? {
            Constant::Long(v) => Ok(*v),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Long",
            }),
        }
    }

    fn float(&self, index: u16) -> Result<f32, ClassFileError> {
        match self.get(index)? {
            Constant::Float(v) => Ok(*v),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Float",
            }),
        }
    }

    fn double(&self, index: u16) -> Result<f64, ClassFileError> {
        match self.get(index)? {
            Constant::Double(v) => Ok(*v),
            _ => Err(ClassFileError::UnexpectedConstant {
                index,
                expected: "Double",
            }),
        }
    }
}

/// Big-endian cursor that reports truncation as `UnexpectedEof`.
struct ByteReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

macro_rules! read_be {
    ($($name:ident => $method:ident -> $ty:ty, $size:expr;)*) => {
        $(
            fn $name(&mut self) -> Result<$ty, ClassFileError> {
                let offset = self.offset();
                self.cursor
                    .$method::<BigEndian>()
                    .map_err(|_| self.eof(offset, $size))
            }
        )*
    };
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(bytes),
        }
    }

    fn offset(&self) -> usize {
        self.cursor.position() as usize
    }

    fn eof(&self, offset: usize, needed: usize) -> ClassFileError {
        let available = self.cursor.get_ref().len().saturating_sub(offset);
        ClassFileError::UnexpectedEof {
            offset,
            needed: needed.saturating_sub(available),
        }
    }

    fn u8(&mut self) -> Result<u8, ClassFileError> {
        let offset = self.offset();
        self.cursor.read_u8().map_err(|_| self.eof(offset, 1))
    }

    read_be! {
        u16 => read_u16 -> u16, 2;
        u32 => read_u32 -> u32, 4;
        i32 => read_i32 -> i32, 4;
        i64 => read_i64 -> i64, 8;
        f32 => read_f32 -> f32, 4;
        f64 => read_f64 -> f64, 8;
    }

    fn bytes(&mut self, len: usize) -> Result<&'a [u8], ClassFileError> {
        let offset = self.offset();
        let data: &'a [u8] = *self.cursor.get_ref();
        let end = offset
            .checked_add(len)
            .filter(|end| *end <= data.len())
            .ok_or_else(|| self.eof(offset, len))?;
        self.cursor.set_position(end as u64);
        Ok(&data[offset..end])
    }
}

/// Decode the JVM's modified UTF-8 (JVMS §4.4.7): `0xC0 0x80` for NUL and
/// surrogate pairs encoded as two 3-byte sequences.
fn decode_modified_utf8(bytes: &[u8]) -> Option<String> {
    let mut units: Vec<u16> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b & 0x80 == 0 {
            if b == 0 {
                return None;
            }
            units.push(b as u16);
            i += 1;
        } else if b & 0xE0 == 0xC0 {
            let b2 = *bytes.get(i + 1)?;
            if b2 & 0xC0 != 0x80 {
                return None;
            }
            units.push((((b & 0x1F) as u16) << 6) | (b2 & 0x3F) as u16);
            i += 2;
        } else if b & 0xF0 == 0xE0 {
            let b2 = *bytes.get(i + 1)?;
            let b3 = *bytes.get(i + 2)?;
            if b2 & 0xC0 != 0x80 || b3 & 0xC0 != 0x80 {
                return None;
            }
            units.push((((b & 0x0F) as u16) << 12) | (((b2 & 0x3F) as u16) << 6) | (b3 & 0x3F) as u16);
            i += 3;
        } else {
            return None;
        }
    }
    String::from_utf16(&units).ok()
}

/// Encode a string as modified UTF-8.
pub(crate) fn encode_modified_utf8(s: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(s.len());
    for unit in s.encode_utf16() {
        match unit {
            0x0001..=0x007F => out.push(unit as u8),
            0x0000 | 0x0080..=0x07FF => {
                out.push(0xC0 | ((unit >> 6) & 0x1F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
            _ => {
                out.push(0xE0 | ((unit >> 12) & 0x0F) as u8);
                out.push(0x80 | ((unit >> 6) & 0x3F) as u8);
                out.push(0x80 | (unit & 0x3F) as u8);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn modified_utf8_handles_nul_and_supplementary() {
        let s = "a\u{0}b\u{1F600}é";
        let encoded = encode_modified_utf8(s);
        assert!(!encoded.contains(&0));
        assert_eq!(decode_modified_utf8(&encoded).as_deref(), Some(s));
    }

    #[test]
    fn rejects_bad_magic() {
        let err = parse(&[0xDE, 0xAD, 0xBE, 0xEF, 0, 0, 0, 52]).unwrap_err();
        assert_eq!(err, ClassFileError::BadMagic { magic: 0xDEAD_BEEF });
    }

    #[test]
    fn truncated_input_reports_offset() {
        let err = parse(&[0xCA, 0xFE, 0xBA, 0xBE, 0, 0]).unwrap_err();
        assert_eq!(
            err,
            ClassFileError::UnexpectedEof {
                offset: 6,
                needed: 2
            }
        );
    }
}
