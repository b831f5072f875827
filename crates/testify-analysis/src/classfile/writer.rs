//! ClassWriter: emits class files for fixtures and tests.
//!
//! Produces structurally valid class files with the attributes the reader
//! understands. Method bodies are a single `return` instruction plus a line
//! table; they exist so the reader's attribute skipping is exercised, not to be
//! run by a JVM.

use byteorder::{BigEndian, ByteOrder};
use testify_core::constants::OBJECT_CLASS;
use testify_core::types::collections::FxHashMap;

use super::annotation::{Annotation, ElementValue};
use super::constants::*;
use super::reader::{encode_modified_utf8, FieldInfo, MethodInfo};
use super::types::{binary_to_internal, TypeRef};

/// Builder for one class file.
#[derive(Debug, Clone)]
pub struct ClassWriter {
    major_version: u16,
    access_flags: u16,
    name: String,
    super_name: Option<String>,
    interfaces: Vec<String>,
    signature: Option<String>,
    source_file: Option<String>,
    annotations: Vec<Annotation>,
    fields: Vec<FieldInfo>,
    methods: Vec<MethodInfo>,
}

impl ClassWriter {
    /// A public class extending `java.lang.Object`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            major_version: DEFAULT_MAJOR_VERSION,
            access_flags: ACC_PUBLIC | ACC_SUPER,
            name: name.into(),
            super_name: Some(OBJECT_CLASS.to_string()),
            interfaces: Vec::new(),
            signature: None,
            source_file: None,
            annotations: Vec::new(),
            fields: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// A public interface.
    pub fn interface(name: impl Into<String>) -> Self {
        Self::new(name).access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT)
    }

    /// A public annotation type.
    pub fn annotation_type(name: impl Into<String>) -> Self {
        Self::new(name)
            .access(ACC_PUBLIC | ACC_INTERFACE | ACC_ABSTRACT | ACC_ANNOTATION)
            .implements("java.lang.annotation.Annotation")
    }

    pub fn access(mut self, flags: u16) -> Self {
        self.access_flags = flags;
        self
    }

    pub fn super_class(mut self, name: impl Into<String>) -> Self {
        self.super_name = Some(name.into());
        self
    }

    pub fn implements(mut self, name: impl Into<String>) -> Self {
        self.interfaces.push(name.into());
        self
    }

    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    pub fn source_file(mut self, file: impl Into<String>) -> Self {
        self.source_file = Some(file.into());
        self
    }

    pub fn annotation(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    pub fn field(mut self, field: FieldInfo) -> Self {
        self.fields.push(field);
        self
    }

    pub fn method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serialize to class-file bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut pool = PoolBuilder::default();
        let mut body = Vec::new();

        put_u16(&mut body, self.access_flags);
        put_u16(&mut body, pool.class(&self.name));
        let super_index = self.super_name.as_deref().map_or(0, |s| pool.class(s));
        put_u16(&mut body, super_index);
        put_u16(&mut body, self.interfaces.len() as u16);
        for iface in &self.interfaces {
            put_u16(&mut body, pool.class(iface));
        }

        put_u16(&mut body, self.fields.len() as u16);
        for field in &self.fields {
            put_u16(&mut body, field.access_flags);
            put_u16(&mut body, pool.utf8(&field.name));
            put_u16(&mut body, pool.utf8(&field.descriptor));
            let mut attrs = AttributeList::default();
            attrs.signature(&mut pool, field.signature.as_deref());
            attrs.annotations(&mut pool, &field.annotations);
            attrs.write(&mut body);
        }

        put_u16(&mut body, self.methods.len() as u16);
        for method in &self.methods {
            put_u16(&mut body, method.access_flags);
            put_u16(&mut body, pool.utf8(&method.name));
            put_u16(&mut body, pool.utf8(&method.descriptor));
            let mut attrs = AttributeList::default();
            if method.access_flags & (ACC_ABSTRACT | ACC_NATIVE) == 0 {
                attrs.placeholder_code(&mut pool);
            }
            attrs.signature(&mut pool, method.signature.as_deref());
            attrs.annotations(&mut pool, &method.annotations);
            attrs.parameter_annotations(&mut pool, &method.parameter_annotations);
            attrs.method_parameters(&mut pool, method);
            attrs.write(&mut body);
        }

        let mut attrs = AttributeList::default();
        if let Some(file) = &self.source_file {
            let index = pool.utf8(file);
            let mut data = Vec::new();
            put_u16(&mut data, index);
            attrs.push(&mut pool, ATTR_SOURCE_FILE, data);
        }
        attrs.signature(&mut pool, self.signature.as_deref());
        attrs.annotations(&mut pool, &self.annotations);
        attrs.write(&mut body);

        let mut out = Vec::with_capacity(10 + pool.bytes.len() + body.len());
        put_u32(&mut out, MAGIC);
        put_u16(&mut out, 0);
        put_u16(&mut out, self.major_version);
        put_u16(&mut out, pool.next_index);
        out.extend_from_slice(&pool.bytes);
        out.extend_from_slice(&body);
        out
    }
}

fn put_u16(out: &mut Vec<u8>, v: u16) {
    let mut buf = [0u8; 2];
    BigEndian::write_u16(&mut buf, v);
    out.extend_from_slice(&buf);
}

fn put_u32(out: &mut Vec<u8>, v: u32) {
    let mut buf = [0u8; 4];
    BigEndian::write_u32(&mut buf, v);
    out.extend_from_slice(&buf);
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum PoolKey {
    Utf8(String),
    Class(String),
    Integer(i32),
    Float(u32),
    Long(i64),
    Double(u64),
}

/// Deduplicating constant-pool builder.
struct PoolBuilder {
    bytes: Vec<u8>,
    next_index: u16,
    index: FxHashMap<PoolKey, u16>,
}

impl Default for PoolBuilder {
    fn default() -> Self {
        Self {
            bytes: Vec::new(),
            next_index: 1,
            index: FxHashMap::default(),
        }
    }
}

impl PoolBuilder {
    fn intern(&mut self, key: PoolKey, encode: impl FnOnce(&mut Self) -> Vec<u8>) -> u16 {
        if let Some(&i) = self.index.get(&key) {
            return i;
        }
        let encoded = encode(self);
        let slot = self.next_index;
        let wide = matches!(key, PoolKey::Long(_) | PoolKey::Double(_));
        self.next_index += if wide { 2 } else { 1 };
        self.bytes.extend_from_slice(&encoded);
        self.index.insert(key, slot);
        slot
    }

    fn utf8(&mut self, s: &str) -> u16 {
        self.intern(PoolKey::Utf8(s.to_string()), |_| {
            let raw = encode_modified_utf8(s);
            let mut out = vec![CONSTANT_UTF8];
            put_u16(&mut out, raw.len() as u16);
            out.extend_from_slice(&raw);
            out
        })
    }

    /// `name` is a binary name; it is stored in internal form.
    fn class(&mut self, name: &str) -> u16 {
        let internal = binary_to_internal(name);
        self.intern(PoolKey::Class(internal.clone()), |pool| {
            let name_index = pool.utf8(&internal);
            let mut out = vec![CONSTANT_CLASS];
            put_u16(&mut out, name_index);
            out
        })
    }

    fn integer(&mut self, v: i32) -> u16 {
        self.intern(PoolKey::Integer(v), |_| {
            let mut out = vec![CONSTANT_INTEGER];
            put_u32(&mut out, v as u32);
            out
        })
    }

    fn float(&mut self, v: f32) -> u16 {
        self.intern(PoolKey::Float(v.to_bits()), |_| {
            let mut out = vec![CONSTANT_FLOAT];
            put_u32(&mut out, v.to_bits());
            out
        })
    }

    fn long(&mut self, v: i64) -> u16 {
        self.intern(PoolKey::Long(v), |_| {
            let mut out = vec![CONSTANT_LONG, 0, 0, 0, 0, 0, 0, 0, 0];
            BigEndian::write_i64(&mut out[1..], v);
            out
        })
    }

    fn double(&mut self, v: f64) -> u16 {
        self.intern(PoolKey::Double(v.to_bits()), |_| {
            let mut out = vec![CONSTANT_DOUBLE, 0, 0, 0, 0, 0, 0, 0, 0];
            BigEndian::write_f64(&mut out[1..], v);
            out
        })
    }
}

#[derive(Default)]
struct AttributeList {
    count: u16,
    bytes: Vec<u8>,
}

impl AttributeList {
    fn push(&mut self, pool: &mut PoolBuilder, name: &str, data: Vec<u8>) {
        put_u16(&mut self.bytes, pool.utf8(name));
        put_u32(&mut self.bytes, data.len() as u32);
        self.bytes.extend_from_slice(&data);
        self.count += 1;
    }

    fn write(self, out: &mut Vec<u8>) {
        put_u16(out, self.count);
        out.extend_from_slice(&self.bytes);
    }

    fn signature(&mut self, pool: &mut PoolBuilder, signature: Option<&str>) {
        if let Some(sig) = signature {
            let mut data = Vec::new();
            put_u16(&mut data, pool.utf8(sig));
            self.push(pool, ATTR_SIGNATURE, data);
        }
    }

    fn annotations(&mut self, pool: &mut PoolBuilder, annotations: &[Annotation]) {
        for (visible, attr) in [
            (true, ATTR_RUNTIME_VISIBLE_ANNOTATIONS),
            (false, ATTR_RUNTIME_INVISIBLE_ANNOTATIONS),
        ] {
            let selected: Vec<_> = annotations.iter().filter(|a| a.visible == visible).collect();
            if selected.is_empty() {
                continue;
            }
            let mut data = Vec::new();
            put_u16(&mut data, selected.len() as u16);
            for a in selected {
                write_annotation(&mut data, pool, a);
            }
            self.push(pool, attr, data);
        }
    }

    fn parameter_annotations(&mut self, pool: &mut PoolBuilder, slots: &[Vec<Annotation>]) {
        if slots.is_empty() {
            return;
        }
        for (visible, attr) in [
            (true, ATTR_RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS),
            (false, ATTR_RUNTIME_INVISIBLE_PARAMETER_ANNOTATIONS),
        ] {
            if !slots.iter().flatten().any(|a| a.visible == visible) {
                continue;
            }
            let mut data = vec![slots.len() as u8];
            for slot in slots {
                let selected: Vec<_> = slot.iter().filter(|a| a.visible == visible).collect();
                put_u16(&mut data, selected.len() as u16);
                for a in selected {
                    write_annotation(&mut data, pool, a);
                }
            }
            self.push(pool, attr, data);
        }
    }

    fn method_parameters(&mut self, pool: &mut PoolBuilder, method: &MethodInfo) {
        if method.parameters.is_empty() {
            return;
        }
        let mut data = vec![method.parameters.len() as u8];
        for p in &method.parameters {
            let index = p.name.as_deref().map_or(0, |n| pool.utf8(n));
            put_u16(&mut data, index);
            put_u16(&mut data, p.access_flags);
        }
        self.push(pool, ATTR_METHOD_PARAMETERS, data);
    }

    /// `Code` with a lone `return` and a one-entry `LineNumberTable`.
    fn placeholder_code(&mut self, pool: &mut PoolBuilder) {
        let line_table_name = pool.utf8(ATTR_LINE_NUMBER_TABLE);
        let mut data = Vec::new();
        put_u16(&mut data, 1); // max_stack
        put_u16(&mut data, 255); // max_locals
        put_u32(&mut data, 1);
        data.push(0xB1); // return
        put_u16(&mut data, 0); // exception table
        put_u16(&mut data, 1);
        put_u16(&mut data, line_table_name);
        put_u32(&mut data, 6);
        put_u16(&mut data, 1);
        put_u16(&mut data, 0);
        put_u16(&mut data, 1);
        self.push(pool, ATTR_CODE, data);
    }
}

fn write_annotation(out: &mut Vec<u8>, pool: &mut PoolBuilder, annotation: &Annotation) {
    let descriptor = TypeRef::Class(annotation.type_name.clone()).descriptor();
    put_u16(out, pool.utf8(&descriptor));
    put_u16(out, annotation.elements.len() as u16);
    for (name, value) in &annotation.elements {
        put_u16(out, pool.utf8(name));
        write_element_value(out, pool, value);
    }
}

fn write_element_value(out: &mut Vec<u8>, pool: &mut PoolBuilder, value: &ElementValue) {
    out.push(value.tag());
    match value {
        ElementValue::Byte(v) => put_u16(out, pool.integer(*v as i32)),
        ElementValue::Char(c) => put_u16(out, pool.integer(*c as i32)),
        ElementValue::Short(v) => put_u16(out, pool.integer(*v as i32)),
        ElementValue::Boolean(b) => put_u16(out, pool.integer(*b as i32)),
        ElementValue::Int(v) => put_u16(out, pool.integer(*v)),
        ElementValue::Long(v) => put_u16(out, pool.long(*v)),
        ElementValue::Float(v) => put_u16(out, pool.float(*v)),
        ElementValue::Double(v) => put_u16(out, pool.double(*v)),
        ElementValue::String(s) => put_u16(out, pool.utf8(s)),
        ElementValue::Enum {
            type_name,
            constant,
        } => {
            let descriptor = TypeRef::Class(type_name.clone()).descriptor();
            put_u16(out, pool.utf8(&descriptor));
            put_u16(out, pool.utf8(constant));
        }
        ElementValue::Class(ty) => {
            let descriptor = ty.descriptor();
            put_u16(out, pool.utf8(&descriptor));
        }
        ElementValue::Annotation(inner) => write_annotation(out, pool, inner),
        ElementValue::Array(items) => {
            put_u16(out, items.len() as u16);
            for item in items {
                write_element_value(out, pool, item);
            }
        }
    }
}
