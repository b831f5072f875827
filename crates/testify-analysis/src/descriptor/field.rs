//! FieldDescriptor: a field member plus reflective-style access.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use testify_core::errors::AnalysisError;

use super::index::IndexedMember;
use super::key::DescriptorKey;
use super::{class_file_error, name_override};
use crate::classfile::annotation::{self, Annotation};
use crate::classfile::constants::{ACC_FINAL, ACC_STATIC};
use crate::classfile::descriptor::{parse_field_descriptor, parse_field_signature};
use crate::classfile::reader::FieldInfo;
use crate::classfile::types::{GenericType, TypeRef};
use crate::classpath::TypeHierarchy;
use crate::runtime::{ObjectId, ObjectOrigin, Runtime, Value};

#[derive(Debug)]
struct FieldMember {
    declaring_class: String,
    name: String,
    declared_name: String,
    ty: TypeRef,
    generic_type: GenericType,
    /// Access flags with `ACC_FINAL` removed.
    access_flags: u16,
    was_final: bool,
    annotations: Vec<Annotation>,
    index: usize,
}

/// A field of a test or SUT class.
///
/// Cheap to clone. Equality and hashing cover the member identity only
/// (declaring class and raw name).
#[derive(Clone)]
pub struct FieldDescriptor {
    member: Arc<FieldMember>,
}

impl FieldDescriptor {
    /// Build from a decoded field. `index` is the declaration position and
    /// `name_marker` the name-override annotation type.
    pub fn from_field_info(
        declaring_class: &str,
        field: &FieldInfo,
        index: usize,
        name_marker: &str,
    ) -> Result<Self, AnalysisError> {
        let ty = parse_field_descriptor(&field.descriptor)
            .map_err(|e| class_file_error(declaring_class, e))?;
        let generic_type = match &field.signature {
            Some(sig) => {
                parse_field_signature(sig).map_err(|e| class_file_error(declaring_class, e))?
            }
            None => GenericType::from(&ty),
        };
        let declared_name =
            name_override(&field.annotations, name_marker).unwrap_or_else(|| field.name.clone());

        Ok(Self {
            member: Arc::new(FieldMember {
                declaring_class: declaring_class.to_string(),
                name: field.name.clone(),
                declared_name,
                ty,
                generic_type,
                access_flags: field.access_flags & !ACC_FINAL,
                was_final: field.access_flags & ACC_FINAL != 0,
                annotations: field.annotations.clone(),
                index,
            }),
        })
    }

    pub fn declaring_class(&self) -> &str {
        &self.member.declaring_class
    }

    /// The raw field name as compiled.
    pub fn name(&self) -> &str {
        &self.member.name
    }

    /// The name-override value when present and non-empty, else the raw name.
    pub fn declared_name(&self) -> &str {
        &self.member.declared_name
    }

    pub fn ty(&self) -> &TypeRef {
        &self.member.ty
    }

    pub fn generic_type(&self) -> &GenericType {
        &self.member.generic_type
    }

    pub fn access_flags(&self) -> u16 {
        self.member.access_flags
    }

    /// Whether the field was declared `final` before analysis made it writable.
    pub fn was_final(&self) -> bool {
        self.member.was_final
    }

    pub fn is_static(&self) -> bool {
        self.member.access_flags & ACC_STATIC != 0
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.member.annotations
    }

    pub fn annotation(&self, type_name: &str) -> Option<&Annotation> {
        annotation::find(&self.member.annotations, type_name)
    }

    pub fn has_annotation(&self, type_name: &str) -> bool {
        self.annotation(type_name).is_some()
    }

    /// Declaration position within the declaring class.
    pub fn index(&self) -> usize {
        self.member.index
    }

    pub fn key(&self) -> DescriptorKey {
        DescriptorKey::of(self.member.generic_type.clone())
    }

    pub fn named_key(&self) -> DescriptorKey {
        DescriptorKey::of_named(self.member.generic_type.clone(), self.member.declared_name.clone())
    }

    fn check_instance(&self, runtime: &Runtime, instance: ObjectId) -> Result<(), AnalysisError> {
        let actual = runtime.heap().object(instance).class_name();
        if runtime
            .class_path()
            .is_subclass_of(actual, &self.member.declaring_class)
        {
            Ok(())
        } else {
            Err(AnalysisError::IncompatibleInstance {
                member: self.member.name.clone(),
                declaring_class: self.member.declaring_class.clone(),
                actual_class: actual.to_string(),
            })
        }
    }

    /// Read the field from `instance`. Unwritten slots read as the type default.
    /// On a virtual the slot is read from its delegate.
    ///
    /// # Panics
    /// Panics if `instance` was not issued by the runtime's heap.
    pub fn get_value(&self, runtime: &Runtime, instance: ObjectId) -> Result<Value, AnalysisError> {
        self.check_instance(runtime, instance)?;
        let value = runtime
            .heap()
            .object(runtime.slot_owner(instance))
            .slot(&self.member.declaring_class, &self.member.name)
            .cloned()
            .unwrap_or_else(|| Value::default_for(&self.member.ty));
        Ok(value)
    }

    /// Write the field on `instance`. Final fields are writable. On a virtual
    /// the value is also written to its delegate.
    ///
    /// # Panics
    /// Panics if `instance` or a referenced object was not issued by the
    /// runtime's heap.
    pub fn set_value(
        &self,
        runtime: &mut Runtime,
        instance: ObjectId,
        value: Value,
    ) -> Result<(), AnalysisError> {
        self.check_instance(runtime, instance)?;
        if !runtime.value_fits(&self.member.ty, &value) {
            return Err(AnalysisError::IncompatibleValue {
                field: self.member.name.clone(),
                declaring_class: self.member.declaring_class.clone(),
                expected: self.member.ty.to_string(),
                actual: value.type_label(runtime.heap()),
            });
        }
        // Write through a virtual to every delegate beneath it.
        let mut target = instance;
        loop {
            let object = runtime.heap_mut().object_mut(target);
            object.set_slot(&self.member.declaring_class, &self.member.name, value.clone());
            match object.origin() {
                ObjectOrigin::Virtual { delegate } => target = delegate,
                _ => break,
            }
        }
        Ok(())
    }
}

impl IndexedMember for FieldDescriptor {
    fn generic_type(&self) -> &GenericType {
        &self.member.generic_type
    }

    fn declared_name(&self) -> &str {
        &self.member.declared_name
    }
}

impl PartialEq for FieldDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.member.declaring_class == other.member.declaring_class
            && self.member.name == other.member.name
    }
}

impl Eq for FieldDescriptor {}

impl Hash for FieldDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.member.declaring_class.hash(state);
        self.member.name.hash(state);
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("declaring_class", &self.member.declaring_class)
            .field("name", &self.member.name)
            .field("declared_name", &self.member.declared_name)
            .field("type", &self.member.generic_type.to_string())
            .finish()
    }
}

impl fmt::Display for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.member.declaring_class, self.member.name)
    }
}
