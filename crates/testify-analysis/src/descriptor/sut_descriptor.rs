//! SutDescriptor: the SUT class as seen through one test's SUT field.

use std::fmt;
use std::sync::Arc;

use testify_core::errors::AnalysisError;

use super::constructor::ConstructorDescriptor;
use super::field::FieldDescriptor;
use super::index::MemberIndex;
use super::parameter::ParameterDescriptor;
use crate::classfile::constants::{ACC_ABSTRACT, ACC_FINAL, ACC_INTERFACE};
use crate::classfile::types::GenericType;
use crate::classpath::TypeHierarchy;

/// Immutable analysis result for one SUT field.
pub struct SutDescriptor {
    test_class: String,
    sut_field_name: String,
    sut_type: GenericType,
    sut_class: String,
    access_flags: u16,
    constructor: Option<ConstructorDescriptor>,
    parameters: MemberIndex<ParameterDescriptor>,
    fields: MemberIndex<FieldDescriptor>,
    hierarchy: Arc<dyn TypeHierarchy>,
}

impl SutDescriptor {
    pub fn test_class(&self) -> &str {
        &self.test_class
    }

    pub fn sut_field_name(&self) -> &str {
        &self.sut_field_name
    }

    /// Declared type of the SUT field.
    pub fn sut_type(&self) -> &GenericType {
        &self.sut_type
    }

    pub fn sut_class(&self) -> &str {
        &self.sut_class
    }

    pub fn access_flags(&self) -> u16 {
        self.access_flags
    }

    pub fn is_final(&self) -> bool {
        self.access_flags & ACC_FINAL != 0
    }

    /// Interfaces and abstract classes cannot be constructed directly.
    pub fn is_abstract(&self) -> bool {
        self.access_flags & (ACC_INTERFACE | ACC_ABSTRACT) != 0
    }

    /// The canonical constructor, absent for interfaces and abstract types.
    pub fn constructor(&self) -> Option<&ConstructorDescriptor> {
        self.constructor.as_ref()
    }

    pub fn parameter_descriptors(&self) -> &[ParameterDescriptor] {
        self.parameters.all()
    }

    pub fn find_parameter_descriptor(&self, ty: &GenericType) -> Option<&ParameterDescriptor> {
        self.parameters.find(ty, self.hierarchy.as_ref())
    }

    pub fn find_parameter_descriptor_named(&self, ty: &GenericType, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.find_named(ty, name)
    }

    pub fn field_descriptors(&self) -> &[FieldDescriptor] {
        self.fields.all()
    }

    pub fn find_field_descriptor(&self, ty: &GenericType) -> Option<&FieldDescriptor> {
        self.fields.find(ty, self.hierarchy.as_ref())
    }

    pub fn find_field_descriptor_named(&self, ty: &GenericType, name: &str) -> Option<&FieldDescriptor> {
        self.fields.find_named(ty, name)
    }

    pub fn hierarchy(&self) -> &Arc<dyn TypeHierarchy> {
        &self.hierarchy
    }
}

impl fmt::Debug for SutDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SutDescriptor")
            .field("test_class", &self.test_class)
            .field("sut_field", &self.sut_field_name)
            .field("sut_class", &self.sut_class)
            .field("constructor", &self.constructor)
            .field("parameters", &self.parameters.len())
            .field("fields", &self.fields.len())
            .finish()
    }
}

/// Mutable accumulator filled by the SUT class visitor.
pub struct SutDescriptorBuilder {
    test_class: String,
    sut_field_name: String,
    sut_type: GenericType,
    sut_class: String,
    access_flags: u16,
    constructor: Option<ConstructorDescriptor>,
    parameters: MemberIndex<ParameterDescriptor>,
    fields: MemberIndex<FieldDescriptor>,
    hierarchy: Arc<dyn TypeHierarchy>,
}

impl SutDescriptorBuilder {
    pub fn new(sut_field: &FieldDescriptor, hierarchy: Arc<dyn TypeHierarchy>) -> Self {
        let sut_class = sut_field
            .ty()
            .class_name()
            .unwrap_or_default()
            .to_string();
        Self {
            test_class: sut_field.declaring_class().to_string(),
            sut_field_name: sut_field.name().to_string(),
            sut_type: sut_field.generic_type().clone(),
            sut_class,
            access_flags: 0,
            constructor: None,
            parameters: MemberIndex::new(),
            fields: MemberIndex::new(),
            hierarchy,
        }
    }

    pub fn sut_class(&self) -> &str {
        &self.sut_class
    }

    pub fn set_access_flags(&mut self, flags: u16) {
        self.access_flags = flags;
    }

    pub fn set_constructor(&mut self, constructor: ConstructorDescriptor) {
        self.constructor = Some(constructor);
    }

    pub fn add_parameter(&mut self, parameter: ParameterDescriptor) {
        self.parameters.insert(parameter);
    }

    pub fn add_field(&mut self, field: FieldDescriptor) {
        self.fields.insert(field);
    }

    pub fn build(self) -> Result<SutDescriptor, AnalysisError> {
        let expected = self
            .constructor
            .as_ref()
            .map_or(0, ConstructorDescriptor::parameter_count);
        if expected != self.parameters.len() {
            return Err(AnalysisError::ConstructorNotFound {
                class: self.sut_class,
                descriptor: format!(
                    "expected {expected} parameter descriptors, recorded {}",
                    self.parameters.len()
                ),
            });
        }
        Ok(SutDescriptor {
            test_class: self.test_class,
            sut_field_name: self.sut_field_name,
            sut_type: self.sut_type,
            sut_class: self.sut_class,
            access_flags: self.access_flags,
            constructor: self.constructor,
            parameters: self.parameters,
            fields: self.fields,
            hierarchy: self.hierarchy,
        })
    }
}

impl fmt::Debug for SutDescriptorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SutDescriptorBuilder")
            .field("sut_class", &self.sut_class)
            .field("parameters", &self.parameters.len())
            .field("fields", &self.fields.len())
            .finish()
    }
}
