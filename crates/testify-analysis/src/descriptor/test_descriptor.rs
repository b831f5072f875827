//! TestDescriptor: everything recovered from a test class.

use std::fmt;
use std::sync::Arc;

use testify_core::errors::AnalysisError;

use super::field::FieldDescriptor;
use super::index::MemberIndex;
use super::method::MethodDescriptor;
use super::type_matches;
use crate::classfile::annotation::Annotation;
use crate::classfile::types::GenericType;
use crate::classpath::TypeHierarchy;

/// Immutable analysis result for one test class.
pub struct TestDescriptor {
    test_class: String,
    sut_field: Option<FieldDescriptor>,
    fields: MemberIndex<FieldDescriptor>,
    config_handlers: Vec<MethodDescriptor>,
    collaborator_providers: Vec<MethodDescriptor>,
    annotations: Vec<Annotation>,
    application: Option<Annotation>,
    modules: Vec<Annotation>,
    scans: Vec<Annotation>,
    local_resources: Vec<Annotation>,
    virtual_resources: Vec<Annotation>,
    remote_resources: Vec<Annotation>,
    guidelines: Vec<String>,
    hierarchy: Arc<dyn TypeHierarchy>,
}

impl TestDescriptor {
    pub fn builder(test_class: impl Into<String>, hierarchy: Arc<dyn TypeHierarchy>) -> TestDescriptorBuilder {
        TestDescriptorBuilder::new(test_class, hierarchy)
    }

    pub fn test_class(&self) -> &str {
        &self.test_class
    }

    pub fn sut_field(&self) -> Option<&FieldDescriptor> {
        self.sut_field.as_ref()
    }

    /// Non-SUT fields in declaration order.
    pub fn field_descriptors(&self) -> &[FieldDescriptor] {
        self.fields.all()
    }

    pub fn field_index(&self) -> &MemberIndex<FieldDescriptor> {
        &self.fields
    }

    pub fn find_field_descriptor(&self, ty: &GenericType) -> Option<&FieldDescriptor> {
        self.fields.find(ty, self.hierarchy.as_ref())
    }

    pub fn find_field_descriptor_named(&self, ty: &GenericType, name: &str) -> Option<&FieldDescriptor> {
        self.fields.find_named(ty, name)
    }

    pub fn config_handlers(&self) -> &[MethodDescriptor] {
        &self.config_handlers
    }

    /// First config handler whose single parameter matches `parameter_type`.
    pub fn find_config_handler(&self, parameter_type: &GenericType) -> Option<&MethodDescriptor> {
        self.config_handlers.iter().find(|m| {
            matches!(m.generic_parameter_types(), [only] if type_matches(parameter_type, only))
        })
    }

    pub fn collaborator_providers(&self) -> &[MethodDescriptor] {
        &self.collaborator_providers
    }

    /// First provider whose return type matches and, when `name` is given,
    /// whose declared name equals it.
    pub fn find_collaborator_provider(
        &self,
        return_type: &GenericType,
        name: Option<&str>,
    ) -> Option<&MethodDescriptor> {
        self.collaborator_providers.iter().find(|m| {
            type_matches(return_type, m.generic_return_type())
                && name.map_or(true, |n| m.declared_name() == n)
        })
    }

    /// Class-level annotations after bundle expansion, in visit order.
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    pub fn application(&self) -> Option<&Annotation> {
        self.application.as_ref()
    }

    pub fn modules(&self) -> &[Annotation] {
        &self.modules
    }

    pub fn scans(&self) -> &[Annotation] {
        &self.scans
    }

    pub fn local_resources(&self) -> &[Annotation] {
        &self.local_resources
    }

    pub fn virtual_resources(&self) -> &[Annotation] {
        &self.virtual_resources
    }

    pub fn remote_resources(&self) -> &[Annotation] {
        &self.remote_resources
    }

    /// Guideline marker type names present on the class.
    pub fn guidelines(&self) -> &[String] {
        &self.guidelines
    }

    pub fn has_guideline(&self, type_name: &str) -> bool {
        self.guidelines.iter().any(|g| g == type_name)
    }

    pub fn hierarchy(&self) -> &Arc<dyn TypeHierarchy> {
        &self.hierarchy
    }
}

impl fmt::Debug for TestDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDescriptor")
            .field("test_class", &self.test_class)
            .field("sut_field", &self.sut_field.as_ref().map(|s| s.name()))
            .field("fields", &self.fields.len())
            .field("config_handlers", &self.config_handlers.len())
            .field("collaborator_providers", &self.collaborator_providers.len())
            .field("modules", &self.modules.len())
            .field("guidelines", &self.guidelines)
            .finish()
    }
}

/// Mutable accumulator filled by the test class visitor and the inspectors.
pub struct TestDescriptorBuilder {
    test_class: String,
    sut_candidates: Vec<FieldDescriptor>,
    fields: MemberIndex<FieldDescriptor>,
    config_handlers: Vec<MethodDescriptor>,
    collaborator_providers: Vec<MethodDescriptor>,
    annotations: Vec<Annotation>,
    application: Option<Annotation>,
    modules: Vec<Annotation>,
    scans: Vec<Annotation>,
    local_resources: Vec<Annotation>,
    virtual_resources: Vec<Annotation>,
    remote_resources: Vec<Annotation>,
    guidelines: Vec<String>,
    hierarchy: Arc<dyn TypeHierarchy>,
}

impl TestDescriptorBuilder {
    pub fn new(test_class: impl Into<String>, hierarchy: Arc<dyn TypeHierarchy>) -> Self {
        Self {
            test_class: test_class.into(),
            sut_candidates: Vec::new(),
            fields: MemberIndex::new(),
            config_handlers: Vec::new(),
            collaborator_providers: Vec::new(),
            annotations: Vec::new(),
            application: None,
            modules: Vec::new(),
            scans: Vec::new(),
            local_resources: Vec::new(),
            virtual_resources: Vec::new(),
            remote_resources: Vec::new(),
            guidelines: Vec::new(),
            hierarchy,
        }
    }

    pub fn test_class(&self) -> &str {
        &self.test_class
    }

    pub fn add_field(&mut self, field: FieldDescriptor) {
        self.fields.insert(field);
    }

    pub fn add_sut_candidate(&mut self, field: FieldDescriptor) {
        self.sut_candidates.push(field);
    }

    pub fn add_config_handler(&mut self, method: MethodDescriptor) {
        self.config_handlers.push(method);
    }

    pub fn add_collaborator_provider(&mut self, method: MethodDescriptor) {
        self.collaborator_providers.push(method);
    }

    pub fn add_annotation(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Record the application annotation. The first one seen wins.
    pub fn set_application(&mut self, annotation: Annotation) {
        if let Some(existing) = &self.application {
            tracing::warn!(
                test_class = %self.test_class,
                kept = %existing.type_name,
                "multiple application annotations; keeping first"
            );
            return;
        }
        self.application = Some(annotation);
    }

    pub fn add_module(&mut self, annotation: Annotation) {
        self.modules.push(annotation);
    }

    pub fn add_scan(&mut self, annotation: Annotation) {
        self.scans.push(annotation);
    }

    pub fn add_local_resource(&mut self, annotation: Annotation) {
        self.local_resources.push(annotation);
    }

    pub fn add_virtual_resource(&mut self, annotation: Annotation) {
        self.virtual_resources.push(annotation);
    }

    pub fn add_remote_resource(&mut self, annotation: Annotation) {
        self.remote_resources.push(annotation);
    }

    pub fn add_guideline(&mut self, type_name: impl Into<String>) {
        let type_name = type_name.into();
        if !self.guidelines.contains(&type_name) {
            self.guidelines.push(type_name);
        }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    /// Freeze into a descriptor. Fails when more than one SUT field exists.
    pub fn build(mut self) -> Result<TestDescriptor, AnalysisError> {
        if self.sut_candidates.len() > 1 {
            return Err(AnalysisError::MultipleSutFields {
                test_class: self.test_class,
                fields: self
                    .sut_candidates
                    .iter()
                    .map(|f| f.name().to_string())
                    .collect(),
            });
        }
        Ok(TestDescriptor {
            test_class: self.test_class,
            sut_field: self.sut_candidates.pop(),
            fields: self.fields,
            config_handlers: self.config_handlers,
            collaborator_providers: self.collaborator_providers,
            annotations: self.annotations,
            application: self.application,
            modules: self.modules,
            scans: self.scans,
            local_resources: self.local_resources,
            virtual_resources: self.virtual_resources,
            remote_resources: self.remote_resources,
            guidelines: self.guidelines,
            hierarchy: self.hierarchy,
        })
    }
}

impl fmt::Debug for TestDescriptorBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestDescriptorBuilder")
            .field("test_class", &self.test_class)
            .field("sut_candidates", &self.sut_candidates.len())
            .field("fields", &self.fields.len())
            .finish()
    }
}
