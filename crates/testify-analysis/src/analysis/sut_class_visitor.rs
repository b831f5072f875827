//! SutClassVisitor: fills a SutDescriptorBuilder from the SUT class.

use testify_core::errors::AnalysisError;

use super::context::AnalysisContext;
use crate::classfile::annotation::{self, Annotation};
use crate::classfile::reader::{FieldInfo, MethodInfo};
use crate::classfile::visitor::{ClassHeader, ClassVisitor};
use crate::descriptor::{
    name_override, ConstructorDescriptor, FieldDescriptor, ParameterDescriptor, SutDescriptor,
    SutDescriptorBuilder,
};

pub struct SutClassVisitor<'a> {
    ctx: &'a AnalysisContext,
    builder: SutDescriptorBuilder,
    constructors: Vec<MethodInfo>,
    is_abstract: bool,
    field_index: usize,
}

impl<'a> SutClassVisitor<'a> {
    pub fn new(ctx: &'a AnalysisContext, sut_field: &FieldDescriptor) -> Self {
        Self {
            ctx,
            builder: SutDescriptorBuilder::new(sut_field, ctx.hierarchy()),
            constructors: Vec::new(),
            is_abstract: false,
            field_index: 0,
        }
    }

    pub fn finish(self) -> Result<SutDescriptor, AnalysisError> {
        self.builder.build()
    }

    /// A single constructor wins outright. Otherwise the first one carrying
    /// the constructor marker, then the first with the most parameters.
    fn select_canonical(&self) -> Option<&MethodInfo> {
        if let [only] = self.constructors.as_slice() {
            return Some(only);
        }
        let marker = &self.ctx.markers.constructor;
        if let Some(marked) = self
            .constructors
            .iter()
            .find(|m| annotation::find(&m.annotations, marker).is_some())
        {
            return Some(marked);
        }
        // max_by_key keeps the last maximum, so scan in reverse.
        self.constructors
            .iter()
            .rev()
            .max_by_key(|m| descriptor_arity(&m.descriptor))
    }

    fn record_constructor(&mut self, method: &MethodInfo) -> Result<(), AnalysisError> {
        let sut_class = self.builder.sut_class().to_string();
        let constructor = ConstructorDescriptor::from_method_info(&sut_class, method)?;

        for ty in constructor.parameter_types() {
            self.ctx.class_path.resolve_type(ty, &sut_class)?;
        }

        let count = constructor.parameter_count();
        // Parameter annotations, like signatures, may omit leading implicit slots.
        let offset = count.saturating_sub(method.parameter_annotations.len());
        for (i, (ty, generic)) in constructor
            .parameter_types()
            .iter()
            .zip(constructor.generic_parameter_types())
            .enumerate()
        {
            let annotations: Vec<Annotation> = i
                .checked_sub(offset)
                .and_then(|j| method.parameter_annotations.get(j))
                .cloned()
                .unwrap_or_default();
            let name = constructor.parameter_names()[i].clone();
            let declared_name =
                name_override(&annotations, &self.ctx.markers.name).unwrap_or_else(|| name.clone());
            self.builder.add_parameter(ParameterDescriptor::new(
                &sut_class,
                constructor.descriptor(),
                i,
                ty.clone(),
                generic.clone(),
                name,
                declared_name,
                annotations,
            ));
        }

        tracing::debug!(
            sut_class = %sut_class,
            descriptor = %constructor.descriptor(),
            parameters = count,
            "selected canonical constructor"
        );
        self.builder.set_constructor(constructor);
        Ok(())
    }
}

/// Parameter count of a method descriptor, zero when it does not parse.
fn descriptor_arity(descriptor: &str) -> usize {
    crate::classfile::descriptor::parse_method_descriptor(descriptor)
        .map(|t| t.parameters.len())
        .unwrap_or(0)
}

impl ClassVisitor for SutClassVisitor<'_> {
    type Error = AnalysisError;

    fn visit_header(&mut self, header: &ClassHeader<'_>) -> Result<(), AnalysisError> {
        use crate::classfile::constants::{ACC_ABSTRACT, ACC_INTERFACE};
        self.builder.set_access_flags(header.access_flags);
        self.is_abstract = header.access_flags & (ACC_INTERFACE | ACC_ABSTRACT) != 0;
        Ok(())
    }

    fn visit_field(&mut self, field: &FieldInfo) -> Result<(), AnalysisError> {
        if field.is_static() || field.is_synthetic() {
            return Ok(());
        }
        let descriptor = FieldDescriptor::from_field_info(
            self.builder.sut_class(),
            field,
            self.field_index,
            &self.ctx.markers.name,
        )?;
        self.field_index += 1;
        self.builder.add_field(descriptor);
        Ok(())
    }

    fn visit_method(&mut self, method: &MethodInfo) -> Result<(), AnalysisError> {
        if method.is_constructor() && !method.is_generated() {
            self.constructors.push(method.clone());
        }
        Ok(())
    }

    fn visit_end(&mut self) -> Result<(), AnalysisError> {
        if self.is_abstract {
            tracing::debug!(sut_class = %self.builder.sut_class(), "abstract SUT; no constructor");
            return Ok(());
        }
        match self.select_canonical().cloned() {
            Some(method) => self.record_constructor(&method),
            None => {
                tracing::debug!(sut_class = %self.builder.sut_class(), "SUT declares no constructor");
                Ok(())
            }
        }
    }
}
