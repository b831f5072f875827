//! TestClassVisitor: fills a TestDescriptorBuilder from a test class.

use testify_core::errors::AnalysisError;
use testify_core::types::collections::FxHashSet;

use super::context::AnalysisContext;
use crate::classfile::annotation::{self, Annotation};
use crate::classfile::constants::{CONSTRUCTOR_NAME, STATIC_INITIALIZER_NAME};
use crate::classfile::reader::{FieldInfo, MethodInfo};
use crate::classfile::visitor::{ClassHeader, ClassVisitor};
use crate::descriptor::{FieldDescriptor, MethodDescriptor, TestDescriptor, TestDescriptorBuilder};

/// Meta-annotations carried by every annotation type; never forwarded.
const META_ANNOTATION_PACKAGE: &str = "java.lang.annotation.";

pub struct TestClassVisitor<'a> {
    ctx: &'a AnalysisContext,
    builder: TestDescriptorBuilder,
    field_index: usize,
}

impl<'a> TestClassVisitor<'a> {
    pub fn new(ctx: &'a AnalysisContext, test_class: &str) -> Self {
        Self {
            ctx,
            builder: TestDescriptorBuilder::new(test_class, ctx.hierarchy()),
            field_index: 0,
        }
    }

    /// Freeze the collected state.
    pub fn finish(self) -> Result<TestDescriptor, AnalysisError> {
        self.builder.build()
    }

    /// Record and inspect one class-level annotation, then expand it if its
    /// type is a bundle. `expanding` holds the bundle types on the current
    /// path so cycles stop instead of recursing.
    fn inspect_annotation(
        &mut self,
        annotation: &Annotation,
        depth: u32,
        expanding: &mut FxHashSet<String>,
    ) -> Result<(), AnalysisError> {
        self.builder.add_annotation(annotation.clone());
        self.ctx.inspectors.dispatch(annotation, &mut self.builder)?;

        let type_name = &annotation.type_name;
        if self.ctx.class_path.is_platform(type_name) {
            return Ok(());
        }
        let Some(bundle) = self.ctx.class_path.find_class(type_name)? else {
            return Ok(());
        };
        if annotation::find(&bundle.annotations, &self.ctx.markers.bundle).is_none() {
            return Ok(());
        }
        if depth >= self.ctx.max_bundle_depth {
            tracing::warn!(
                test_class = %self.builder.test_class(),
                bundle = %type_name,
                depth,
                "bundle nesting exceeds max_bundle_depth; not expanding"
            );
            return Ok(());
        }
        if !expanding.insert(type_name.clone()) {
            tracing::debug!(bundle = %type_name, "bundle cycle; skipping");
            return Ok(());
        }

        tracing::debug!(bundle = %type_name, depth, "expanding bundle annotation");
        for inner in &bundle.annotations {
            if inner.type_name == self.ctx.markers.bundle
                || inner.type_name.starts_with(META_ANNOTATION_PACKAGE)
            {
                continue;
            }
            self.inspect_annotation(inner, depth + 1, expanding)?;
        }
        expanding.remove(type_name);
        Ok(())
    }
}

impl ClassVisitor for TestClassVisitor<'_> {
    type Error = AnalysisError;

    fn visit_header(&mut self, header: &ClassHeader<'_>) -> Result<(), AnalysisError> {
        if header.name != self.builder.test_class() {
            tracing::warn!(
                expected = %self.builder.test_class(),
                found = header.name,
                "class file name does not match requested test class"
            );
        }
        Ok(())
    }

    fn visit_annotation(&mut self, annotation: &Annotation) -> Result<(), AnalysisError> {
        let mut expanding = FxHashSet::default();
        self.inspect_annotation(annotation, 0, &mut expanding)
    }

    fn visit_field(&mut self, field: &FieldInfo) -> Result<(), AnalysisError> {
        if field.is_static() || field.is_synthetic() {
            tracing::trace!(field = %field.name, "skipping static or synthetic field");
            return Ok(());
        }
        let descriptor = FieldDescriptor::from_field_info(
            self.builder.test_class(),
            field,
            self.field_index,
            &self.ctx.markers.name,
        )?;
        self.field_index += 1;

        if descriptor.has_annotation(&self.ctx.markers.sut) {
            self.builder.add_sut_candidate(descriptor);
        } else {
            self.builder.add_field(descriptor);
        }
        Ok(())
    }

    fn visit_method(&mut self, method: &MethodInfo) -> Result<(), AnalysisError> {
        if method.name == CONSTRUCTOR_NAME || method.name == STATIC_INITIALIZER_NAME {
            return Ok(());
        }
        let markers = &self.ctx.markers;
        let is_handler = annotation::find(&method.annotations, &markers.config_handler).is_some();
        let is_provider =
            annotation::find(&method.annotations, &markers.collaborator_provider).is_some();
        if !is_handler && !is_provider {
            return Ok(());
        }

        let descriptor =
            MethodDescriptor::from_method_info(self.builder.test_class(), method, &markers.name)?;
        if is_handler {
            if descriptor.parameter_types().len() != 1 {
                return Err(AnalysisError::InvalidAnnotation {
                    annotation: markers.config_handler.clone(),
                    class: self.builder.test_class().to_string(),
                    message: format!(
                        "config handler {} must take exactly one parameter",
                        method.name
                    ),
                });
            }
            self.builder.add_config_handler(descriptor.clone());
        }
        if is_provider {
            if descriptor.return_type().is_void() {
                return Err(AnalysisError::InvalidAnnotation {
                    annotation: markers.collaborator_provider.clone(),
                    class: self.builder.test_class().to_string(),
                    message: format!("collaborator provider {} returns void", method.name),
                });
            }
            self.builder.add_collaborator_provider(descriptor);
        }
        Ok(())
    }

    fn visit_end(&mut self) -> Result<(), AnalysisError> {
        tracing::debug!(
            test_class = %self.builder.test_class(),
            fields = self.builder.field_count(),
            "test class visit complete"
        );
        Ok(())
    }
}
