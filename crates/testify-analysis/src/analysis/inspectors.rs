//! Class-level annotation inspectors and their registry.

use std::fmt;

use testify_core::errors::AnalysisError;

use super::markers::Markers;
use crate::classfile::annotation::Annotation;
use crate::descriptor::TestDescriptorBuilder;

/// Reacts to one kind of class-level annotation on a test class.
pub trait AnnotationInspector: Send + Sync {
    fn id(&self) -> &str;

    /// Whether this inspector handles annotations of `type_name`.
    fn handles(&self, type_name: &str) -> bool;

    /// Record what the annotation contributes to the test descriptor.
    fn inspect(
        &self,
        annotation: &Annotation,
        builder: &mut TestDescriptorBuilder,
    ) -> Result<(), AnalysisError>;
}

/// Explicit registration table of inspectors, consulted in order.
#[derive(Default)]
pub struct InspectorRegistry {
    inspectors: Vec<Box<dyn AnnotationInspector>>,
}

impl InspectorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in inspectors for `markers`.
    pub fn with_defaults(markers: &Markers) -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ApplicationInspector {
            marker: markers.application.clone(),
        }));
        registry.register(Box::new(ModuleInspector {
            marker: markers.module.clone(),
        }));
        registry.register(Box::new(ScanInspector {
            marker: markers.scan.clone(),
        }));
        for (marker, kind) in [
            (&markers.local_resource, ResourceKind::Local),
            (&markers.virtual_resource, ResourceKind::Virtual),
            (&markers.remote_resource, ResourceKind::Remote),
        ] {
            registry.register(Box::new(ResourceInspector {
                marker: marker.clone(),
                kind,
            }));
        }
        if !markers.guidelines.is_empty() {
            registry.register(Box::new(GuidelineInspector {
                markers: markers.guidelines.clone(),
            }));
        }
        registry
    }

    pub fn register(&mut self, inspector: Box<dyn AnnotationInspector>) {
        self.inspectors.push(inspector);
    }

    pub fn len(&self) -> usize {
        self.inspectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inspectors.is_empty()
    }

    /// Run every inspector that handles `annotation`. Returns how many ran.
    pub fn dispatch(
        &self,
        annotation: &Annotation,
        builder: &mut TestDescriptorBuilder,
    ) -> Result<usize, AnalysisError> {
        let mut handled = 0;
        for inspector in self
            .inspectors
            .iter()
            .filter(|i| i.handles(&annotation.type_name))
        {
            tracing::trace!(
                inspector = inspector.id(),
                annotation = %annotation.type_name,
                "inspecting class annotation"
            );
            inspector.inspect(annotation, builder)?;
            handled += 1;
        }
        Ok(handled)
    }
}

impl fmt::Debug for InspectorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.inspectors.iter().map(|i| i.id()))
            .finish()
    }
}

fn invalid(annotation: &Annotation, builder: &TestDescriptorBuilder, message: &str) -> AnalysisError {
    AnalysisError::InvalidAnnotation {
        annotation: annotation.type_name.clone(),
        class: builder.test_class().to_string(),
        message: message.to_string(),
    }
}

/// `value` must name at least one class.
fn require_class_value(
    annotation: &Annotation,
    builder: &TestDescriptorBuilder,
) -> Result<(), AnalysisError> {
    if annotation.class_names("value").is_empty() {
        return Err(invalid(annotation, builder, "`value` must name a class"));
    }
    Ok(())
}

struct ApplicationInspector {
    marker: String,
}

impl AnnotationInspector for ApplicationInspector {
    fn id(&self) -> &str {
        "application"
    }

    fn handles(&self, type_name: &str) -> bool {
        type_name == self.marker
    }

    fn inspect(&self, annotation: &Annotation, builder: &mut TestDescriptorBuilder) -> Result<(), AnalysisError> {
        require_class_value(annotation, builder)?;
        builder.set_application(annotation.clone());
        Ok(())
    }
}

struct ModuleInspector {
    marker: String,
}

impl AnnotationInspector for ModuleInspector {
    fn id(&self) -> &str {
        "module"
    }

    fn handles(&self, type_name: &str) -> bool {
        type_name == self.marker
    }

    fn inspect(&self, annotation: &Annotation, builder: &mut TestDescriptorBuilder) -> Result<(), AnalysisError> {
        require_class_value(annotation, builder)?;
        builder.add_module(annotation.clone());
        Ok(())
    }
}

struct ScanInspector {
    marker: String,
}

impl AnnotationInspector for ScanInspector {
    fn id(&self) -> &str {
        "scan"
    }

    fn handles(&self, type_name: &str) -> bool {
        type_name == self.marker
    }

    fn inspect(&self, annotation: &Annotation, builder: &mut TestDescriptorBuilder) -> Result<(), AnalysisError> {
        if annotation.strings("value").iter().all(|s| s.trim().is_empty()) {
            return Err(invalid(annotation, builder, "`value` must name a package"));
        }
        builder.add_scan(annotation.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum ResourceKind {
    Local,
    Virtual,
    Remote,
}

struct ResourceInspector {
    marker: String,
    kind: ResourceKind,
}

impl AnnotationInspector for ResourceInspector {
    fn id(&self) -> &str {
        match self.kind {
            ResourceKind::Local => "local-resource",
            ResourceKind::Virtual => "virtual-resource",
            ResourceKind::Remote => "remote-resource",
        }
    }

    fn handles(&self, type_name: &str) -> bool {
        type_name == self.marker
    }

    fn inspect(&self, annotation: &Annotation, builder: &mut TestDescriptorBuilder) -> Result<(), AnalysisError> {
        require_class_value(annotation, builder)?;
        match self.kind {
            ResourceKind::Local => builder.add_local_resource(annotation.clone()),
            ResourceKind::Virtual => builder.add_virtual_resource(annotation.clone()),
            ResourceKind::Remote => builder.add_remote_resource(annotation.clone()),
        }
        Ok(())
    }
}

struct GuidelineInspector {
    markers: Vec<String>,
}

impl AnnotationInspector for GuidelineInspector {
    fn id(&self) -> &str {
        "guideline"
    }

    fn handles(&self, type_name: &str) -> bool {
        self.markers.iter().any(|m| m == type_name)
    }

    fn inspect(&self, annotation: &Annotation, builder: &mut TestDescriptorBuilder) -> Result<(), AnalysisError> {
        builder.add_guideline(annotation.type_name.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::classpath::ClassPath;

    fn builder() -> TestDescriptorBuilder {
        TestDescriptorBuilder::new("com.acme.OrderTest", Arc::new(ClassPath::builder().build()))
    }

    #[test]
    fn defaults_cover_builtin_markers() {
        let markers = Markers::default();
        let registry = InspectorRegistry::with_defaults(&markers);
        assert_eq!(registry.len(), 6);
        assert_eq!(
            format!("{registry:?}"),
            r#"["application", "module", "scan", "local-resource", "virtual-resource", "remote-resource"]"#
        );
    }

    #[test]
    fn module_without_class_value_is_rejected() {
        let markers = Markers::default();
        let registry = InspectorRegistry::with_defaults(&markers);
        let mut b = builder();
        let err = registry
            .dispatch(&Annotation::new(markers.module.clone()), &mut b)
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidAnnotation { .. }));
    }

    #[test]
    fn unhandled_annotation_runs_nothing() {
        let registry = InspectorRegistry::with_defaults(&Markers::default());
        let mut b = builder();
        let n = registry
            .dispatch(&Annotation::new("org.junit.Test"), &mut b)
            .unwrap();
        assert_eq!(n, 0);
    }

    #[test]
    fn guidelines_recorded_once() {
        let mut markers = Markers::default();
        markers.guidelines = vec!["com.acme.Strict".into()];
        let registry = InspectorRegistry::with_defaults(&markers);
        let mut b = builder();
        registry.dispatch(&Annotation::new("com.acme.Strict"), &mut b).unwrap();
        registry.dispatch(&Annotation::new("com.acme.Strict"), &mut b).unwrap();
        let descriptor = b.build().unwrap();
        assert_eq!(descriptor.guidelines(), ["com.acme.Strict".to_string()]);
    }
}
