//! Tests for test-class and SUT analysis.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use rayon::prelude::*;
use testify_analysis::analysis::{AnalysisContext, Analyzer, AnnotationInspector, InspectorRegistry};
use testify_analysis::classfile::annotation::{Annotation, ElementValue};
use testify_analysis::classfile::constants::{ACC_PRIVATE, ACC_PUBLIC, ACC_STATIC, ACC_SYNTHETIC};
use testify_analysis::classfile::types::GenericType;
use testify_analysis::classfile::{ClassWriter, FieldInfo, MethodInfo};
use testify_analysis::descriptor::TestDescriptorBuilder;
use testify_core::config::TestifyConfig;
use testify_core::errors::AnalysisError;
use testify_core::events::types::{AnalysisFailedEvent, TestClassAnalyzedEvent};
use testify_core::events::{EventDispatcher, TestifyEventHandler};

use common::*;

#[derive(Default)]
struct Counter {
    analyzed: AtomicUsize,
    failed: AtomicUsize,
}

impl TestifyEventHandler for Counter {
    fn on_test_class_analyzed(&self, _event: &TestClassAnalyzedEvent) {
        self.analyzed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_analysis_failed(&self, _event: &AnalysisFailedEvent) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

fn counted(classes: Vec<ClassWriter>) -> (Analyzer, Arc<Counter>) {
    let counter = Arc::new(Counter::default());
    let mut events = EventDispatcher::new();
    events.register(counter.clone());
    (analyzer(classes).with_events(events), counter)
}

/// T1-ANL-01: fields are recovered in declaration order without the SUT field
#[test]
fn test_descriptor_fields_in_order() {
    let analyzer = analyzer(order_classes());
    let test = analyzer.analyze_test_class(TEST_CLASS).unwrap();

    assert_eq!(test.test_class(), TEST_CLASS);
    assert_eq!(test.sut_field().map(|f| f.name()), Some("sut"));
    let names: Vec<&str> = test.field_descriptors().iter().map(|f| f.name()).collect();
    assert_eq!(names, ["gateway", "repository"]);
    assert_eq!(test.collaborator_providers().len(), 1);
    assert!(test.config_handlers().is_empty());
}

/// T1-ANL-02: repeated analysis returns the memoized descriptor
#[test]
fn test_analysis_is_memoized() {
    let (analyzer, counter) = counted(order_classes());
    let first = analyzer.analyze_test_class(TEST_CLASS).unwrap();
    let second = analyzer.analyze_test_class(TEST_CLASS).unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(counter.analyzed.load(Ordering::SeqCst), 1);
    assert_eq!(analyzer.cached_test_descriptors(), 1);

    let sut_a = analyzer.analyze_sut_field(&first).unwrap();
    let sut_b = analyzer.analyze_sut_field(&second).unwrap();
    assert!(Arc::ptr_eq(&sut_a, &sut_b));
}

/// T1-ANL-03: concurrent first-time analysis runs the visitor once
#[test]
fn test_concurrent_analysis_is_idempotent() {
    let (analyzer, counter) = counted(order_classes());
    let results: Vec<_> = (0..32)
        .into_par_iter()
        .map(|_| analyzer.analyze(TEST_CLASS).unwrap())
        .collect();

    let (first_test, first_sut) = &results[0];
    let first_sut = first_sut.as_ref().unwrap();
    for (test, sut) in &results {
        assert!(Arc::ptr_eq(first_test, test));
        assert!(Arc::ptr_eq(first_sut, sut.as_ref().unwrap()));
    }
    assert_eq!(counter.analyzed.load(Ordering::SeqCst), 1);
}

/// T1-ANL-04: two SUT fields abort analysis and nothing is cached
#[test]
fn test_multiple_sut_fields_rejected() {
    let test = ClassWriter::new("com.acme.TwoSutTest")
        .field(private_field("first", "Lcom/acme/OrderService;").with_annotation(marker("Sut")))
        .field(private_field("second", "Lcom/acme/OrderService;").with_annotation(marker("Sut")));
    let mut classes = order_classes();
    classes.push(test);
    let (analyzer, counter) = counted(classes);

    let err = analyzer.analyze_test_class("com.acme.TwoSutTest").unwrap_err();
    match err {
        AnalysisError::MultipleSutFields { test_class, fields } => {
            assert_eq!(test_class, "com.acme.TwoSutTest");
            assert_eq!(fields, ["first", "second"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(analyzer.cached_test_descriptors(), 0);
    assert_eq!(counter.failed.load(Ordering::SeqCst), 1);

    // Failures are recomputed, not replayed from the cache.
    assert!(analyzer.analyze_test_class("com.acme.TwoSutTest").is_err());
    assert_eq!(counter.failed.load(Ordering::SeqCst), 2);
}

/// T1-ANL-05: an unknown test class is ClassNotFound
#[test]
fn test_unknown_test_class() {
    let analyzer = analyzer(order_classes());
    let err = analyzer.analyze_test_class("com.acme.Missing").unwrap_err();
    assert!(matches!(err, AnalysisError::ClassNotFound { ref class, .. } if class == "com.acme.Missing"));
}

/// T1-ANL-06: SUT parameters carry compiled names and both caches agree
#[test]
fn test_sut_parameters_and_caches() {
    let analyzer = analyzer(order_classes());
    let (_, sut) = analyzer.analyze(TEST_CLASS).unwrap();
    let sut = sut.unwrap();

    assert_eq!(sut.sut_class(), SUT_CLASS);
    let ctor = sut.constructor().unwrap();
    assert_eq!(ctor.descriptor(), SUT_CTOR_DESC);
    assert_eq!(ctor.parameter_count(), sut.parameter_descriptors().len());

    for param in sut.parameter_descriptors() {
        assert_eq!(
            sut.find_parameter_descriptor_named(param.generic_type(), param.declared_name()),
            Some(param)
        );
        assert_eq!(sut.find_parameter_descriptor(param.generic_type()), Some(param));
    }
    let names: Vec<&str> = sut.parameter_descriptors().iter().map(|p| p.name()).collect();
    assert_eq!(names, ["gateway", "repository"]);

    let gateway = sut.find_field_descriptor(&GenericType::class(GATEWAY)).unwrap();
    assert!(gateway.was_final());
}

/// T1-ANL-07: the name override wins over the raw field name
#[test]
fn test_name_override_on_fields() {
    let test = ClassWriter::new("com.acme.NamedTest").field(
        private_field("primary", GATEWAY_DESC)
            .with_annotation(marker("Fake"))
            .with_annotation(named("gateway")),
    );
    let mut classes = order_classes();
    classes.push(test);
    let analyzer = analyzer(classes);
    let test = analyzer.analyze_test_class("com.acme.NamedTest").unwrap();

    let ty = GenericType::class(GATEWAY);
    let field = test.find_field_descriptor_named(&ty, "gateway").unwrap();
    assert_eq!(field.name(), "primary");
    assert!(test.find_field_descriptor_named(&ty, "primary").is_none());
}

/// T1-ANL-08: the marked constructor wins, otherwise the widest one
#[test]
fn test_canonical_constructor_selection() {
    let widest = ClassWriter::new("com.acme.Widest")
        .method(MethodInfo::new(ACC_PUBLIC, "<init>", "()V"))
        .method(MethodInfo::new(ACC_PUBLIC, "<init>", "(Lcom/acme/PaymentGateway;)V"))
        .method(MethodInfo::new(ACC_PUBLIC, "<init>", "(Lcom/acme/OrderRepository;)V"))
        .method(MethodInfo::new(ACC_PUBLIC | ACC_SYNTHETIC, "<init>", "(Lcom/acme/PaymentGateway;Lcom/acme/OrderRepository;I)V"));
    let marked = ClassWriter::new("com.acme.Marked")
        .method(MethodInfo::new(ACC_PUBLIC, "<init>", SUT_CTOR_DESC))
        .method(
            MethodInfo::new(ACC_PUBLIC, "<init>", "(Lcom/acme/OrderRepository;)V")
                .with_annotation(marker("Inject")),
        );
    let sut_test = |name: &str, sut: &str| {
        ClassWriter::new(name).field(
            private_field("sut", &format!("L{};", sut.replace('.', "/")))
                .with_annotation(marker("Sut")),
        )
    };
    let mut classes = order_classes();
    classes.extend([
        widest,
        marked,
        sut_test("com.acme.WidestTest", "com.acme.Widest"),
        sut_test("com.acme.MarkedTest", "com.acme.Marked"),
    ]);
    let analyzer = analyzer(classes);

    let (_, sut) = analyzer.analyze("com.acme.WidestTest").unwrap();
    let ctor = sut.unwrap().constructor().cloned().unwrap();
    assert_eq!(ctor.descriptor(), "(Lcom/acme/PaymentGateway;)V");
    assert_eq!(ctor.parameter_names(), ["arg0".to_string()]);

    let (_, sut) = analyzer.analyze("com.acme.MarkedTest").unwrap();
    let ctor = sut.unwrap().constructor().cloned().unwrap();
    assert_eq!(ctor.descriptor(), "(Lcom/acme/OrderRepository;)V");
}

/// T1-ANL-09: an unresolvable constructor parameter type aborts SUT analysis
#[test]
fn test_unresolvable_parameter_type() {
    let sut = ClassWriter::new("com.acme.Broken")
        .method(MethodInfo::new(ACC_PUBLIC, "<init>", "(Lcom/acme/Ghost;)V"));
    let test = ClassWriter::new("com.acme.BrokenTest")
        .field(private_field("sut", "Lcom/acme/Broken;").with_annotation(marker("Sut")));
    let analyzer = analyzer(vec![sut, test]);

    let test = analyzer.analyze_test_class("com.acme.BrokenTest").unwrap();
    let err = analyzer.analyze_sut_field(&test).unwrap_err();
    match err {
        AnalysisError::ClassNotFound { class, referenced_by } => {
            assert_eq!(class, "com.acme.Ghost");
            assert_eq!(referenced_by, "com.acme.Broken");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(analyzer.cached_sut_descriptors(), 0);
}

fn module(class: &str) -> Annotation {
    marker("Module").with("value", ElementValue::class(class))
}

/// T1-ANL-10: bundle annotations expand recursively and survive cycles
#[test]
fn test_bundle_expansion() {
    let outer = ClassWriter::annotation_type("com.acme.OuterBundle")
        .annotation(marker("Bundle"))
        .annotation(Annotation::new("com.acme.InnerBundle"))
        .annotation(module("com.acme.OuterModule"));
    let inner = ClassWriter::annotation_type("com.acme.InnerBundle")
        .annotation(marker("Bundle"))
        .annotation(Annotation::new("com.acme.OuterBundle"))
        .annotation(module("com.acme.InnerModule"));
    let test = ClassWriter::new("com.acme.BundledTest")
        .annotation(Annotation::new("com.acme.OuterBundle"));
    let analyzer = analyzer(vec![outer, inner, test]);

    let test = analyzer.analyze_test_class("com.acme.BundledTest").unwrap();
    let modules: Vec<String> = test
        .modules()
        .iter()
        .flat_map(|m| m.class_names("value"))
        .collect();
    assert_eq!(modules, ["com.acme.InnerModule", "com.acme.OuterModule"]);
}

/// T1-ANL-11: expansion stops at the configured bundle depth
#[test]
fn test_bundle_depth_limit() {
    let outer = ClassWriter::annotation_type("com.acme.OuterBundle")
        .annotation(marker("Bundle"))
        .annotation(Annotation::new("com.acme.InnerBundle"));
    let inner = ClassWriter::annotation_type("com.acme.InnerBundle")
        .annotation(marker("Bundle"))
        .annotation(module("com.acme.DeepModule"));
    let test = ClassWriter::new("com.acme.DeepTest")
        .annotation(Annotation::new("com.acme.OuterBundle"));

    let config = TestifyConfig::from_toml("[analysis]\nmax_bundle_depth = 1\n").unwrap();
    let shallow = Analyzer::new(class_path(vec![outer.clone(), inner.clone(), test.clone()]), &config);
    assert!(shallow.analyze_test_class("com.acme.DeepTest").unwrap().modules().is_empty());

    let deep = analyzer(vec![outer, inner, test]);
    assert_eq!(deep.analyze_test_class("com.acme.DeepTest").unwrap().modules().len(), 1);
}

/// T1-ANL-12: SUT analysis without a SUT field is MissingSutField
#[test]
fn test_missing_sut_field() {
    let test = ClassWriter::new("com.acme.PlainTest").field(private_field("gateway", GATEWAY_DESC));
    let analyzer = analyzer(vec![gateway_interface(), test]);
    let (descriptor, sut) = analyzer.analyze("com.acme.PlainTest").unwrap();
    assert!(sut.is_none());

    let err = analyzer.analyze_sut_field(&descriptor).unwrap_err();
    assert!(matches!(err, AnalysisError::MissingSutField { .. }));
}

/// T1-ANL-13: handlers and providers are recorded; static fields are not
#[test]
fn test_hooks_and_static_fields() {
    let test = ClassWriter::new("com.acme.HookTest")
        .field(FieldInfo::new(ACC_PRIVATE | ACC_STATIC, "LOG", "Ljava/lang/String;"))
        .method(
            MethodInfo::new(ACC_PUBLIC, "configure", "(Ljava/util/Map;)V")
                .with_signature("(Ljava/util/Map<Ljava/lang/String;Ljava/lang/String;>;)V")
                .with_annotation(marker("ConfigHandler")),
        )
        .method(
            MethodInfo::new(ACC_PUBLIC, "gateway", "()Lcom/acme/PaymentGateway;")
                .with_annotation(marker("CollaboratorProvider"))
                .with_annotation(named("primary")),
        );
    let analyzer = analyzer(vec![gateway_interface(), test]);
    let test = analyzer.analyze_test_class("com.acme.HookTest").unwrap();

    assert!(test.field_descriptors().is_empty());
    let map = GenericType::parameterized(
        "java.util.Map",
        vec![GenericType::class("java.lang.String"), GenericType::class("java.lang.String")],
    );
    assert_eq!(test.find_config_handler(&map).map(|m| m.name()), Some("configure"));
    assert!(test.find_config_handler(&GenericType::class("java.util.Map")).is_some());
    assert!(test
        .find_config_handler(&GenericType::parameterized(
            "java.util.Map",
            vec![GenericType::class("java.lang.String"), GenericType::class("java.lang.Integer")],
        ))
        .is_none());

    let gateway = GenericType::class(GATEWAY);
    assert!(test.find_collaborator_provider(&gateway, Some("primary")).is_some());
    assert!(test.find_collaborator_provider(&gateway, Some("gateway")).is_none());
    assert!(test.find_collaborator_provider(&gateway, None).is_some());
}

/// T1-ANL-14: a config handler with two parameters is rejected
#[test]
fn test_invalid_config_handler() {
    let test = ClassWriter::new("com.acme.BadHookTest").method(
        MethodInfo::new(ACC_PUBLIC, "configure", "(II)V").with_annotation(marker("ConfigHandler")),
    );
    let analyzer = analyzer(vec![test]);
    let err = analyzer.analyze_test_class("com.acme.BadHookTest").unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidAnnotation { .. }));
}

struct TagInspector;

impl AnnotationInspector for TagInspector {
    fn id(&self) -> &str {
        "tag"
    }

    fn handles(&self, type_name: &str) -> bool {
        type_name == "com.acme.Tag"
    }

    fn inspect(&self, annotation: &Annotation, builder: &mut TestDescriptorBuilder) -> Result<(), AnalysisError> {
        for tag in annotation.strings("value") {
            builder.add_guideline(format!("tag:{tag}"));
        }
        Ok(())
    }
}

/// T1-ANL-15: custom inspectors registered on the context are dispatched
#[test]
fn test_custom_inspector() {
    let test = ClassWriter::new("com.acme.TaggedTest").annotation(
        Annotation::new("com.acme.Tag").with("value", ElementValue::string("slow")),
    );
    let mut registry = InspectorRegistry::new();
    registry.register(Box::new(TagInspector));
    let ctx = AnalysisContext::new(class_path(vec![test]), &TestifyConfig::default())
        .with_inspectors(registry);
    let analyzer = Analyzer::with_context(ctx, None);

    let test = analyzer.analyze_test_class("com.acme.TaggedTest").unwrap();
    assert!(test.has_guideline("tag:slow"));
    assert_eq!(test.annotations().len(), 1);
}

/// T1-ANL-16: application, scan and resource annotations are recorded
#[test]
fn test_builtin_inspectors() {
    let test = ClassWriter::new("com.acme.AppTest")
        .annotation(marker("Application").with("value", ElementValue::class("com.acme.App")))
        .annotation(marker("Scan").with("value", ElementValue::string("com.acme.orders")))
        .annotation(marker("LocalResource").with("value", ElementValue::class("com.acme.Db")))
        .annotation(marker("RemoteResource").with("value", ElementValue::class("com.acme.Queue")));
    let analyzer = analyzer(vec![test]);
    let test = analyzer.analyze_test_class("com.acme.AppTest").unwrap();

    assert_eq!(test.application().unwrap().class_names("value"), ["com.acme.App"]);
    assert_eq!(test.scans().len(), 1);
    assert_eq!(test.local_resources().len(), 1);
    assert!(test.virtual_resources().is_empty());
    assert_eq!(test.remote_resources().len(), 1);
}

/// Rejects every annotation it handles, slowly, counting its runs.
struct RejectingInspector {
    runs: Arc<AtomicUsize>,
}

impl AnnotationInspector for RejectingInspector {
    fn id(&self) -> &str {
        "rejecting"
    }

    fn handles(&self, type_name: &str) -> bool {
        type_name == "com.acme.Broken"
    }

    fn inspect(&self, annotation: &Annotation, builder: &mut TestDescriptorBuilder) -> Result<(), AnalysisError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(std::time::Duration::from_millis(50));
        Err(AnalysisError::InvalidAnnotation {
            annotation: annotation.type_name.clone(),
            class: builder.test_class().to_string(),
            message: "always rejected".to_string(),
        })
    }
}

/// T1-ANL-17: one failed analysis run reports once however many callers wait on it
#[test]
fn test_concurrent_failure_reported_per_run() {
    let test = ClassWriter::new("com.acme.BrokenTest").annotation(Annotation::new("com.acme.Broken"));
    let runs = Arc::new(AtomicUsize::new(0));
    let mut registry = InspectorRegistry::new();
    registry.register(Box::new(RejectingInspector { runs: runs.clone() }));
    let ctx = AnalysisContext::new(class_path(vec![test]), &TestifyConfig::default())
        .with_inspectors(registry);
    let counter = Arc::new(Counter::default());
    let mut events = EventDispatcher::new();
    events.register(counter.clone());
    let analyzer = Analyzer::with_context(ctx, None).with_events(events);

    let errors: Vec<AnalysisError> = (0..16)
        .into_par_iter()
        .map(|_| analyzer.analyze_test_class("com.acme.BrokenTest").unwrap_err())
        .collect();

    assert_eq!(errors.len(), 16);
    assert!(errors
        .iter()
        .all(|e| matches!(e, AnalysisError::InvalidAnnotation { message, .. } if message == "always rejected")));
    let runs = runs.load(Ordering::SeqCst);
    assert!(runs >= 1);
    assert_eq!(counter.failed.load(Ordering::SeqCst), runs);
}

/// T1-ANL-18: invalidation ends instance sharing; the next lookup re-analyses
#[test]
fn test_invalidation_yields_fresh_descriptor() {
    let (analyzer, counter) = counted(order_classes());
    let before = analyzer.analyze_test_class(TEST_CLASS).unwrap();
    analyzer.invalidate_all();
    assert_eq!(analyzer.cached_test_descriptors(), 0);

    let after = analyzer.analyze_test_class(TEST_CLASS).unwrap();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(counter.analyzed.load(Ordering::SeqCst), 2);
    assert!(Arc::ptr_eq(&after, &analyzer.analyze_test_class(TEST_CLASS).unwrap()));
}
