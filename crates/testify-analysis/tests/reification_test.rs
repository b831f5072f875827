//! Tests for the reification decision table.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use testify_analysis::analysis::Analyzer;
use testify_analysis::classfile::constants::ACC_PUBLIC;
use testify_analysis::classfile::{ClassWriter, FieldInfo, MethodInfo};
use testify_analysis::descriptor::{SutDescriptor, TestDescriptor};
use testify_analysis::mock::{ArenaMockProvider, MockProvider};
use testify_analysis::reify::{FieldAction, ReificationEngine};
use testify_analysis::runtime::{ObjectId, ObjectOrigin, Runtime, Value};
use testify_analysis::Role;
use testify_core::errors::{MockError, ReificationError};
use testify_core::events::types::{FieldReifiedEvent, ReificationCompletedEvent};
use testify_core::events::{EventDispatcher, TestifyEventHandler};

use common::*;

const PAYPAL: &str = "com.acme.PaypalGateway";

struct Fixture {
    analyzer: Analyzer,
    test: Arc<TestDescriptor>,
    sut: Arc<SutDescriptor>,
    rt: Runtime,
    test_instance: ObjectId,
    sut_instance: ObjectId,
}

impl Fixture {
    fn engine(&self) -> ReificationEngine {
        ReificationEngine::new(
            Arc::new(ArenaMockProvider::new()),
            self.analyzer.context().markers.clone(),
        )
    }

    fn test_value(&self, field: &str) -> Value {
        let field = self
            .test
            .field_descriptors()
            .iter()
            .find(|f| f.name() == field)
            .unwrap();
        field.get_value(&self.rt, self.test_instance).unwrap()
    }

    fn sut_value(&self, field: &str) -> Value {
        let field = self
            .sut
            .field_descriptors()
            .iter()
            .find(|f| f.name() == field)
            .unwrap();
        field.get_value(&self.rt, self.sut_instance).unwrap()
    }

    fn set_test_value(&mut self, field: &str, value: Value) {
        let field = self
            .test
            .field_descriptors()
            .iter()
            .find(|f| f.name() == field)
            .unwrap()
            .clone();
        field.set_value(&mut self.rt, self.test_instance, value).unwrap();
    }

    fn set_sut_value(&mut self, field: &str, value: Value) {
        let field = self
            .sut
            .field_descriptors()
            .iter()
            .find(|f| f.name() == field)
            .unwrap()
            .clone();
        field.set_value(&mut self.rt, self.sut_instance, value).unwrap();
    }

    fn reify(&mut self) -> Result<testify_analysis::ReificationReport, ReificationError> {
        let engine = self.engine();
        engine.reify(&mut self.rt, &self.test, &self.sut, self.test_instance, self.sut_instance)
    }
}

/// Test class `com.acme.CaseTest` targeting `sut_class` with `fields`.
fn fixture(sut_class: &str, fields: Vec<FieldInfo>, extra: Vec<ClassWriter>) -> Fixture {
    let mut test = ClassWriter::new("com.acme.CaseTest").field(
        private_field("sut", &format!("L{};", sut_class.replace('.', "/")))
            .with_annotation(marker("Sut")),
    );
    for field in fields {
        test = test.field(field);
    }
    let mut classes = order_classes();
    classes.extend(extra);
    classes.push(test);
    let analyzer = analyzer(classes);
    let (test, sut) = analyzer.analyze("com.acme.CaseTest").unwrap();
    let mut rt = Runtime::new(analyzer.class_path().clone());
    let test_instance = rt.instantiate("com.acme.CaseTest");
    let sut_instance = rt.instantiate(sut_class);
    Fixture {
        analyzer,
        test,
        sut: sut.unwrap(),
        rt,
        test_instance,
        sut_instance,
    }
}

fn order_fixture(fields: Vec<FieldInfo>) -> Fixture {
    fixture(SUT_CLASS, fields, Vec::new())
}

fn fake_gateway() -> FieldInfo {
    private_field("gateway", GATEWAY_DESC).with_annotation(marker("Fake"))
}

fn origin(fx: &Fixture, value: &Value) -> ObjectOrigin {
    fx.rt.heap().object(value.as_object().unwrap()).origin()
}

/// T1-RFY-01: a fake is synthesized when the SUT field is empty
#[test]
fn test_fake_synthesized_for_empty_sut_field() {
    let mut fx = order_fixture(vec![fake_gateway()]);
    let report = fx.reify().unwrap();

    let outcome = report.outcome("gateway").unwrap();
    assert_eq!(outcome.action, FieldAction::Faked);
    assert_eq!(outcome.role, Some(Role::Fake));
    let value = fx.test_value("gateway");
    assert_eq!(value, fx.sut_value("gateway"));
    assert_eq!(origin(&fx, &value), ObjectOrigin::Fake);
}

/// T1-RFY-02: a real SUT collaborator is replaced by a fresh fake
#[test]
fn test_fake_replaces_real_collaborator() {
    let mut fx = order_fixture(vec![fake_gateway()]);
    let real = Value::Ref(fx.rt.instantiate(STRIPE));
    fx.set_sut_value("gateway", real.clone());

    fx.reify().unwrap();
    let value = fx.sut_value("gateway");
    assert_ne!(value, real);
    assert_eq!(origin(&fx, &value), ObjectOrigin::Fake);
    assert_eq!(fx.rt.heap().object(value.as_object().unwrap()).class_name(), GATEWAY);
}

/// T1-RFY-03: a mock already in the SUT is reused
#[test]
fn test_existing_mock_is_reused() {
    let mut fx = order_fixture(vec![fake_gateway()]);
    let mock = ArenaMockProvider::new()
        .create_fake(&mut fx.rt, &testify_analysis::classfile::TypeRef::class(GATEWAY))
        .unwrap();
    fx.set_sut_value("gateway", mock.clone());

    let report = fx.reify().unwrap();
    assert_eq!(report.outcome("gateway").unwrap().action, FieldAction::Reused);
    assert_eq!(fx.test_value("gateway"), mock);
    assert_eq!(fx.sut_value("gateway"), mock);
}

/// T1-RFY-04: a virtual wraps the SUT's real collaborator
#[test]
fn test_virtual_wraps_real_collaborator() {
    let mut fx = order_fixture(vec![
        private_field("repository", REPOSITORY_DESC).with_annotation(marker("Virtual")),
    ]);
    let real = fx.rt.instantiate(REPOSITORY);
    fx.set_sut_value("repository", Value::Ref(real));

    let report = fx.reify().unwrap();
    assert_eq!(report.outcome("repository").unwrap().action, FieldAction::Virtualized);
    let value = fx.test_value("repository");
    assert_eq!(value, fx.sut_value("repository"));
    assert_eq!(origin(&fx, &value), ObjectOrigin::Virtual { delegate: real });
}

/// T1-RFY-05: a virtual with nothing to delegate to is left alone
#[test]
fn test_virtual_without_delegate_is_unmatched() {
    let mut fx = order_fixture(vec![
        private_field("repository", REPOSITORY_DESC).with_annotation(marker("Virtual")),
    ]);
    let report = fx.reify().unwrap();

    assert_eq!(report.outcome("repository").unwrap().action, FieldAction::Unmatched);
    assert!(fx.test_value("repository").is_null());
    assert!(fx.sut_value("repository").is_null());
}

/// T1-RFY-06: unmarked and real fields never synthesize values
#[test]
fn test_unmarked_and_real_fields_unchanged() {
    let mut fx = order_fixture(vec![
        private_field("gateway", GATEWAY_DESC),
        private_field("repository", REPOSITORY_DESC).with_annotation(marker("Real")),
    ]);
    let report = fx.reify().unwrap();

    assert_eq!(report.outcome("gateway").unwrap().action, FieldAction::Unchanged);
    assert_eq!(report.outcome("repository").unwrap().action, FieldAction::Unchanged);
    assert!(fx.sut_value("gateway").is_null());
    assert_eq!(report.injected(), 0);
    assert_eq!(report.unchanged(), 2);
}

/// T1-RFY-07: only role-marked fields fall back to type-only matching
#[test]
fn test_loose_matching_requires_role() {
    let mut fx = order_fixture(vec![
        private_field("payments", GATEWAY_DESC).with_annotation(marker("Fake")),
        private_field("orders", REPOSITORY_DESC),
    ]);
    let report = fx.reify().unwrap();

    let payments = report.outcome("payments").unwrap();
    assert_eq!(payments.action, FieldAction::Faked);
    assert_eq!(payments.sut_field.as_deref(), Some("gateway"));
    assert_eq!(report.outcome("orders").unwrap().action, FieldAction::Unmatched);

    let mut strict = order_fixture(vec![
        private_field("payments", GATEWAY_DESC).with_annotation(marker("Fake")),
    ]);
    let engine = strict.engine().loose_matching(false);
    let report = engine
        .reify(&mut strict.rt, &strict.test, &strict.sut, strict.test_instance, strict.sut_instance)
        .unwrap();
    assert_eq!(report.outcome("payments").unwrap().action, FieldAction::Unmatched);
}

/// T1-RFY-08: a field with no SUT counterpart is untouched
#[test]
fn test_no_match_is_noop() {
    let mut fx = order_fixture(vec![
        private_field("clock", "Ljava/time/Clock;").with_annotation(marker("Fake")),
    ]);
    let report = fx.reify().unwrap();

    let outcome = report.outcome("clock").unwrap();
    assert_eq!(outcome.action, FieldAction::Unmatched);
    assert_eq!(outcome.sut_field, None);
    assert!(fx.test_value("clock").is_null());
}

fn paypal() -> ClassWriter {
    ClassWriter::new(PAYPAL)
        .implements(GATEWAY)
        .method(MethodInfo::new(ACC_PUBLIC, "<init>", "()V"))
}

fn router(fields: &[(&str, &str)]) -> ClassWriter {
    let mut router = ClassWriter::new("com.acme.Router")
        .method(MethodInfo::new(ACC_PUBLIC, "<init>", "()V"));
    for (name, desc) in fields {
        router = router.field(private_field(name, desc));
    }
    router
}

/// T1-RFY-09: a supertype query matching two SUT fields is no match
#[test]
fn test_supertype_ambiguity_is_no_match() {
    let mut fx = fixture(
        "com.acme.Router",
        vec![fake_gateway()],
        vec![
            paypal(),
            router(&[
                ("primary", "Lcom/acme/StripeGateway;"),
                ("backup", "Lcom/acme/PaypalGateway;"),
            ]),
        ],
    );
    let report = fx.reify().unwrap();
    assert_eq!(report.outcome("gateway").unwrap().action, FieldAction::Unmatched);
}

/// T1-RFY-10: a supertype query finds the single implementor
#[test]
fn test_supertype_single_implementor() {
    let mut fx = fixture(
        "com.acme.Router",
        vec![fake_gateway()],
        vec![router(&[("primary", "Lcom/acme/StripeGateway;"), ("retries", "I")])],
    );
    let report = fx.reify().unwrap();

    let outcome = report.outcome("gateway").unwrap();
    assert_eq!(outcome.action, FieldAction::Faked);
    assert_eq!(outcome.sut_field.as_deref(), Some("primary"));
    let value = fx.sut_value("primary");
    assert_eq!(fx.rt.heap().object(value.as_object().unwrap()).class_name(), STRIPE);
}

/// T1-RFY-11: an author-assigned value is mirrored into the SUT
#[test]
fn test_author_value_propagated() {
    let mut fx = order_fixture(vec![private_field("gateway", GATEWAY_DESC)]);
    let stripe = Value::Ref(fx.rt.instantiate(STRIPE));
    fx.set_test_value("gateway", stripe.clone());

    let report = fx.reify().unwrap();
    assert_eq!(report.outcome("gateway").unwrap().action, FieldAction::Propagated);
    assert_eq!(fx.sut_value("gateway"), stripe);

    let again = fx.reify().unwrap();
    assert_eq!(again.outcome("gateway").unwrap().action, FieldAction::Unchanged);
}

/// T1-RFY-12: an author value on a virtual field is wrapped first
#[test]
fn test_author_value_wrapped_in_virtual() {
    let mut fx = order_fixture(vec![
        private_field("gateway", GATEWAY_DESC).with_annotation(marker("Virtual")),
    ]);
    let stripe = fx.rt.instantiate(STRIPE);
    fx.set_test_value("gateway", Value::Ref(stripe));

    let report = fx.reify().unwrap();
    assert_eq!(report.outcome("gateway").unwrap().action, FieldAction::Virtualized);
    let value = fx.test_value("gateway");
    assert_eq!(origin(&fx, &value), ObjectOrigin::Virtual { delegate: stripe });
    assert_eq!(fx.sut_value("gateway"), value);
}

/// T1-RFY-13: mock provider failures propagate unchanged
#[test]
fn test_mock_errors_propagate() {
    let mut fx = fixture(
        "com.acme.Router",
        vec![private_field("names", "[Ljava/lang/String;").with_annotation(marker("Fake"))],
        vec![router(&[("names", "[Ljava/lang/String;")])],
    );
    let err = fx.reify().unwrap_err();
    assert!(matches!(err, ReificationError::Mock(MockError::Unmockable { .. })));
}

#[derive(Default)]
struct Recorder {
    reified: AtomicUsize,
    injected: AtomicUsize,
}

impl TestifyEventHandler for Recorder {
    fn on_field_reified(&self, _event: &FieldReifiedEvent) {
        self.reified.fetch_add(1, Ordering::SeqCst);
    }

    fn on_reification_completed(&self, event: &ReificationCompletedEvent) {
        self.injected.store(event.injected, Ordering::SeqCst);
    }
}

/// T1-RFY-14: one event per field plus a completion summary
#[test]
fn test_reification_events() {
    let mut fx = order_fixture(vec![
        fake_gateway(),
        private_field("repository", REPOSITORY_DESC),
    ]);
    let recorder = Arc::new(Recorder::default());
    let mut events = EventDispatcher::new();
    events.register(recorder.clone());
    let engine = fx.engine().with_events(events);

    engine
        .reify(&mut fx.rt, &fx.test, &fx.sut, fx.test_instance, fx.sut_instance)
        .unwrap();
    assert_eq!(recorder.reified.load(Ordering::SeqCst), 2);
    assert_eq!(recorder.injected.load(Ordering::SeqCst), 1);
}
