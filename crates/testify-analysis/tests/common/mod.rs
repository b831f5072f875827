//! Shared fixtures: an order-service test class and its collaborators,
//! written as real class-file bytes.

#![allow(dead_code)]

use std::sync::Arc;

use testify_analysis::analysis::Analyzer;
use testify_analysis::classfile::annotation::{Annotation, ElementValue};
use testify_analysis::classfile::constants::{ACC_ABSTRACT, ACC_FINAL, ACC_PRIVATE, ACC_PUBLIC};
use testify_analysis::classfile::{ClassWriter, FieldInfo, MethodInfo};
use testify_analysis::classpath::{ClassPath, InMemoryClassSource};
use testify_analysis::runtime::{MethodKey, Runtime, Value};
use testify_core::config::TestifyConfig;

pub const ANNOTATION_PACKAGE: &str = "org.testifyproject.annotation";

pub const TEST_CLASS: &str = "com.acme.OrderServiceTest";
pub const SUT_CLASS: &str = "com.acme.OrderService";
pub const GATEWAY: &str = "com.acme.PaymentGateway";
pub const STRIPE: &str = "com.acme.StripeGateway";
pub const REPOSITORY: &str = "com.acme.OrderRepository";

pub const GATEWAY_DESC: &str = "Lcom/acme/PaymentGateway;";
pub const REPOSITORY_DESC: &str = "Lcom/acme/OrderRepository;";
pub const SUT_CTOR_DESC: &str = "(Lcom/acme/PaymentGateway;Lcom/acme/OrderRepository;)V";

/// Marker annotation in the default annotation package.
pub fn marker(simple: &str) -> Annotation {
    Annotation::new(format!("{ANNOTATION_PACKAGE}.{simple}"))
}

pub fn named(name: &str) -> Annotation {
    marker("Name").with("value", ElementValue::string(name))
}

pub fn private_field(name: &str, descriptor: &str) -> FieldInfo {
    FieldInfo::new(ACC_PRIVATE, name, descriptor)
}

pub fn gateway_interface() -> ClassWriter {
    ClassWriter::interface(GATEWAY).method(MethodInfo::new(
        ACC_PUBLIC | ACC_ABSTRACT,
        "charge",
        "(J)Z",
    ))
}

pub fn stripe_gateway() -> ClassWriter {
    ClassWriter::new(STRIPE)
        .implements(GATEWAY)
        .method(MethodInfo::new(ACC_PUBLIC, "<init>", "()V"))
        .method(MethodInfo::new(ACC_PUBLIC, "charge", "(J)Z"))
}

pub fn order_repository() -> ClassWriter {
    ClassWriter::new(REPOSITORY)
        .field(private_field("saved", "I"))
        .method(MethodInfo::new(ACC_PUBLIC, "<init>", "()V"))
        .method(MethodInfo::new(ACC_PUBLIC, "save", "(J)V"))
}

/// `OrderService(PaymentGateway gateway, OrderRepository repository)` with
/// final fields of the same names.
pub fn order_service() -> ClassWriter {
    ClassWriter::new(SUT_CLASS)
        .field(FieldInfo::new(ACC_PRIVATE | ACC_FINAL, "gateway", GATEWAY_DESC))
        .field(FieldInfo::new(ACC_PRIVATE | ACC_FINAL, "repository", REPOSITORY_DESC))
        .method(
            MethodInfo::new(ACC_PUBLIC, "<init>", SUT_CTOR_DESC)
                .with_parameter_names(&["gateway", "repository"]),
        )
        .method(MethodInfo::new(ACC_PUBLIC, "placeOrder", "(J)Z"))
}

/// `@Sut OrderService sut; @Fake PaymentGateway gateway;
/// @Virtual OrderRepository repository;` plus a repository provider.
pub fn order_service_test() -> ClassWriter {
    ClassWriter::new(TEST_CLASS)
        .field(private_field("sut", "Lcom/acme/OrderService;").with_annotation(marker("Sut")))
        .field(private_field("gateway", GATEWAY_DESC).with_annotation(marker("Fake")))
        .field(private_field("repository", REPOSITORY_DESC).with_annotation(marker("Virtual")))
        .method(MethodInfo::new(ACC_PUBLIC, "<init>", "()V"))
        .method(
            MethodInfo::new(ACC_PUBLIC, "createRepository", "()Lcom/acme/OrderRepository;")
                .with_annotation(marker("CollaboratorProvider")),
        )
        .method(MethodInfo::new(ACC_PUBLIC, "placesOrder", "()V"))
}

pub fn order_classes() -> Vec<ClassWriter> {
    vec![
        gateway_interface(),
        stripe_gateway(),
        order_repository(),
        order_service(),
        order_service_test(),
    ]
}

pub fn class_path(classes: Vec<ClassWriter>) -> Arc<ClassPath> {
    let mut source = InMemoryClassSource::new();
    for class in classes {
        source.add(class.to_bytes()).unwrap();
    }
    Arc::new(ClassPath::builder().source(source).build())
}

pub fn analyzer(classes: Vec<ClassWriter>) -> Analyzer {
    Analyzer::new(class_path(classes), &TestifyConfig::default())
}

/// Runtime with bodies for the order fixture: the repository provider and
/// `placeOrder`, which charges the gateway and saves on success.
pub fn order_runtime(class_path: Arc<ClassPath>) -> Runtime {
    let mut rt = Runtime::new(class_path);
    rt.natives_mut().bind(
        MethodKey::new(TEST_CLASS, "createRepository", "()Lcom/acme/OrderRepository;"),
        |rt, _, _| Ok(Value::Ref(rt.instantiate(REPOSITORY))),
    );
    rt.natives_mut().bind(
        MethodKey::new(SUT_CLASS, "placeOrder", "(J)Z"),
        |rt, this, args| {
            let this = this.ok_or("placeOrder needs a receiver")?;
            let gateway = rt
                .heap()
                .object(this)
                .slot(SUT_CLASS, "gateway")
                .and_then(Value::as_object)
                .ok_or("gateway not wired")?;
            let charged = rt
                .call(gateway, "charge", args)
                .map_err(|e| e.to_string())?;
            if charged == Value::Bool(true) {
                if let Some(repo) = rt
                    .heap()
                    .object(this)
                    .slot(SUT_CLASS, "repository")
                    .and_then(Value::as_object)
                {
                    rt.call(repo, "save", args).map_err(|e| e.to_string())?;
                }
            }
            Ok(charged)
        },
    );
    rt.natives_mut().bind(
        MethodKey::new(REPOSITORY, "save", "(J)V"),
        |rt, this, _| {
            let this = this.ok_or("save needs a receiver")?;
            let saved = match rt.heap().object(this).slot(REPOSITORY, "saved") {
                Some(Value::Int(n)) => *n,
                _ => 0,
            };
            rt.heap_mut()
                .object_mut(this)
                .set_slot(REPOSITORY, "saved", Value::Int(saved + 1));
            Ok(Value::Null)
        },
    );
    rt
}
