//! Test-class and SUT analysis over class-file visitors.

pub mod analyzer;
pub mod context;
pub mod inspectors;
pub mod markers;
pub mod sut_class_visitor;
pub mod test_class_visitor;

pub use analyzer::Analyzer;
pub use context::AnalysisContext;
pub use inspectors::{AnnotationInspector, InspectorRegistry};
pub use markers::{Markers, Role};
pub use sut_class_visitor::SutClassVisitor;
pub use test_class_visitor::TestClassVisitor;
