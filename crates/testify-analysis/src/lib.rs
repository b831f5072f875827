//! testify-analysis: test-class analysis and collaborator reification.
//!
//! - `classfile`: JVM class-file model, reader, writer and visitor
//! - `classpath`: class sources, memoized loading, type hierarchy
//! - `runtime`: object arena and native method bodies
//! - `mock`: mock provider seam and the arena implementation
//! - `descriptor`: field, parameter, method, test and SUT descriptors
//! - `analysis`: class visitors, annotation inspectors, memoizing analyzer
//! - `reify`: SUT construction, reification engine, hooks
//! - `verify`: read-only wiring checks

pub mod analysis;
pub mod classfile;
pub mod classpath;
pub mod descriptor;
pub mod mock;
pub mod reify;
pub mod runtime;
pub mod verify;

pub use analysis::{Analyzer, Markers, Role};
pub use classpath::ClassPath;
pub use descriptor::{DescriptorKey, SutDescriptor, TestDescriptor};
pub use mock::{ArenaMockProvider, MockProvider};
pub use reify::{ReificationEngine, ReificationReport, SutFactory};
pub use runtime::{ObjectId, Runtime, Value};
