//! Reification: SUT construction and collaborator wiring at test time.

pub mod engine;
pub mod hooks;
pub mod report;
pub mod sut_factory;

pub use engine::ReificationEngine;
pub use hooks::{apply_config_handler, provide_collaborator};
pub use report::{FieldAction, FieldOutcome, ReificationReport};
pub use sut_factory::SutFactory;
