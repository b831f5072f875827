//! ConstructorDescriptor: the canonical SUT constructor.

use std::fmt;
use std::sync::Arc;

use testify_core::errors::AnalysisError;

use super::{check_arguments, method_types};
use crate::classfile::annotation::Annotation;
use crate::classfile::constants::CONSTRUCTOR_NAME;
use crate::classfile::reader::MethodInfo;
use crate::classfile::types::{GenericType, TypeRef};
use crate::runtime::{ObjectId, Runtime, Value};

#[derive(Debug)]
struct ConstructorMember {
    declaring_class: String,
    descriptor: String,
    parameter_types: Vec<TypeRef>,
    generic_parameter_types: Vec<GenericType>,
    parameter_names: Vec<String>,
    access_flags: u16,
    annotations: Vec<Annotation>,
}

/// A constructor recovered from `<init>`. Equality covers (class, descriptor).
#[derive(Clone)]
pub struct ConstructorDescriptor {
    member: Arc<ConstructorMember>,
}

impl ConstructorDescriptor {
    pub fn from_method_info(declaring_class: &str, method: &MethodInfo) -> Result<Self, AnalysisError> {
        let (method_type, generic_parameter_types, _) = method_types(declaring_class, method)?;
        let parameter_names = (0..method_type.parameters.len())
            .map(|i| {
                method
                    .parameters
                    .get(i)
                    .and_then(|p| p.name.clone())
                    .unwrap_or_else(|| format!("arg{i}"))
            })
            .collect();
        Ok(Self {
            member: Arc::new(ConstructorMember {
                declaring_class: declaring_class.to_string(),
                descriptor: method.descriptor.clone(),
                parameter_types: method_type.parameters,
                generic_parameter_types,
                parameter_names,
                access_flags: method.access_flags,
                annotations: method.annotations.clone(),
            }),
        })
    }

    pub fn declaring_class(&self) -> &str {
        &self.member.declaring_class
    }

    pub fn descriptor(&self) -> &str {
        &self.member.descriptor
    }

    pub fn parameter_types(&self) -> &[TypeRef] {
        &self.member.parameter_types
    }

    pub fn generic_parameter_types(&self) -> &[GenericType] {
        &self.member.generic_parameter_types
    }

    /// Compiled parameter names, `arg{i}` where absent.
    pub fn parameter_names(&self) -> &[String] {
        &self.member.parameter_names
    }

    pub fn parameter_count(&self) -> usize {
        self.member.parameter_types.len()
    }

    pub fn access_flags(&self) -> u16 {
        self.member.access_flags
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.member.annotations
    }

    /// Whether a native `<init>` body is registered for this constructor.
    pub fn has_body(&self, runtime: &Runtime) -> bool {
        runtime
            .natives()
            .contains(&self.member.declaring_class, CONSTRUCTOR_NAME, &self.member.descriptor)
    }

    /// Allocate an instance with default field values and run the registered
    /// `<init>` body, if any. Without a body the object is returned as
    /// allocated; callers supply the default body.
    pub fn new_instance(&self, runtime: &mut Runtime, args: &[Value]) -> Result<ObjectId, AnalysisError> {
        let m = &self.member;
        check_arguments(runtime, CONSTRUCTOR_NAME, &m.declaring_class, &m.parameter_types, args)?;
        let id = runtime.instantiate(&m.declaring_class);
        if let Some(body) = runtime
            .natives()
            .lookup(&m.declaring_class, CONSTRUCTOR_NAME, &m.descriptor)
        {
            runtime.run(body, &m.declaring_class, CONSTRUCTOR_NAME, Some(id), args)?;
        }
        Ok(id)
    }
}

impl PartialEq for ConstructorDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.member.declaring_class == other.member.declaring_class
            && self.member.descriptor == other.member.descriptor
    }
}

impl Eq for ConstructorDescriptor {}

impl fmt::Debug for ConstructorDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ConstructorDescriptor({}.<init>{})", self.member.declaring_class, self.member.descriptor)
    }
}
