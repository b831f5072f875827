//! MethodDescriptor: a method member, optionally bound to an instance.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use testify_core::errors::AnalysisError;

use super::{check_arguments, join_types, method_types, name_override};
use crate::classfile::annotation::{self, Annotation};
use crate::classfile::constants::ACC_STATIC;
use crate::classfile::descriptor::MethodType;
use crate::classfile::reader::MethodInfo;
use crate::classfile::types::{GenericType, TypeRef};
use crate::classpath::TypeHierarchy;
use crate::runtime::{ObjectId, Runtime, Value};

#[derive(Debug)]
struct MethodMember {
    declaring_class: String,
    name: String,
    declared_name: String,
    descriptor: String,
    method_type: MethodType,
    generic_parameter_types: Vec<GenericType>,
    generic_return_type: GenericType,
    access_flags: u16,
    annotations: Vec<Annotation>,
}

/// A method of a test class (config handlers, collaborator providers).
#[derive(Clone)]
pub struct MethodDescriptor {
    member: Arc<MethodMember>,
    instance: Option<ObjectId>,
}

impl MethodDescriptor {
    pub fn from_method_info(
        declaring_class: &str,
        method: &MethodInfo,
        name_marker: &str,
    ) -> Result<Self, AnalysisError> {
        let (method_type, generic_parameter_types, generic_return_type) =
            method_types(declaring_class, method)?;
        let declared_name =
            name_override(&method.annotations, name_marker).unwrap_or_else(|| method.name.clone());
        Ok(Self {
            member: Arc::new(MethodMember {
                declaring_class: declaring_class.to_string(),
                name: method.name.clone(),
                declared_name,
                descriptor: method.descriptor.clone(),
                method_type,
                generic_parameter_types,
                generic_return_type,
                access_flags: method.access_flags,
                annotations: method.annotations.clone(),
            }),
            instance: None,
        })
    }

    /// A copy bound to `instance`, used when no explicit receiver is passed.
    pub fn bind(&self, instance: ObjectId) -> Self {
        Self {
            member: Arc::clone(&self.member),
            instance: Some(instance),
        }
    }

    pub fn instance(&self) -> Option<ObjectId> {
        self.instance
    }

    pub fn declaring_class(&self) -> &str {
        &self.member.declaring_class
    }

    pub fn name(&self) -> &str {
        &self.member.name
    }

    pub fn declared_name(&self) -> &str {
        &self.member.declared_name
    }

    pub fn descriptor(&self) -> &str {
        &self.member.descriptor
    }

    pub fn parameter_types(&self) -> &[TypeRef] {
        &self.member.method_type.parameters
    }

    pub fn generic_parameter_types(&self) -> &[GenericType] {
        &self.member.generic_parameter_types
    }

    pub fn return_type(&self) -> &TypeRef {
        &self.member.method_type.return_type
    }

    pub fn generic_return_type(&self) -> &GenericType {
        &self.member.generic_return_type
    }

    pub fn access_flags(&self) -> u16 {
        self.member.access_flags
    }

    pub fn is_static(&self) -> bool {
        self.member.access_flags & ACC_STATIC != 0
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.member.annotations
    }

    pub fn annotation(&self, type_name: &str) -> Option<&Annotation> {
        annotation::find(&self.member.annotations, type_name)
    }

    /// Invoke with `instance` as receiver, falling back to the bound
    /// instance. Static methods ignore both. Returns `None` for `void`.
    pub fn invoke(
        &self,
        runtime: &mut Runtime,
        instance: Option<ObjectId>,
        args: &[Value],
    ) -> Result<Option<Value>, AnalysisError> {
        let m = &self.member;
        check_arguments(runtime, &m.name, &m.declaring_class, self.parameter_types(), args)?;

        let result = if self.is_static() {
            runtime.invoke_static(&m.declaring_class, &m.name, &m.descriptor, args)?
        } else {
            let receiver = instance.or(self.instance).ok_or_else(|| {
                AnalysisError::ArgumentMismatch {
                    method: m.name.clone(),
                    declaring_class: m.declaring_class.clone(),
                    expected: format!("receiver; {}", join_types(self.parameter_types())),
                    actual: "no receiver".to_string(),
                }
            })?;
            let actual = runtime.heap().object(receiver).class_name();
            if !runtime.class_path().is_subclass_of(actual, &m.declaring_class) {
                return Err(AnalysisError::IncompatibleInstance {
                    member: m.name.clone(),
                    declaring_class: m.declaring_class.clone(),
                    actual_class: actual.to_string(),
                });
            }
            runtime.dispatch(receiver, &m.name, &m.descriptor, self.return_type(), args)?
        };

        if self.return_type().is_void() {
            Ok(None)
        } else {
            Ok(Some(result))
        }
    }
}

impl PartialEq for MethodDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.member.declaring_class == other.member.declaring_class
            && self.member.name == other.member.name
            && self.member.descriptor == other.member.descriptor
            && self.instance == other.instance
    }
}

impl Eq for MethodDescriptor {}

impl Hash for MethodDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.member.declaring_class.hash(state);
        self.member.name.hash(state);
        self.member.descriptor.hash(state);
        self.instance.hash(state);
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("declaring_class", &self.member.declaring_class)
            .field("name", &self.member.name)
            .field("descriptor", &self.member.descriptor)
            .field("instance", &self.instance)
            .finish()
    }
}
