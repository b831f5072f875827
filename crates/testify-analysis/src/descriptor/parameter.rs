//! ParameterDescriptor: one parameter of the canonical SUT constructor.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use super::index::IndexedMember;
use super::key::DescriptorKey;
use crate::classfile::annotation::{self, Annotation};
use crate::classfile::types::{GenericType, TypeRef};

#[derive(Debug)]
struct ParameterMember {
    declaring_class: String,
    constructor_descriptor: String,
    index: usize,
    ty: TypeRef,
    generic_type: GenericType,
    name: String,
    declared_name: String,
    annotations: Vec<Annotation>,
}

/// A constructor parameter. Equality covers (constructor, index).
#[derive(Clone)]
pub struct ParameterDescriptor {
    member: Arc<ParameterMember>,
}

impl ParameterDescriptor {
    /// `name` is the compiled name (or `arg{index}`); `declared_name` has the
    /// override already applied.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        declaring_class: &str,
        constructor_descriptor: &str,
        index: usize,
        ty: TypeRef,
        generic_type: GenericType,
        name: String,
        declared_name: String,
        annotations: Vec<Annotation>,
    ) -> Self {
        Self {
            member: Arc::new(ParameterMember {
                declaring_class: declaring_class.to_string(),
                constructor_descriptor: constructor_descriptor.to_string(),
                index,
                ty,
                generic_type,
                name,
                declared_name,
                annotations,
            }),
        }
    }

    pub fn declaring_class(&self) -> &str {
        &self.member.declaring_class
    }

    pub fn constructor_descriptor(&self) -> &str {
        &self.member.constructor_descriptor
    }

    pub fn index(&self) -> usize {
        self.member.index
    }

    pub fn ty(&self) -> &TypeRef {
        &self.member.ty
    }

    pub fn generic_type(&self) -> &GenericType {
        &self.member.generic_type
    }

    /// `MethodParameters` name, or `arg{index}` when the compiler dropped it.
    pub fn name(&self) -> &str {
        &self.member.name
    }

    pub fn declared_name(&self) -> &str {
        &self.member.declared_name
    }

    pub fn annotations(&self) -> &[Annotation] {
        &self.member.annotations
    }

    pub fn annotation(&self, type_name: &str) -> Option<&Annotation> {
        annotation::find(&self.member.annotations, type_name)
    }

    pub fn key(&self) -> DescriptorKey {
        DescriptorKey::of(self.member.generic_type.clone())
    }

    pub fn named_key(&self) -> DescriptorKey {
        DescriptorKey::of_named(self.member.generic_type.clone(), self.member.declared_name.clone())
    }
}

impl IndexedMember for ParameterDescriptor {
    fn generic_type(&self) -> &GenericType {
        &self.member.generic_type
    }

    fn declared_name(&self) -> &str {
        &self.member.declared_name
    }
}

impl PartialEq for ParameterDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.member.declaring_class == other.member.declaring_class
            && self.member.constructor_descriptor == other.member.constructor_descriptor
            && self.member.index == other.member.index
    }
}

impl Eq for ParameterDescriptor {}

impl Hash for ParameterDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.member.declaring_class.hash(state);
        self.member.constructor_descriptor.hash(state);
        self.member.index.hash(state);
    }
}

impl fmt::Debug for ParameterDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterDescriptor")
            .field("constructor", &format_args!("{}.<init>{}", self.member.declaring_class, self.member.constructor_descriptor))
            .field("index", &self.member.index)
            .field("declared_name", &self.member.declared_name)
            .field("type", &self.member.generic_type.to_string())
            .finish()
    }
}
