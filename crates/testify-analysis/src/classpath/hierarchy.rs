//! Type hierarchy queries and assignability rules.

use std::fmt;

use testify_core::constants::OBJECT_CLASS;

use crate::classfile::types::{GenericType, TypeArgument, TypeRef};

/// Answers subtype questions over binary class names.
pub trait TypeHierarchy: Send + Sync + fmt::Debug {
    /// True when `class` is `ancestor` or inherits from it.
    fn is_subclass_of(&self, class: &str, ancestor: &str) -> bool;

    /// True when a value of erased type `source` can be stored in `target`.
    fn is_assignable(&self, target: &TypeRef, source: &TypeRef) -> bool {
        match (target, source) {
            (TypeRef::Primitive(t), TypeRef::Primitive(s)) => t == s,
            (TypeRef::Class(t), TypeRef::Class(s)) => {
                t == s || t == OBJECT_CLASS || self.is_subclass_of(s, t)
            }
            (TypeRef::Class(t), TypeRef::Array(_)) => matches!(
                t.as_str(),
                OBJECT_CLASS | "java.lang.Cloneable" | "java.io.Serializable"
            ),
            (TypeRef::Array(t), TypeRef::Array(s)) => {
                if t.is_reference() && s.is_reference() {
                    self.is_assignable(t, s)
                } else {
                    t == s
                }
            }
            _ => false,
        }
    }

    /// Generic assignability: raw assignability of the erasures, then type
    /// arguments must agree when both sides carry them. A raw side accepts
    /// any arguments. Arguments of different classes are positionally
    /// unrelated, so such pairs compare raw.
    fn is_generic_assignable(&self, target: &GenericType, source: &GenericType) -> bool {
        let (target_raw, source_raw) = (target.erasure(), source.erasure());
        if !self.is_assignable(&target_raw, &source_raw) {
            return false;
        }
        if target_raw != source_raw {
            return true;
        }
        let (targs, sargs) = (target.arguments(), source.arguments());
        if targs.is_empty() || sargs.is_empty() || targs.len() != sargs.len() {
            return true;
        }
        targs
            .iter()
            .zip(sargs)
            .all(|(t, s)| self.argument_contains(t, s))
    }

    /// Whether type argument `target` admits `source` (JLS §4.5.1 containment,
    /// simplified to the erasure-level hierarchy).
    fn argument_contains(&self, target: &TypeArgument, source: &TypeArgument) -> bool {
        match (target, source) {
            (TypeArgument::Any, _) => true,
            (TypeArgument::Exact(t), TypeArgument::Exact(s)) => t == s,
            (TypeArgument::Extends(t), TypeArgument::Exact(s) | TypeArgument::Extends(s)) => {
                self.is_generic_assignable(t, s)
            }
            (TypeArgument::Super(t), TypeArgument::Exact(s) | TypeArgument::Super(s)) => {
                self.is_generic_assignable(s, t)
            }
            _ => target == source,
        }
    }
}
